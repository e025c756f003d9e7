use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::catalog::Catalog;
use crate::catalog::versioning::{
    compute_catalog_version, content_file_stem, CatalogBuildConfig, CatalogIndex,
    CatalogManifest, ManifestContentEntry, ManifestTargetingEntry,
};
use crate::content::AdvertisementContent;
use crate::targeting::TargetingGroup;
use crate::types::identifiers::{ContentId, MarketplaceId};

#[derive(Debug, Error)]
pub enum CatalogBuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Output directory already exists: {0}")]
    OutputExists(PathBuf),
    #[error("Filename collision detected for stem: {0}")]
    FilenameCollision(String),
    #[error("Duplicate content {content_id} in marketplace {marketplace_id}")]
    DuplicateContent {
        marketplace_id: String,
        content_id: String,
    },
    #[error("Content {0} does not match its version")]
    CorruptContent(String),
    #[error("Duplicate targeting group ID: {0}")]
    DuplicateTargetingGroup(String),
    #[error("Invalid click-through rate {value} for targeting group {targeting_group_id}")]
    InvalidClickThroughRate {
        targeting_group_id: String,
        value: f64,
    },
}

pub const MANIFEST_FILE: &str = "manifest.json";
pub const INDEX_FILE: &str = "index.json";
pub const TARGETING_FILE: &str = "targeting.json";
pub const CONTENTS_DIR: &str = "contents";

/// Writes an immutable catalog snapshot. Single-threaded and non-reentrant.
pub struct CatalogBuilder {
    config: CatalogBuildConfig,
}

impl CatalogBuilder {
    pub fn new(config: CatalogBuildConfig) -> Self {
        Self { config }
    }

    pub fn build(
        &self,
        contents: Vec<AdvertisementContent>,
        targeting_groups: Vec<TargetingGroup>,
        output_dir: &Path,
    ) -> Result<Catalog, CatalogBuildError> {
        if output_dir.exists() {
            return Err(CatalogBuildError::OutputExists(output_dir.to_path_buf()));
        }

        // 1. Contents: sorted by (marketplace, content id), unique, intact
        let mut contents = contents;
        contents.sort_by(|a, b| {
            (&a.marketplace_id, &a.content_id).cmp(&(&b.marketplace_id, &b.content_id))
        });

        for pair in contents.windows(2) {
            if pair[0].marketplace_id == pair[1].marketplace_id
                && pair[0].content_id == pair[1].content_id
            {
                return Err(CatalogBuildError::DuplicateContent {
                    marketplace_id: pair[0].marketplace_id.to_string(),
                    content_id: pair[0].content_id.to_string(),
                });
            }
        }

        if let Some(corrupt) = contents.iter().find(|content| !content.is_intact()) {
            return Err(CatalogBuildError::CorruptContent(corrupt.content_id.to_string()));
        }

        // 2. Targeting groups: stable by content id, so per-content order is kept
        let mut targeting_groups = targeting_groups;
        let mut seen_groups = BTreeSet::new();
        for group in &targeting_groups {
            if !group.has_valid_ctr() {
                return Err(CatalogBuildError::InvalidClickThroughRate {
                    targeting_group_id: group.targeting_group_id.to_string(),
                    value: group.click_through_rate,
                });
            }
            if !seen_groups.insert(&group.targeting_group_id) {
                return Err(CatalogBuildError::DuplicateTargetingGroup(
                    group.targeting_group_id.to_string(),
                ));
            }
        }
        targeting_groups.sort_by(|a, b| a.content_id.cmp(&b.content_id));

        let known_ids: BTreeSet<_> = contents.iter().map(|content| &content.content_id).collect();
        let dangling = targeting_groups
            .iter()
            .filter(|group| !known_ids.contains(&group.content_id))
            .count();
        if dangling > 0 {
            warn!(dangling, "Catalog contains targeting groups without matching content");
        }

        // 3. Manifest entries
        let content_entries = assign_content_files(&contents, content_file_stem)?;

        let targeting_entries = targeting_groups
            .iter()
            .map(|group| ManifestTargetingEntry {
                targeting_group_id: group.targeting_group_id.clone(),
                content_id: group.content_id.clone(),
            })
            .collect();

        let catalog_version = compute_catalog_version(&self.config, &contents, &targeting_groups)?;

        let manifest = CatalogManifest {
            catalog_version: catalog_version.clone(),
            build_config: self.config.clone(),
            created_at: Utc::now(),
            content_count: contents.len(),
            targeting_group_count: targeting_groups.len(),
            contents: content_entries,
            targeting_groups: targeting_entries,
        };

        let index = CatalogIndex::from_entries(&manifest.contents);

        // 4. Write to a temp dir unique to this catalog version
        let temp_suffix = format!("tmp.{}", &catalog_version[7..19]);
        let temp_dir = output_dir.with_extension(temp_suffix);

        write_in_temp_dir(&temp_dir, |dir| {
            fs::create_dir(dir.join(CONTENTS_DIR))?;

            for (content, entry) in contents.iter().zip(&manifest.contents) {
                let f = fs::File::create(dir.join(&entry.file))?;
                serde_json::to_writer(&f, content)?;
                f.sync_all()?;
            }

            let f_targeting = fs::File::create(dir.join(TARGETING_FILE))?;
            serde_json::to_writer_pretty(&f_targeting, &targeting_groups)?;
            f_targeting.sync_all()?;

            // BTreeMap keeps marketplaces and content ids sorted
            let f_index = fs::File::create(dir.join(INDEX_FILE))?;
            serde_json::to_writer_pretty(&f_index, &index)?;
            f_index.sync_all()?;

            let f_manifest = fs::File::create(dir.join(MANIFEST_FILE))?;
            serde_json::to_writer_pretty(&f_manifest, &manifest)?;
            f_manifest.sync_all()?;

            // 5. Atomic rename
            fs::rename(dir, output_dir)?;
            Ok(())
        })?;

        info!(
            catalog_version = %manifest.catalog_version,
            contents = manifest.content_count,
            targeting_groups = manifest.targeting_group_count,
            "Catalog built"
        );

        Ok(Catalog::from_parts(
            output_dir.to_path_buf(),
            manifest,
            contents,
            targeting_groups,
        ))
    }
}

/// Give every content a `contents/<stem>.json` file, refusing stem collisions.
fn assign_content_files<F>(
    contents: &[AdvertisementContent],
    stem_of: F,
) -> Result<Vec<ManifestContentEntry>, CatalogBuildError>
where
    F: Fn(&MarketplaceId, &ContentId) -> String,
{
    let mut seen_stems = BTreeSet::new();
    let mut entries = Vec::with_capacity(contents.len());
    for content in contents {
        let stem = stem_of(&content.marketplace_id, &content.content_id);
        if !seen_stems.insert(stem.clone()) {
            return Err(CatalogBuildError::FilenameCollision(stem));
        }
        entries.push(ManifestContentEntry {
            marketplace_id: content.marketplace_id.clone(),
            content_id: content.content_id.clone(),
            version: content.version.clone(),
            file: format!("{CONTENTS_DIR}/{stem}.json"),
        });
    }
    Ok(entries)
}

/// Run `write` against a fresh `temp_dir`; the directory is removed if it fails.
fn write_in_temp_dir<F>(temp_dir: &Path, write: F) -> Result<(), CatalogBuildError>
where
    F: FnOnce(&Path) -> Result<(), CatalogBuildError>,
{
    // A leftover from a crashed build of this same version
    if temp_dir.exists() {
        fs::remove_dir_all(temp_dir)?;
    }
    fs::create_dir_all(temp_dir)?;

    let result = write(temp_dir);
    if result.is_err() && temp_dir.exists() {
        if let Err(cleanup) = fs::remove_dir_all(temp_dir) {
            warn!(path = %temp_dir.display(), error = %cleanup, "Failed to remove temp catalog dir");
        }
    }
    result
}
