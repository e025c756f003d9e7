// Read-only once opened: no mutation, no refresh.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::catalog::builder::{INDEX_FILE, MANIFEST_FILE, TARGETING_FILE};
use crate::catalog::versioning::{compute_catalog_version, CatalogIndex, CatalogManifest};
use crate::content::AdvertisementContent;
use crate::store::{ContentStore, StoreError, TargetingStore};
use crate::targeting::TargetingGroup;
use crate::types::identifiers::{ContentId, ContentVersion, MarketplaceId};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Content entry mismatch in {file}: manifest says {expected}, file holds {found}")]
    ContentMismatch {
        file: String,
        expected: String,
        found: String,
    },
    #[error("Content version mismatch for {content_id}: manifest says {expected}, content hashes to {found}")]
    VersionMismatch {
        content_id: String,
        expected: String,
        found: String,
    },
    #[error("Manifest declares {declared} {what} but lists {listed}")]
    CountMismatch {
        what: &'static str,
        declared: usize,
        listed: usize,
    },
    #[error("index.json does not match the manifest content entries")]
    IndexMismatch,
    #[error("Targeting groups do not match manifest at position {position}")]
    TargetingMismatch { position: usize },
    #[error("Catalog version mismatch: manifest says {expected}, data hashes to {found}")]
    CatalogVersionMismatch { expected: String, found: String },
}

#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    manifest: CatalogManifest,
    contents: BTreeMap<MarketplaceId, Vec<AdvertisementContent>>,
    targeting: BTreeMap<ContentId, Vec<TargetingGroup>>,
}

impl Catalog {
    /// Load and verify a catalog written by [`CatalogBuilder`](crate::catalog::CatalogBuilder).
    pub fn open(root: &Path) -> Result<Self, CatalogError> {
        let manifest: CatalogManifest =
            serde_json::from_reader(fs::File::open(root.join(MANIFEST_FILE))?)?;

        if manifest.content_count != manifest.contents.len() {
            return Err(CatalogError::CountMismatch {
                what: "contents",
                declared: manifest.content_count,
                listed: manifest.contents.len(),
            });
        }
        if manifest.targeting_group_count != manifest.targeting_groups.len() {
            return Err(CatalogError::CountMismatch {
                what: "targeting groups",
                declared: manifest.targeting_group_count,
                listed: manifest.targeting_groups.len(),
            });
        }

        let index: CatalogIndex =
            serde_json::from_reader(fs::File::open(root.join(INDEX_FILE))?)?;
        if index != CatalogIndex::from_entries(&manifest.contents) {
            return Err(CatalogError::IndexMismatch);
        }

        let mut contents = Vec::with_capacity(manifest.contents.len());
        for entry in &manifest.contents {
            let f = fs::File::open(root.join(&entry.file))?;
            let content: AdvertisementContent = serde_json::from_reader(f)?;

            if content.content_id != entry.content_id
                || content.marketplace_id != entry.marketplace_id
            {
                return Err(CatalogError::ContentMismatch {
                    file: entry.file.clone(),
                    expected: format!("{}/{}", entry.marketplace_id, entry.content_id),
                    found: format!("{}/{}", content.marketplace_id, content.content_id),
                });
            }

            // Recompute from payload; the stored version field is not trusted
            let actual = ContentVersion::from_content(content.renderable_content.as_bytes());
            if actual != entry.version || content.version != entry.version {
                return Err(CatalogError::VersionMismatch {
                    content_id: entry.content_id.to_string(),
                    expected: entry.version.as_str().to_string(),
                    found: actual.as_str().to_string(),
                });
            }
            contents.push(content);
        }

        let targeting_groups: Vec<TargetingGroup> =
            serde_json::from_reader(fs::File::open(root.join(TARGETING_FILE))?)?;

        if targeting_groups.len() != manifest.targeting_groups.len() {
            let position = targeting_groups.len().min(manifest.targeting_groups.len());
            return Err(CatalogError::TargetingMismatch { position });
        }
        for (position, (group, entry)) in targeting_groups
            .iter()
            .zip(&manifest.targeting_groups)
            .enumerate()
        {
            if group.targeting_group_id != entry.targeting_group_id
                || group.content_id != entry.content_id
            {
                return Err(CatalogError::TargetingMismatch { position });
            }
        }

        let found = compute_catalog_version(&manifest.build_config, &contents, &targeting_groups)?;
        if found != manifest.catalog_version {
            return Err(CatalogError::CatalogVersionMismatch {
                expected: manifest.catalog_version.clone(),
                found,
            });
        }

        Ok(Self::from_parts(root.to_path_buf(), manifest, contents, targeting_groups))
    }

    pub(crate) fn from_parts(
        root: PathBuf,
        manifest: CatalogManifest,
        contents: Vec<AdvertisementContent>,
        targeting_groups: Vec<TargetingGroup>,
    ) -> Self {
        let mut by_marketplace: BTreeMap<MarketplaceId, Vec<AdvertisementContent>> = BTreeMap::new();
        for content in contents {
            by_marketplace
                .entry(content.marketplace_id.clone())
                .or_default()
                .push(content);
        }

        let mut by_content: BTreeMap<ContentId, Vec<TargetingGroup>> = BTreeMap::new();
        for group in targeting_groups {
            by_content
                .entry(group.content_id.clone())
                .or_default()
                .push(group);
        }

        Self {
            root,
            manifest,
            contents: by_marketplace,
            targeting: by_content,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &CatalogManifest {
        &self.manifest
    }
}

impl ContentStore for Catalog {
    fn get(&self, marketplace_id: &MarketplaceId) -> Result<Vec<AdvertisementContent>, StoreError> {
        Ok(self.contents.get(marketplace_id).cloned().unwrap_or_default())
    }
}

impl TargetingStore for Catalog {
    fn get(&self, content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError> {
        Ok(self.targeting.get(content_id).cloned().unwrap_or_default())
    }
}
