use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::content::AdvertisementContent;
use crate::targeting::TargetingGroup;
use crate::types::identifiers::{ContentId, ContentVersion, MarketplaceId, TargetingGroupId};

// Serialized into the manifest and hashed into the catalog version,
// so any change here produces a different catalog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CatalogBuildConfig {
    pub version: String,
    pub hash_algorithm: String,
}

impl CatalogBuildConfig {
    pub fn v0() -> Self {
        Self {
            version: "1".into(),
            hash_algorithm: "sha256".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestContentEntry {
    pub marketplace_id: MarketplaceId,
    pub content_id: ContentId,
    pub version: ContentVersion,
    pub file: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ManifestTargetingEntry {
    pub targeting_group_id: TargetingGroupId,
    pub content_id: ContentId,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CatalogManifest {
    pub catalog_version: String,
    pub build_config: CatalogBuildConfig,
    pub created_at: DateTime<Utc>, // informational only
    pub content_count: usize,
    pub targeting_group_count: usize,
    pub contents: Vec<ManifestContentEntry>,
    pub targeting_groups: Vec<ManifestTargetingEntry>,
}

/// Content file lookup: marketplace -> content id -> relative file path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CatalogIndex {
    entries: BTreeMap<MarketplaceId, BTreeMap<ContentId, String>>,
}

impl CatalogIndex {
    pub fn from_entries(entries: &[ManifestContentEntry]) -> Self {
        let mut index: BTreeMap<MarketplaceId, BTreeMap<ContentId, String>> = BTreeMap::new();
        for entry in entries {
            index
                .entry(entry.marketplace_id.clone())
                .or_default()
                .insert(entry.content_id.clone(), entry.file.clone());
        }
        Self { entries: index }
    }

    pub fn file(&self, marketplace_id: &MarketplaceId, content_id: &ContentId) -> Option<&str> {
        self.entries
            .get(marketplace_id)
            .and_then(|contents| contents.get(content_id))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// sha256 over the config, every `marketplace:content:version` line and
/// every targeting group's JSON, in catalog order.
pub fn compute_catalog_version(
    config: &CatalogBuildConfig,
    contents: &[AdvertisementContent],
    groups: &[TargetingGroup],
) -> Result<String, serde_json::Error> {
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(config)?);

    for content in contents {
        let line = format!(
            "{}:{}:{}\n",
            content.marketplace_id,
            content.content_id,
            content.version.as_str()
        );
        hasher.update(line.as_bytes());
    }

    for group in groups {
        hasher.update(serde_json::to_vec(group)?);
        hasher.update(b"\n");
    }

    Ok(format!("sha256:{}", hex::encode(hasher.finalize())))
}

/// File stem for a content entry: first 12 hex chars of
/// sha256("<marketplace>\0<content>").
pub fn content_file_stem(marketplace_id: &MarketplaceId, content_id: &ContentId) -> String {
    let mut hasher = Sha256::new();
    hasher.update(marketplace_id.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(content_id.as_str().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}
