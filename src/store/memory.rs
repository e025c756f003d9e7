use std::collections::BTreeMap;

use super::{ContentStore, StoreError, TargetingStore};
use crate::content::AdvertisementContent;
use crate::targeting::TargetingGroup;
use crate::types::identifiers::{ContentId, MarketplaceId};

/// Contents grouped by marketplace, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryContentStore {
    by_marketplace: BTreeMap<MarketplaceId, Vec<AdvertisementContent>>,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, content: AdvertisementContent) {
        self.by_marketplace
            .entry(content.marketplace_id.clone())
            .or_default()
            .push(content);
    }
}

impl FromIterator<AdvertisementContent> for InMemoryContentStore {
    fn from_iter<I: IntoIterator<Item = AdvertisementContent>>(iter: I) -> Self {
        let mut store = Self::new();
        for content in iter {
            store.insert(content);
        }
        store
    }
}

impl ContentStore for InMemoryContentStore {
    fn get(&self, marketplace_id: &MarketplaceId) -> Result<Vec<AdvertisementContent>, StoreError> {
        Ok(self
            .by_marketplace
            .get(marketplace_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Targeting groups grouped by content id, returned in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTargetingStore {
    by_content: BTreeMap<ContentId, Vec<TargetingGroup>>,
}

impl InMemoryTargetingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, group: TargetingGroup) {
        self.by_content
            .entry(group.content_id.clone())
            .or_default()
            .push(group);
    }
}

impl FromIterator<TargetingGroup> for InMemoryTargetingStore {
    fn from_iter<I: IntoIterator<Item = TargetingGroup>>(iter: I) -> Self {
        let mut store = Self::new();
        for group in iter {
            store.insert(group);
        }
        store
    }
}

impl TargetingStore for InMemoryTargetingStore {
    fn get(&self, content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError> {
        Ok(self.by_content.get(content_id).cloned().unwrap_or_default())
    }
}
