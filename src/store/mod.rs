//! Read-only lookup capabilities the selector depends on.
//!
//! Each trait has a single read method so backends can be swapped freely:
//! the in-memory fakes in [`memory`] for tests, or a verified
//! [`Catalog`](crate::catalog::Catalog) snapshot on disk.

pub mod memory;

use std::sync::Arc;

use thiserror::Error;

use crate::content::AdvertisementContent;
use crate::targeting::TargetingGroup;
use crate::types::identifiers::{ContentId, MarketplaceId};

pub use memory::{InMemoryContentStore, InMemoryTargetingStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("Corrupt record for key {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl StoreError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    pub fn unavailable_with(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        StoreError::Unavailable {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Advertisement content keyed by marketplace.
///
/// A marketplace without content yields an empty list, never an error.
pub trait ContentStore {
    fn get(&self, marketplace_id: &MarketplaceId) -> Result<Vec<AdvertisementContent>, StoreError>;
}

/// Targeting groups keyed by content id.
///
/// A content id without targeting groups yields an empty list, never an error.
pub trait TargetingStore {
    fn get(&self, content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError>;
}

impl<S: ContentStore + ?Sized> ContentStore for &S {
    fn get(&self, marketplace_id: &MarketplaceId) -> Result<Vec<AdvertisementContent>, StoreError> {
        (**self).get(marketplace_id)
    }
}

impl<S: ContentStore + ?Sized> ContentStore for Arc<S> {
    fn get(&self, marketplace_id: &MarketplaceId) -> Result<Vec<AdvertisementContent>, StoreError> {
        (**self).get(marketplace_id)
    }
}

impl<S: TargetingStore + ?Sized> TargetingStore for &S {
    fn get(&self, content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError> {
        (**self).get(content_id)
    }
}

impl<S: TargetingStore + ?Sized> TargetingStore for Arc<S> {
    fn get(&self, content_id: &ContentId) -> Result<Vec<TargetingGroup>, StoreError> {
        (**self).get(content_id)
    }
}
