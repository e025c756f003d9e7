use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::identifiers::{ContentId, ContentVersion, MarketplaceId};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Renderable content must be valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// An advertisement that can be rendered on a marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvertisementContent {
    pub content_id: ContentId,
    pub marketplace_id: MarketplaceId,
    pub version: ContentVersion,
    pub renderable_content: String,
}

impl AdvertisementContent {
    /// Ingest a raw payload into an AdvertisementContent.
    ///
    /// The version is always computed from the verified payload, so a
    /// content and its version can never disagree.
    pub fn ingest(
        content_id: impl Into<ContentId>,
        marketplace_id: impl Into<MarketplaceId>,
        raw_content: Vec<u8>,
    ) -> Result<Self, ContentError> {
        let renderable_content = String::from_utf8(raw_content)?;
        let version = ContentVersion::from_content(renderable_content.as_bytes());

        Ok(AdvertisementContent {
            content_id: content_id.into(),
            marketplace_id: marketplace_id.into(),
            version,
            renderable_content,
        })
    }

    /// Recompute the version from the payload and compare.
    pub fn is_intact(&self) -> bool {
        ContentVersion::from_content(self.renderable_content.as_bytes()) == self.version
    }
}
