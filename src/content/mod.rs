pub mod advertisement;

pub use crate::types::identifiers::{ContentId, ContentVersion, MarketplaceId};
pub use advertisement::{AdvertisementContent, ContentError};
