pub mod advertisement;
pub mod identifiers;

pub use advertisement::{
    EmptyReason, GeneratedAdvertisement, SelectionError, SelectionMetadata, SelectionReport,
};
pub use identifiers::{ContentId, ContentVersion, MarketplaceId, TargetingGroupId};
