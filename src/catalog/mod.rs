pub mod builder;
pub mod catalog;
pub mod versioning;

pub use builder::{CatalogBuildError, CatalogBuilder};
pub use catalog::{Catalog, CatalogError};
pub use versioning::{
    CatalogBuildConfig, CatalogIndex, CatalogManifest, ManifestContentEntry, ManifestTargetingEntry,
};
