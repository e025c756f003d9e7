//! Deterministic advertisement selection.
//!
//! `ad-select-core` turns a marketplace's candidate advertisements and
//! their targeting groups into exactly one advertisement to render: the
//! eligible content with the highest click-through rate, or an explicit
//! empty marker when nothing qualifies. Identical inputs over identical
//! store data always produce the same choice.

pub mod catalog;
pub mod config;
pub mod content;
#[cfg(feature = "cli")]
pub mod logging;
pub mod selection;
pub mod store;
pub mod targeting;
pub mod types;

pub use content::AdvertisementContent;
pub use selection::AdSelector;
pub use targeting::{RequestContext, TargetingGroup, TargetingPredicateResult};
pub use types::{GeneratedAdvertisement, SelectionError, SelectionReport};
