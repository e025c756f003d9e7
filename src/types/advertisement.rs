use serde::{Deserialize, Serialize};

use crate::content::AdvertisementContent;
use crate::store::StoreError;
use crate::targeting::EvaluationError;
use crate::types::identifiers::{ContentId, TargetingGroupId};

/// The outcome of one selection: a concrete advertisement or an explicit
/// empty marker. There is no third "absent" state to guard against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratedAdvertisement {
    Chosen { content: AdvertisementContent },
    Empty,
}

impl GeneratedAdvertisement {
    pub fn chosen(content: AdvertisementContent) -> Self {
        GeneratedAdvertisement::Chosen { content }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, GeneratedAdvertisement::Empty)
    }

    pub fn content(&self) -> Option<&AdvertisementContent> {
        match self {
            GeneratedAdvertisement::Chosen { content } => Some(content),
            GeneratedAdvertisement::Empty => None,
        }
    }

    pub fn content_id(&self) -> Option<&ContentId> {
        self.content().map(|content| &content.content_id)
    }
}

/// Why a selection produced the empty marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    MissingMarketplace,
    NoContent,
    NoTargetingGroups,
    NoEligibleGroups,
    /// The winning group points at a content id missing from the candidates.
    DanglingContent,
}

/// Counters describing how a selection was reached.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectionMetadata {
    pub marketplace_id: String,
    pub customer_recognized: bool,

    pub contents_considered: usize,
    pub distinct_content_ids: usize,
    pub targeting_groups_considered: usize,
    pub eligible_groups: usize,

    pub winning_targeting_group_id: Option<TargetingGroupId>,
    pub winning_click_through_rate: Option<f64>,
    pub empty_reason: Option<EmptyReason>,
}

/// A selection together with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionReport {
    pub advertisement: GeneratedAdvertisement,
    pub selection: SelectionMetadata,
}

/// Infrastructure faults. "Nothing to show" is never one of these.
#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("Store read failed: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}
