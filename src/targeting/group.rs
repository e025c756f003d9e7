use serde::{Deserialize, Serialize};

use super::predicate::TargetingPredicate;
use crate::types::identifiers::{ContentId, TargetingGroupId};

/// A bundle of eligibility predicates plus the historical CTR of showing
/// `content_id` to requests that satisfy them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetingGroup {
    pub targeting_group_id: TargetingGroupId,
    pub content_id: ContentId,
    pub click_through_rate: f64,
    #[serde(default)]
    pub targeting_predicates: Vec<TargetingPredicate>,
}

impl TargetingGroup {
    pub fn new(
        targeting_group_id: impl Into<TargetingGroupId>,
        content_id: impl Into<ContentId>,
        click_through_rate: f64,
        targeting_predicates: Vec<TargetingPredicate>,
    ) -> Self {
        Self {
            targeting_group_id: targeting_group_id.into(),
            content_id: content_id.into(),
            click_through_rate,
            targeting_predicates,
        }
    }

    /// CTR must be a finite, non-negative number to take part in ranking.
    pub fn has_valid_ctr(&self) -> bool {
        self.click_through_rate.is_finite() && self.click_through_rate >= 0.0
    }
}
