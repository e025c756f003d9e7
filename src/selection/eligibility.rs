use tracing::warn;

use crate::targeting::{EvaluationError, TargetingEvaluator, TargetingGroup};

/// Keep the groups whose predicates evaluate to exactly TRUE.
///
/// Every group is evaluated once. FALSE and INDETERMINATE are both
/// ineligible. Eligible groups with an unusable CTR are dropped as well.
pub fn eligible_groups<'a, E>(
    evaluator: &E,
    groups: &'a [TargetingGroup],
) -> Result<Vec<&'a TargetingGroup>, EvaluationError>
where
    E: TargetingEvaluator + ?Sized,
{
    let mut eligible = Vec::new();
    for group in groups {
        if !evaluator.evaluate(group)?.is_true() {
            continue;
        }
        if !group.has_valid_ctr() {
            warn!(
                targeting_group_id = %group.targeting_group_id,
                click_through_rate = group.click_through_rate,
                "Skipping eligible targeting group with unusable CTR"
            );
            continue;
        }
        eligible.push(group);
    }
    Ok(eligible)
}
