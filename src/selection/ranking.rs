use crate::targeting::TargetingGroup;

/// Pick the group with the highest click-through rate.
///
/// Stable: on equal CTR the group seen first wins, so the outcome follows
/// retrieval order rather than comparator internals.
pub fn highest_ctr<'a, I>(groups: I) -> Option<&'a TargetingGroup>
where
    I: IntoIterator<Item = &'a TargetingGroup>,
{
    let mut best: Option<&'a TargetingGroup> = None;
    for group in groups {
        match best {
            Some(current) if group.click_through_rate <= current.click_through_rate => {}
            _ => best = Some(group),
        }
    }
    best
}
