pub mod eligibility;
pub mod ranking;

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::store::{ContentStore, TargetingStore};
use crate::targeting::{EvaluatorFactory, PredicateEvaluatorFactory, RequestContext};
use crate::types::advertisement::{
	EmptyReason, GeneratedAdvertisement, SelectionError, SelectionMetadata, SelectionReport,
};
use crate::types::identifiers::{ContentId, MarketplaceId};
pub use eligibility::eligible_groups;
pub use ranking::highest_ctr;

/// Picks the single advertisement to render for a customer on a marketplace.
///
/// Holds only read capabilities, so one selector can serve concurrent calls.
pub struct AdSelector<C, T, F = PredicateEvaluatorFactory> {
	contents: C,
	targeting: T,
	evaluators: F,
}

impl<C, T> AdSelector<C, T, PredicateEvaluatorFactory>
where
	C: ContentStore,
	T: TargetingStore,
{
	pub fn new(contents: C, targeting: T) -> Self {
		Self {
			contents,
			targeting,
			evaluators: PredicateEvaluatorFactory,
		}
	}
}

impl<C, T, F> AdSelector<C, T, F>
where
	C: ContentStore,
	T: TargetingStore,
	F: EvaluatorFactory,
{
	pub fn with_evaluators(contents: C, targeting: T, evaluators: F) -> Self {
		Self {
			contents,
			targeting,
			evaluators,
		}
	}

	/// Eligible content with the highest CTR, or the empty marker.
	///
	/// Only store and evaluator faults are errors.
	pub fn select_advertisement(
		&self,
		customer_id: Option<&str>,
		marketplace_id: Option<&str>,
	) -> Result<GeneratedAdvertisement, SelectionError> {
		self.select_with_report(customer_id, marketplace_id)
			.map(|report| report.advertisement)
	}

	pub fn select_with_report(
		&self,
		customer_id: Option<&str>,
		marketplace_id: Option<&str>,
	) -> Result<SelectionReport, SelectionError> {
		let mut metadata = SelectionMetadata::default();

		let marketplace_id = match marketplace_id.filter(|id| !id.is_empty()) {
			Some(id) => MarketplaceId::new(id),
			None => {
				warn!("Marketplace id cannot be missing or empty. Returning empty ad.");
				return Ok(empty(metadata, EmptyReason::MissingMarketplace));
			}
		};
		metadata.marketplace_id = marketplace_id.as_str().to_string();

		// 1. Candidate Phase
		let contents = self.contents.get(&marketplace_id)?;
		metadata.contents_considered = contents.len();

		// Distinct ids in first-seen order; this order drives tie-breaking
		let mut seen = BTreeSet::new();
		let content_ids: Vec<&ContentId> = contents
			.iter()
			.map(|content| &content.content_id)
			.filter(|id| seen.insert(*id))
			.collect();
		metadata.distinct_content_ids = content_ids.len();

		let mut targeting_groups = Vec::new();
		for content_id in &content_ids {
			targeting_groups.extend(self.targeting.get(content_id)?);
		}
		metadata.targeting_groups_considered = targeting_groups.len();

		// 2. Eligibility Phase
		let context = RequestContext::new(customer_id, marketplace_id.clone());
		metadata.customer_recognized = context.is_recognized();
		let evaluator = self.evaluators.bind(context);
		let eligible = eligible_groups(&evaluator, &targeting_groups)?;
		metadata.eligible_groups = eligible.len();

		// 3. Ranking Phase
		let Some(winner) = highest_ctr(eligible.iter().copied()) else {
			let reason = if contents.is_empty() {
				EmptyReason::NoContent
			} else if targeting_groups.is_empty() {
				EmptyReason::NoTargetingGroups
			} else {
				EmptyReason::NoEligibleGroups
			};
			debug!(
				marketplace_id = %marketplace_id,
				contents = contents.len(),
				targeting_groups = targeting_groups.len(),
				?reason,
				"No eligible advertisement"
			);
			return Ok(empty(metadata, reason));
		};

		debug_assert!(eligible
			.iter()
			.all(|group| group.click_through_rate <= winner.click_through_rate));

		metadata.winning_targeting_group_id = Some(winner.targeting_group_id.clone());
		metadata.winning_click_through_rate = Some(winner.click_through_rate);

		// 4. Resolution Phase
		// First match wins if the candidate list repeats an id
		match contents
			.iter()
			.find(|content| content.content_id == winner.content_id)
		{
			Some(content) => {
				debug!(
					marketplace_id = %marketplace_id,
					content_id = %content.content_id,
					targeting_group_id = %winner.targeting_group_id,
					click_through_rate = winner.click_through_rate,
					"Selected advertisement"
				);
				Ok(SelectionReport {
					advertisement: GeneratedAdvertisement::chosen(content.clone()),
					selection: metadata,
				})
			}
			None => {
				warn!(
					marketplace_id = %marketplace_id,
					content_id = %winner.content_id,
					targeting_group_id = %winner.targeting_group_id,
					"Winning targeting group references content missing from marketplace"
				);
				Ok(empty(metadata, EmptyReason::DanglingContent))
			}
		}
	}
}

fn empty(mut metadata: SelectionMetadata, reason: EmptyReason) -> SelectionReport {
	metadata.empty_reason = Some(reason);
	SelectionReport {
		advertisement: GeneratedAdvertisement::Empty,
		selection: metadata,
	}
}
