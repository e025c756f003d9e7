use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::context::RequestContext;

/// Outcome of evaluating targeting predicates against a request.
/// Only `True` makes a group eligible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetingPredicateResult {
    True,
    False,
    Indeterminate,
}

impl TargetingPredicateResult {
    pub fn is_true(self) -> bool {
        self == TargetingPredicateResult::True
    }

    /// Swap TRUE and FALSE. INDETERMINATE stays INDETERMINATE.
    pub fn invert(self) -> Self {
        match self {
            TargetingPredicateResult::True => TargetingPredicateResult::False,
            TargetingPredicateResult::False => TargetingPredicateResult::True,
            TargetingPredicateResult::Indeterminate => TargetingPredicateResult::Indeterminate,
        }
    }
}

impl From<bool> for TargetingPredicateResult {
    fn from(value: bool) -> Self {
        if value {
            TargetingPredicateResult::True
        } else {
            TargetingPredicateResult::False
        }
    }
}

/// Rules that can be decided from the request context alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TargetingRule {
    /// The customer is signed in.
    Recognized,
    /// The customer is one of the listed ids. Undecidable for anonymous customers.
    CustomerIn { customer_ids: BTreeSet<String> },
    MarketplaceIn { marketplace_ids: BTreeSet<String> },
}

impl TargetingRule {
    pub fn evaluate(&self, context: &RequestContext) -> TargetingPredicateResult {
        match self {
            TargetingRule::Recognized => context.is_recognized().into(),
            TargetingRule::CustomerIn { customer_ids } => match &context.customer_id {
                Some(id) => customer_ids.contains(id).into(),
                None => TargetingPredicateResult::Indeterminate,
            },
            TargetingRule::MarketplaceIn { marketplace_ids } => marketplace_ids
                .contains(context.marketplace_id.as_str())
                .into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingPredicate {
    #[serde(flatten)]
    pub rule: TargetingRule,
    #[serde(default)]
    pub inverse: bool,
}

impl TargetingPredicate {
    pub fn new(rule: TargetingRule) -> Self {
        Self {
            rule,
            inverse: false,
        }
    }

    pub fn inverted(rule: TargetingRule) -> Self {
        Self {
            rule,
            inverse: true,
        }
    }

    pub fn evaluate(&self, context: &RequestContext) -> TargetingPredicateResult {
        let result = self.rule.evaluate(context);
        if self.inverse {
            result.invert()
        } else {
            result
        }
    }
}
