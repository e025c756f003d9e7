use thiserror::Error;

use super::context::RequestContext;
use super::group::TargetingGroup;
use super::predicate::TargetingPredicateResult;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Targeting evaluation failed for group {group}: {message}")]
    Failed { group: String, message: String },
}

/// Decides whether a request satisfies a targeting group.
///
/// Implementations are bound to one `RequestContext` and must not depend
/// on which groups were evaluated before.
pub trait TargetingEvaluator {
    fn evaluate(&self, group: &TargetingGroup) -> Result<TargetingPredicateResult, EvaluationError>;
}

/// Builds an evaluator for a single selection call.
pub trait EvaluatorFactory {
    type Evaluator: TargetingEvaluator;

    fn bind(&self, context: RequestContext) -> Self::Evaluator;
}

/// Evaluates the predicates carried by each group.
#[derive(Debug, Clone)]
pub struct PredicateEvaluator {
    context: RequestContext,
}

impl PredicateEvaluator {
    pub fn new(context: RequestContext) -> Self {
        Self { context }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl TargetingEvaluator for PredicateEvaluator {
    fn evaluate(&self, group: &TargetingGroup) -> Result<TargetingPredicateResult, EvaluationError> {
        // Three-valued AND: FALSE dominates, then INDETERMINATE.
        let mut result = TargetingPredicateResult::True;
        for predicate in &group.targeting_predicates {
            match predicate.evaluate(&self.context) {
                TargetingPredicateResult::False => return Ok(TargetingPredicateResult::False),
                TargetingPredicateResult::Indeterminate => {
                    result = TargetingPredicateResult::Indeterminate
                }
                TargetingPredicateResult::True => {}
            }
        }
        Ok(result)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateEvaluatorFactory;

impl EvaluatorFactory for PredicateEvaluatorFactory {
    type Evaluator = PredicateEvaluator;

    fn bind(&self, context: RequestContext) -> PredicateEvaluator {
        PredicateEvaluator::new(context)
    }
}
