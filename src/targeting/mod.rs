pub mod context;
pub mod evaluator;
pub mod group;
pub mod predicate;

pub use context::RequestContext;
pub use evaluator::{
    EvaluationError, EvaluatorFactory, PredicateEvaluator, PredicateEvaluatorFactory,
    TargetingEvaluator,
};
pub use group::TargetingGroup;
pub use predicate::{TargetingPredicate, TargetingPredicateResult, TargetingRule};
