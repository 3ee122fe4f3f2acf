//! Security predicate adapter
//!
//! Turns an access-control evaluator's decision tree into predicate
//! fragments the statement builder merges into a query.
//!
//! ## Rules
//! - Translation only; policy is decided by the evaluator
//! - Every literal is escaped individually
//! - Unrecognized shapes are errors, never ignored
//! - Evaluator failure refuses the request, never runs it unrestricted

mod adapter;
mod decision;
mod evaluator;
mod translate;

pub use adapter::{SecurityPredicateAdapter, SecurityScope};
pub use decision::{AccessDecision, DecisionNode};
pub use evaluator::{
    AccessEvaluator, EvaluationFuture, PolicyConfig, PolicyError, RowPolicy, RuleEvaluator,
};
pub use translate::{translate, PredicateExpr, SecurityPredicate};
