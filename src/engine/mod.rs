//! Request pipeline
//!
//! ```text
//! Query + ExecutionOptions
//!   → Validator → QueryOptimizer → SecurityPredicateAdapter → StatementBuilder
//!   → ExecutionRouter (primary, then fallback) → ResultNormalizer
//!   → QueryResult
//! ```

#[allow(clippy::module_inception)]
mod engine;
mod planner;
mod request;

pub use engine::QueryEngine;
pub use planner::StatementPlanner;
pub use request::QueryRequest;
