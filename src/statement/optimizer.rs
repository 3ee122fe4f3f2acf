//! Optimizer hook
//!
//! The only place allowed to reorder joins or otherwise rewrite a query
//! before rendering. Runs after validation and before security resolution,
//! so a rewrite can never skip the tenant or security predicates.

use crate::query::Query;

/// Query rewrite applied before rendering
pub trait QueryOptimizer: Send + Sync {
    fn optimize(&self, query: Query) -> Query;
}

/// Returns the query unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopOptimizer;

impl QueryOptimizer for NoopOptimizer {
    fn optimize(&self, query: Query) -> Query {
        query
    }
}
