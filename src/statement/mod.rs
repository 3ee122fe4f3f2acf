//! Statement builder subsystem
//!
//! Composes the executable statement from the mandatory tenant predicate,
//! the resolved security predicates and the caller's query.
//!
//! # Invariants
//!
//! - No statement is rendered without the tenant predicate
//! - Tenant and security predicates are combined with AND, never OR
//! - Adapter literals are escaped one by one
//! - Caller fragments cannot close the clause they are placed in
//! - Rendering is deterministic

mod builder;
pub mod literal;
mod optimizer;
#[allow(clippy::module_inception)]
mod statement;

pub use builder::{StatementBuilder, DEFAULT_TENANT_COLUMN};
pub use literal::{check_fragment, is_aggregate, is_identifier, FragmentError, SqlLiteral};
pub use optimizer::{NoopOptimizer, QueryOptimizer};
pub use statement::Statement;
