//! Query model
//!
//! Pure data: projection, source (possibly nested), caller predicate, joins,
//! grouping, ordering and pagination, plus the per-request caller context and
//! execution options. No execution logic lives here.

mod ast;
mod context;
mod options;

pub use ast::{Join, JoinKind, JoinOn, OrderBy, Projection, Query, SortDirection, Source};
pub use context::{Action, CallerContext};
pub use options::{
    ExecutionOptions, Pagination, DEFAULT_LIMIT, DEFAULT_OFFSET, DEFAULT_TIMEOUT_MS,
};
