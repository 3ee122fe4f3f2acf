//! Backend execution
//!
//! An embedded analytical engine is the primary backend; a pooled relational
//! store is the fallback. The router owns deadlines and fallback; backends
//! only run statements.

mod backend;
mod embedded;
mod relational;
#[allow(clippy::module_inception)]
mod router;

pub use backend::{BackendError, BackendFuture, QueryBackend};
pub use embedded::{AnalyticalEngine, EmbeddedBackend, PositionalRows, DEFAULT_EMBEDDED_SLOTS};
pub use relational::{
    ClientFuture, ConnectionPool, NamedRows, RelationalBackend, RelationalClient,
    DEFAULT_POOL_SIZE,
};
pub use router::{ExecutionRouter, RoutedResult, Route};
