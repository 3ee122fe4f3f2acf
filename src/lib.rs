//! tenantql - tenant-isolated analytical query execution
//!
//! Every statement carries the caller's tenant restriction and the row-level
//! security predicate for each relation it reads. Statements run on an
//! embedded analytical engine with a pooled relational store as fallback,
//! and results come back in one canonical shape.

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod observability;
pub mod policy;
pub mod query;
pub mod result;
pub mod router;
pub mod statement;
pub mod validator;

pub use config::EngineConfig;
pub use engine::{QueryEngine, QueryRequest, StatementPlanner};
pub use errors::{EngineError, EngineResult, ErrorKind};
pub use query::{CallerContext, ExecutionOptions, Projection, Query};
pub use result::QueryResult;
pub use router::Route;
