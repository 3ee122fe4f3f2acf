//! Backend capability

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::result::NativeResult;
use crate::statement::Statement;

/// Backend failure, before the router maps it onto an engine error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("connection pool closed")]
    PoolClosed,
    #[error("execution failed: {0}")]
    Execution(String),
}

/// Boxed execution future
pub type BackendFuture<'a> =
    Pin<Box<dyn Future<Output = Result<NativeResult, BackendError>> + Send + 'a>>;

/// A data source that can run a rendered statement
///
/// Deadlines are owned by the router; a backend simply runs until done or
/// until its future is dropped. Anything it acquires must be released on
/// drop.
pub trait QueryBackend: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Returns false when the backend cannot serve queries at all
    fn is_available(&self) -> bool {
        true
    }

    fn execute<'a>(&'a self, statement: &'a Statement) -> BackendFuture<'a>;
}
