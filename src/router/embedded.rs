//! Embedded analytical backend
//!
//! Each call holds a slot for as long as its blocking thread runs, which can
//! outlive a timed-out request. Callers past the slot limit wait, and the
//! router's deadline covers that wait.

use std::sync::Arc;

use serde_json::Value;

use crate::observability::{log_event_with_fields, Event};
use crate::result::NativeResult;
use crate::statement::Statement;

use super::backend::{BackendError, BackendFuture, QueryBackend};
use super::relational::ConnectionPool;

pub const DEFAULT_EMBEDDED_SLOTS: usize = 4;

/// Column names plus positional rows
pub type PositionalRows = (Vec<String>, Vec<Vec<Value>>);

/// A synchronous in-process analytical engine
///
/// Called from the blocking pool, never on an async worker.
pub trait AnalyticalEngine: Send + Sync + 'static {
    fn query(&self, sql: &str) -> Result<PositionalRows, String>;
}

/// Backend over an in-process analytical engine
pub struct EmbeddedBackend {
    engine: Option<Arc<dyn AnalyticalEngine>>,
    unavailable_reason: Option<String>,
    slots: ConnectionPool,
}

impl EmbeddedBackend {
    pub const NAME: &'static str = "embedded";

    pub fn new(engine: Arc<dyn AnalyticalEngine>) -> Self {
        Self {
            engine: Some(engine),
            unavailable_reason: None,
            slots: ConnectionPool::new(DEFAULT_EMBEDDED_SLOTS),
        }
    }

    /// Limits how many calls may occupy a blocking thread at once
    pub fn with_max_in_flight(mut self, slots: usize) -> Self {
        self.slots = ConnectionPool::new(slots);
        self
    }

    pub fn slots(&self) -> &ConnectionPool {
        &self.slots
    }

    /// Opens the engine once. A failed open leaves the backend unavailable
    /// for the life of the process; the router then goes straight to the
    /// fallback.
    pub fn open<F, E>(opener: F) -> Self
    where
        F: FnOnce() -> Result<E, String>,
        E: AnalyticalEngine,
    {
        match opener() {
            Ok(engine) => Self::new(Arc::new(engine)),
            Err(reason) => {
                log_event_with_fields(
                    Event::BackendUnavailable,
                    &[("backend", Self::NAME), ("reason", reason.as_str())],
                );
                Self::unavailable(reason)
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            engine: None,
            unavailable_reason: Some(reason.into()),
            slots: ConnectionPool::new(DEFAULT_EMBEDDED_SLOTS),
        }
    }

    /// Why the engine failed to open, if it did
    pub fn unavailable_reason(&self) -> Option<&str> {
        self.unavailable_reason.as_deref()
    }
}

impl QueryBackend for EmbeddedBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_available(&self) -> bool {
        self.engine.is_some()
    }

    fn execute<'a>(&'a self, statement: &'a Statement) -> BackendFuture<'a> {
        Box::pin(async move {
            let engine = match &self.engine {
                Some(engine) => Arc::clone(engine),
                None => {
                    return Err(BackendError::Unavailable(
                        self.unavailable_reason
                            .clone()
                            .unwrap_or_else(|| "engine not open".to_string()),
                    ))
                }
            };
            let sql = statement.sql().to_string();
            let slot = self.slots.acquire().await?;

            let (columns, rows) = tokio::task::spawn_blocking(move || {
                let _slot = slot;
                engine.query(&sql)
            })
            .await
                .map_err(|e| BackendError::Execution(format!("engine task failed: {}", e)))?
                .map_err(BackendError::Execution)?;

            Ok(NativeResult::positional(columns, rows))
        })
    }
}
