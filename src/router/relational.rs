//! Relational store backend
//!
//! Statements run through an async client gated by a bounded pool. The pool
//! permit is held for exactly the lifetime of the call: returned on success,
//! on error, and when the router drops the future on timeout or cancellation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::result::NativeResult;
use crate::statement::Statement;

use super::backend::{BackendError, BackendFuture, QueryBackend};

pub const DEFAULT_POOL_SIZE: usize = 8;

/// Rows of named fields
pub type NamedRows = Vec<Map<String, Value>>;

/// Boxed client future
pub type ClientFuture<'a> = Pin<Box<dyn Future<Output = Result<NamedRows, String>> + Send + 'a>>;

/// Async client for the relational store
pub trait RelationalClient: Send + Sync {
    fn query<'a>(&'a self, sql: &'a str) -> ClientFuture<'a>;
}

/// Bounded set of connection slots
#[derive(Debug, Clone)]
pub struct ConnectionPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl ConnectionPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently checked out
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Waits for a free slot. The slot returns to the pool when the permit
    /// is dropped.
    pub async fn acquire(&self) -> Result<OwnedSemaphorePermit, BackendError> {
        Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| BackendError::PoolClosed)
    }

    /// Stops handing out slots; waiters fail with `PoolClosed`
    pub fn close(&self) {
        self.permits.close();
    }
}

impl Default for ConnectionPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

/// Backend over a pooled relational store
pub struct RelationalBackend {
    client: Arc<dyn RelationalClient>,
    pool: ConnectionPool,
}

impl RelationalBackend {
    pub const NAME: &'static str = "relational";

    pub fn new(client: Arc<dyn RelationalClient>, pool: ConnectionPool) -> Self {
        Self { client, pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }
}

impl QueryBackend for RelationalBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn execute<'a>(&'a self, statement: &'a Statement) -> BackendFuture<'a> {
        Box::pin(async move {
            let _slot = self.pool.acquire().await?;
            let rows = self
                .client
                .query(statement.sql())
                .await
                .map_err(BackendError::Execution)?;
            Ok(NativeResult::named(rows))
        })
    }
}
