//! Wire request

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::query::{CallerContext, ExecutionOptions, Query};

/// A query plus the caller it runs for, as decoded from JSON.
///
/// Pagination and timeout fall back to the configured defaults when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: Query,
    pub caller: CallerContext,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl QueryRequest {
    pub fn new(query: Query, caller: CallerContext) -> Self {
        Self {
            query,
            caller,
            limit: None,
            offset: None,
            timeout_ms: None,
        }
    }

    /// Execution options with configured defaults filled in
    pub fn options(&self, config: &EngineConfig) -> ExecutionOptions {
        ExecutionOptions::new(self.caller.clone())
            .with_limit(self.limit.unwrap_or(config.default_limit))
            .with_offset(self.offset.unwrap_or(0))
            .with_timeout_ms(self.timeout_ms.unwrap_or(config.default_timeout_ms))
    }
}
