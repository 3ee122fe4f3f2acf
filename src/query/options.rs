//! Execution options and resolved pagination

use serde::{Deserialize, Serialize};

use super::ast::Query;
use super::context::CallerContext;

pub const DEFAULT_LIMIT: i64 = 1000;
pub const DEFAULT_OFFSET: i64 = 0;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Per-request execution options
///
/// `limit` and `offset` are signed so that negative input survives decoding
/// and is rejected by the validator with a precise error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionOptions {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Reserved; no caching is performed
    #[serde(default)]
    pub enable_cache: bool,
    /// Reserved; no caching is performed
    #[serde(default)]
    pub cache_ttl_ms: Option<u64>,
    pub caller: CallerContext,
}

impl ExecutionOptions {
    /// Options with default pagination and timeout for the given caller
    pub fn new(caller: CallerContext) -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: DEFAULT_OFFSET,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            enable_cache: false,
            cache_ttl_ms: None,
            caller,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Limit and offset in force for a top-level query.
    ///
    /// Values set on the query take precedence over the options. Negative
    /// values are clamped to zero here; the validator has already rejected
    /// them by the time a statement is built.
    pub fn effective_pagination(&self, query: &Query) -> Pagination {
        let limit = query.limit.unwrap_or(self.limit);
        let offset = query.offset.unwrap_or(self.offset);
        Pagination {
            limit: limit.max(0) as u64,
            offset: offset.max(0) as u64,
        }
    }
}

/// Validated, non-negative pagination bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl Pagination {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }
}
