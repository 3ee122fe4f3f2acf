//! Engine error taxonomy
//!
//! Every failure surfaced to a caller carries an [`ErrorKind`] so upstream
//! code can tell "fix your request" apart from "access denied" and from
//! "try again later".
//!
//! Error codes:
//! - TQL_MISSING_PROJECTION (REJECT)
//! - TQL_MISSING_SOURCE (REJECT)
//! - TQL_MISSING_TENANT (REJECT)
//! - TQL_INVALID_LIMIT (REJECT)
//! - TQL_INVALID_OFFSET (REJECT)
//! - TQL_INVALID_TIMEOUT (REJECT)
//! - TQL_HAVING_WITHOUT_GROUP_BY (REJECT)
//! - TQL_INVALID_EXPRESSION (REJECT)
//! - TQL_UNSUPPORTED_POLICY_SHAPE (DENIED)
//! - TQL_POLICY_UNAVAILABLE (DENIED)
//! - TQL_EXECUTION_FAILED (ERROR)
//! - TQL_TIMEOUT (ERROR)

use std::fmt;

use thiserror::Error;

/// Severity levels for engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Malformed request, rejected before any backend call
    Reject,
    /// Access policy could not be honored, request refused
    Denied,
    /// Execution failed after the request was accepted
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Reject => "REJECT",
            Severity::Denied => "DENIED",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kinds of engine failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Projection absent or an empty field list
    MissingProjection,
    /// Source absent or empty
    MissingSource,
    /// Caller context has no tenant identifier
    MissingTenant,
    /// Negative limit, or limit above the configured maximum
    InvalidLimit,
    /// Negative offset
    InvalidOffset,
    /// Zero timeout
    InvalidTimeout,
    /// HAVING requested without GROUP BY
    InvalidHavingWithoutGroupBy,
    /// Caller text that could escape its place in the statement
    InvalidExpression,
    /// Access decision contains a shape the translator cannot express
    UnsupportedPolicyShape,
    /// Access decision could not be obtained
    PolicyUnavailable,
    /// Both backends failed
    ExecutionFailed,
    /// A backend exceeded its allotted time
    Timeout,
}

impl ErrorKind {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MissingProjection => "TQL_MISSING_PROJECTION",
            ErrorKind::MissingSource => "TQL_MISSING_SOURCE",
            ErrorKind::MissingTenant => "TQL_MISSING_TENANT",
            ErrorKind::InvalidLimit => "TQL_INVALID_LIMIT",
            ErrorKind::InvalidOffset => "TQL_INVALID_OFFSET",
            ErrorKind::InvalidTimeout => "TQL_INVALID_TIMEOUT",
            ErrorKind::InvalidHavingWithoutGroupBy => "TQL_HAVING_WITHOUT_GROUP_BY",
            ErrorKind::InvalidExpression => "TQL_INVALID_EXPRESSION",
            ErrorKind::UnsupportedPolicyShape => "TQL_UNSUPPORTED_POLICY_SHAPE",
            ErrorKind::PolicyUnavailable => "TQL_POLICY_UNAVAILABLE",
            ErrorKind::ExecutionFailed => "TQL_EXECUTION_FAILED",
            ErrorKind::Timeout => "TQL_TIMEOUT",
        }
    }

    /// Returns the severity level for this kind
    pub fn severity(&self) -> Severity {
        match self {
            ErrorKind::UnsupportedPolicyShape | ErrorKind::PolicyUnavailable => Severity::Denied,
            ErrorKind::ExecutionFailed | ErrorKind::Timeout => Severity::Error,
            _ => Severity::Reject,
        }
    }

    /// Only timeouts may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Timeout)
    }

    /// Returns true for structural request errors
    pub fn is_structural(&self) -> bool {
        self.severity() == Severity::Reject
    }

    /// Returns true for access-policy errors
    pub fn is_security(&self) -> bool {
        self.severity() == Severity::Denied
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Engine error with full context
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{}] {}: {}", .kind.severity(), .kind.code(), .message)]
pub struct EngineError {
    kind: ErrorKind,
    message: String,
}

impl EngineError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn missing_projection(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingProjection, reason)
    }

    pub fn missing_source(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingSource, reason)
    }

    pub fn missing_tenant() -> Self {
        Self::new(ErrorKind::MissingTenant, "Caller context has no tenant identifier")
    }

    pub fn invalid_limit(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidLimit, reason)
    }

    pub fn invalid_offset(offset: i64) -> Self {
        Self::new(
            ErrorKind::InvalidOffset,
            format!("Offset must be >= 0, got {}", offset),
        )
    }

    pub fn invalid_timeout() -> Self {
        Self::new(ErrorKind::InvalidTimeout, "Timeout must be greater than zero")
    }

    pub fn having_without_group_by() -> Self {
        Self::new(
            ErrorKind::InvalidHavingWithoutGroupBy,
            "HAVING requires GROUP BY",
        )
    }

    pub fn invalid_expression(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidExpression, reason)
    }

    pub fn unsupported_policy_shape(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedPolicyShape, reason)
    }

    pub fn policy_unavailable(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::PolicyUnavailable, reason)
    }

    pub fn execution_failed(reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ExecutionFailed, reason)
    }

    pub fn timeout(backend: &str, timeout_ms: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("Backend '{}' did not respond within {}ms", backend, timeout_ms),
        )
    }

    /// Returns the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the string code of the kind
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    /// Returns the human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
