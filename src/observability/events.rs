//! Observable engine events

use std::fmt;

use super::logger::LogLevel;

/// Observable events in the query pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    ConfigLoaded,
    /// A backend could not be opened at startup
    BackendUnavailable,

    // Query pipeline
    QueryReceived,
    /// Structural validation rejected the query
    QueryRejected,
    /// Security evaluation or translation failed
    PolicyDenied,
    StatementRendered,
    BackendSelected,
    BackendFailed,
    FallbackEngaged,
    QueryCompleted,
    QueryFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::BackendUnavailable => "BACKEND_UNAVAILABLE",
            Event::QueryReceived => "QUERY_RECEIVED",
            Event::QueryRejected => "QUERY_REJECTED",
            Event::PolicyDenied => "POLICY_DENIED",
            Event::StatementRendered => "STATEMENT_RENDERED",
            Event::BackendSelected => "BACKEND_SELECTED",
            Event::BackendFailed => "BACKEND_FAILED",
            Event::FallbackEngaged => "FALLBACK_ENGAGED",
            Event::QueryCompleted => "QUERY_COMPLETED",
            Event::QueryFailed => "QUERY_FAILED",
        }
    }

    /// Level the event is logged at
    pub fn level(&self) -> LogLevel {
        match self {
            Event::StatementRendered | Event::BackendSelected => LogLevel::Trace,
            Event::ConfigLoaded | Event::QueryReceived | Event::QueryCompleted => LogLevel::Info,
            Event::BackendUnavailable
            | Event::QueryRejected
            | Event::BackendFailed
            | Event::FallbackEngaged => LogLevel::Warn,
            Event::PolicyDenied | Event::QueryFailed => LogLevel::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
