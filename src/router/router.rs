//! Execution routing
//!
//! Primary first, fallback second, each attempt under its own deadline.
//! A primary that is unavailable, errors, or times out hands the same
//! statement to the fallback. Fallback failures are final.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::errors::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::result::NativeResult;
use crate::statement::Statement;

use super::backend::{BackendError, QueryBackend};

/// Which backend served (or is serving) a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Primary,
    Fallback,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Primary => "primary",
            Route::Fallback => "fallback",
        }
    }

    /// Route to try after this one fails, if any
    pub fn next(self) -> Option<Route> {
        match self {
            Route::Primary => Some(Route::Fallback),
            Route::Fallback => None,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Native rows plus the route that produced them
#[derive(Debug, Clone, PartialEq)]
pub struct RoutedResult {
    pub route: Route,
    pub backend: String,
    pub native: NativeResult,
}

enum AttemptFailure {
    Backend(BackendError),
    TimedOut,
}

impl AttemptFailure {
    fn describe(&self, timeout_ms: u64) -> String {
        match self {
            AttemptFailure::Backend(e) => e.to_string(),
            AttemptFailure::TimedOut => format!("timed out after {}ms", timeout_ms),
        }
    }
}

/// Routes statements to the primary backend with fallback
pub struct ExecutionRouter {
    primary: Arc<dyn QueryBackend>,
    fallback: Arc<dyn QueryBackend>,
    metrics: Arc<MetricsRegistry>,
}

impl ExecutionRouter {
    pub fn new(primary: Arc<dyn QueryBackend>, fallback: Arc<dyn QueryBackend>) -> Self {
        Self {
            primary,
            fallback,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    /// Shares a metrics registry with the caller
    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    fn backend(&self, route: Route) -> &dyn QueryBackend {
        match route {
            Route::Primary => self.primary.as_ref(),
            Route::Fallback => self.fallback.as_ref(),
        }
    }

    /// First route that will actually be attempted
    pub fn initial_route(&self) -> Route {
        if self.primary.is_available() {
            Route::Primary
        } else {
            Route::Fallback
        }
    }

    /// Runs `statement`, giving each attempt `timeout` to finish.
    ///
    /// Dropping the returned future drops the in-flight backend call with it.
    pub async fn execute(
        &self,
        statement: &Statement,
        timeout: Duration,
    ) -> EngineResult<RoutedResult> {
        let timeout_ms = timeout.as_millis() as u64;
        let mut route = self.initial_route();

        if route == Route::Fallback {
            self.metrics.increment_fallbacks();
            log_event_with_fields(
                Event::FallbackEngaged,
                &[
                    ("from", self.primary.name()),
                    ("to", self.fallback.name()),
                    ("reason", "primary unavailable"),
                ],
            );
        }

        loop {
            let backend = self.backend(route);
            log_event_with_fields(
                Event::BackendSelected,
                &[("backend", backend.name()), ("route", route.as_str())],
            );

            let failure = match tokio::time::timeout(timeout, backend.execute(statement)).await {
                Ok(Ok(native)) => {
                    return Ok(RoutedResult {
                        route,
                        backend: backend.name().to_string(),
                        native,
                    })
                }
                Ok(Err(e)) => AttemptFailure::Backend(e),
                Err(_) => {
                    self.metrics.increment_timeouts();
                    AttemptFailure::TimedOut
                }
            };

            let reason = failure.describe(timeout_ms);
            log_event_with_fields(
                Event::BackendFailed,
                &[
                    ("backend", backend.name()),
                    ("route", route.as_str()),
                    ("reason", reason.as_str()),
                ],
            );

            match route.next() {
                Some(next) => {
                    self.metrics.increment_fallbacks();
                    log_event_with_fields(
                        Event::FallbackEngaged,
                        &[
                            ("from", backend.name()),
                            ("to", self.backend(next).name()),
                            ("reason", reason.as_str()),
                        ],
                    );
                    route = next;
                }
                None => {
                    return Err(match failure {
                        AttemptFailure::TimedOut => EngineError::timeout(backend.name(), timeout_ms),
                        AttemptFailure::Backend(e) => EngineError::execution_failed(format!(
                            "{} backend: {}",
                            backend.name(),
                            e
                        )),
                    })
                }
            }
        }
    }
}
