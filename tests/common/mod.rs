//! Shared test doubles for the integration suites

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};
use tenantql::policy::{AccessDecision, AccessEvaluator, EvaluationFuture, PolicyError};
use tenantql::query::{CallerContext, ExecutionOptions};
use tenantql::result::NativeResult;
use tenantql::router::{BackendError, BackendFuture, ClientFuture, QueryBackend, RelationalClient};
use tenantql::statement::Statement;

// =============================================================================
// Backends
// =============================================================================

#[derive(Clone)]
pub enum Behavior {
    /// Return these rows
    Rows(NativeResult),
    /// Fail every call
    Fail,
    /// Never finish
    Stall,
    /// Report unavailable and refuse calls
    Unavailable,
}

/// Backend double that counts calls and records the SQL it was given
pub struct CountingBackend {
    name: &'static str,
    behavior: Behavior,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl CountingBackend {
    pub fn new(name: &'static str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name,
            behavior,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_sql(&self) -> Option<String> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl QueryBackend for CountingBackend {
    fn name(&self) -> &str {
        self.name
    }

    fn is_available(&self) -> bool {
        !matches!(self.behavior, Behavior::Unavailable)
    }

    fn execute<'a>(&'a self, statement: &'a Statement) -> BackendFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(statement.sql().to_string());
        let behavior = self.behavior.clone();
        Box::pin(async move {
            match behavior {
                Behavior::Rows(native) => Ok(native),
                Behavior::Fail => Err(BackendError::Execution("backend exploded".into())),
                Behavior::Stall => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Err(BackendError::Execution("unreachable".into()))
                }
                Behavior::Unavailable => Err(BackendError::Unavailable("closed".into())),
            }
        })
    }
}

/// Sets its flag when dropped
pub struct DropFlag(pub Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Relational client whose queries never finish
#[derive(Default)]
pub struct StalledClient {
    pub started: AtomicUsize,
    pub dropped: Arc<AtomicBool>,
}

impl RelationalClient for StalledClient {
    fn query<'a>(&'a self, _: &'a str) -> ClientFuture<'a> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let guard = DropFlag(Arc::clone(&self.dropped));
        Box::pin(async move {
            let _guard = guard;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(vec![])
        })
    }
}

/// Relational client returning fixed rows
pub struct StaticClient(pub Vec<Map<String, Value>>);

impl RelationalClient for StaticClient {
    fn query<'a>(&'a self, _: &'a str) -> ClientFuture<'a> {
        let rows = self.0.clone();
        Box::pin(async move { Ok(rows) })
    }
}

// =============================================================================
// Evaluators
// =============================================================================

/// Evaluator double returning one fixed answer and counting calls
pub struct CountingEvaluator {
    answer: Result<AccessDecision, PolicyError>,
    calls: AtomicUsize,
}

impl CountingEvaluator {
    pub fn new(answer: Result<AccessDecision, PolicyError>) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unrestricted() -> Arc<Self> {
        Self::new(Ok(AccessDecision::Unrestricted))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AccessEvaluator for CountingEvaluator {
    fn evaluate<'a>(&'a self, _: &'a CallerContext, _: &'a str) -> EvaluationFuture<'a> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let answer = self.answer.clone();
        Box::pin(async move { answer })
    }
}

/// Fails for one relation, unrestricted for the rest
pub struct FailsFor(pub &'static str);

impl AccessEvaluator for FailsFor {
    fn evaluate<'a>(&'a self, _: &'a CallerContext, relation: &'a str) -> EvaluationFuture<'a> {
        let answer = if relation == self.0 {
            Err(PolicyError::Unavailable("policy store down".into()))
        } else {
            Ok(AccessDecision::Unrestricted)
        };
        Box::pin(async move { answer })
    }
}

// =============================================================================
// Requests
// =============================================================================

pub fn viewer(tenant: &str) -> CallerContext {
    CallerContext::new(tenant, "u-1", "VIEWER")
}

pub fn options(tenant: &str) -> ExecutionOptions {
    ExecutionOptions::new(viewer(tenant))
        .with_limit(10)
        .with_offset(0)
}

pub fn named_row(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
