//! Execution Routing Tests
//!
//! Primary/fallback behavior seen through the engine:
//! - fallback correctness when the primary is unavailable or failing
//! - per-attempt timeouts hand over to the fallback
//! - caller cancellation drops the in-flight call and frees its pool slot

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use common::{named_row, Behavior, CountingBackend, CountingEvaluator, StalledClient, StaticClient};
use serde_json::json;
use tenantql::query::{Projection, Query};
use tenantql::result::NativeResult;
use tenantql::router::{ConnectionPool, EmbeddedBackend, QueryBackend, RelationalBackend};
use tenantql::{EngineConfig, ErrorKind, QueryEngine, Route};

// =============================================================================
// Helper Functions
// =============================================================================

fn engine(primary: Arc<dyn QueryBackend>, fallback: Arc<dyn QueryBackend>) -> QueryEngine {
    QueryEngine::from_config(
        &EngineConfig::default(),
        CountingEvaluator::unrestricted(),
        primary,
        fallback,
    )
    .unwrap()
}

fn budgets() -> Query {
    Query::select(Projection::fields(["name", "amount"]), "budgets")
}

fn fallback_rows() -> NativeResult {
    NativeResult::named(vec![
        named_row(&[("name", json!("ops")), ("amount", json!(10))]),
        named_row(&[("name", json!("hr")), ("amount", json!(4))]),
    ])
}

// =============================================================================
// Fallback
// =============================================================================

/// Primary always unavailable, fallback returns R ⇒ result is R.
#[tokio::test]
async fn test_unavailable_primary_serves_from_fallback() {
    let primary = CountingBackend::new("embedded", Behavior::Unavailable);
    let fallback = CountingBackend::new("relational", Behavior::Rows(fallback_rows()));
    let engine = engine(primary.clone(), fallback.clone());

    let result = engine
        .execute(&budgets(), &common::options("T1"))
        .await
        .unwrap();

    assert_eq!(result.served_by, Route::Fallback);
    assert_eq!(result.columns, vec!["name", "amount"]);
    assert_eq!(
        result.rows,
        vec![vec![json!("ops"), json!(10)], vec![json!("hr"), json!(4)]]
    );
    assert_eq!(result.row_count, 2);
    assert_eq!(primary.calls(), 0);
    assert_eq!(fallback.calls(), 1);
}

/// The fallback runs the exact statement the primary was given.
#[tokio::test]
async fn test_failing_primary_hands_same_statement_to_fallback() {
    let primary = CountingBackend::new("embedded", Behavior::Fail);
    let fallback = CountingBackend::new("relational", Behavior::Rows(fallback_rows()));
    let engine = engine(primary.clone(), fallback.clone());

    let result = engine
        .execute(&budgets(), &common::options("T1"))
        .await
        .unwrap();

    assert_eq!(result.served_by, Route::Fallback);
    assert_eq!(primary.last_sql(), fallback.last_sql());
    assert_eq!(engine.metrics().snapshot().fallbacks, 1);
}

/// Both backends failing ⇒ ExecutionFailed, no partial result.
#[tokio::test]
async fn test_both_failing_is_execution_failed() {
    let engine = engine(
        CountingBackend::new("embedded", Behavior::Fail),
        CountingBackend::new("relational", Behavior::Fail),
    );

    let err = engine
        .execute(&budgets(), &common::options("T1"))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
    assert_eq!(engine.metrics().snapshot().execution_failures, 1);
}

/// A failed open leaves the embedded side unavailable for good.
#[tokio::test]
async fn test_failed_embedded_open_routes_to_relational() {
    let primary = EmbeddedBackend::open(|| -> Result<NeverEngine, String> {
        Err("database file locked".into())
    });
    let fallback = RelationalBackend::new(
        Arc::new(StaticClient(vec![named_row(&[
            ("name", json!("ops")),
            ("amount", json!(10)),
        ])])),
        ConnectionPool::new(2),
    );
    let engine = engine(Arc::new(primary), Arc::new(fallback));

    for _ in 0..3 {
        let result = engine
            .execute(&budgets(), &common::options("T1"))
            .await
            .unwrap();
        assert_eq!(result.served_by, Route::Fallback);
        assert_eq!(result.rows, vec![vec![json!("ops"), json!(10)]]);
    }
}

struct NeverEngine;

impl tenantql::router::AnalyticalEngine for NeverEngine {
    fn query(&self, _: &str) -> Result<tenantql::router::PositionalRows, String> {
        Err("never opened".into())
    }
}

// =============================================================================
// Timeouts
// =============================================================================

/// Primary never returns, timeout 50ms ⇒ fallback answers within a bounded margin.
#[tokio::test]
async fn test_primary_timeout_falls_back_promptly() {
    let primary = CountingBackend::new("embedded", Behavior::Stall);
    let fallback = CountingBackend::new("relational", Behavior::Rows(fallback_rows()));
    let engine = engine(primary, fallback);

    let started = Instant::now();
    let result = engine
        .execute(&budgets(), &common::options("T1").with_timeout_ms(50))
        .await
        .unwrap();
    let elapsed = started.elapsed();

    assert_eq!(result.served_by, Route::Fallback);
    assert!(elapsed >= Duration::from_millis(50));
    assert!(elapsed < Duration::from_millis(1_000), "took {:?}", elapsed);
    assert_eq!(engine.metrics().snapshot().timeouts, 1);
}

/// Fallback exceeding its own deadline ⇒ Timeout.
#[tokio::test]
async fn test_fallback_timeout_is_timeout() {
    let engine = engine(
        CountingBackend::new("embedded", Behavior::Stall),
        CountingBackend::new("relational", Behavior::Stall),
    );

    let err = engine
        .execute(&budgets(), &common::options("T1").with_timeout_ms(30))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(err.kind().is_retryable());
    assert_eq!(engine.metrics().snapshot().timeouts, 2);
}

/// A timed-out relational call gives its pool slot back.
#[tokio::test]
async fn test_timeout_releases_pool_slot() {
    let client = Arc::new(StalledClient::default());
    let fallback = Arc::new(RelationalBackend::new(client.clone(), ConnectionPool::new(1)));
    let engine = engine(
        CountingBackend::new("embedded", Behavior::Unavailable),
        fallback.clone(),
    );

    for _ in 0..2 {
        let err = engine
            .execute(&budgets(), &common::options("T1").with_timeout_ms(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(fallback.pool().available(), 1);
    }

    assert_eq!(client.started.load(Ordering::SeqCst), 2);
    assert!(client.dropped.load(Ordering::SeqCst));
}

// =============================================================================
// Cancellation
// =============================================================================

/// Dropping the request future drops the backend call and frees its slot.
#[tokio::test]
async fn test_caller_cancellation_drops_backend_call() {
    let client = Arc::new(StalledClient::default());
    let fallback = Arc::new(RelationalBackend::new(client.clone(), ConnectionPool::new(1)));
    let engine = engine(
        CountingBackend::new("embedded", Behavior::Unavailable),
        fallback.clone(),
    );

    let options = common::options("T1").with_timeout_ms(60_000);
    let query = budgets();
    let outcome =
        tokio::time::timeout(Duration::from_millis(30), engine.execute(&query, &options)).await;

    assert!(outcome.is_err(), "request should still have been running");
    assert_eq!(client.started.load(Ordering::SeqCst), 1);
    assert!(client.dropped.load(Ordering::SeqCst));
    assert_eq!(fallback.pool().available(), 1);
    assert_eq!(engine.metrics().snapshot().timeouts, 0);
}
