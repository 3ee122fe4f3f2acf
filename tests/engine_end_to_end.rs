//! End-to-End Engine Tests
//!
//! Full requests through configuration, planning, routing and normalization:
//! - the reference budgets request
//! - column alignment from both backend shapes
//! - configuration files drive the assembled engine

mod common;

use std::io::Write;
use std::sync::{Arc, Mutex};

use common::{named_row, Behavior, CountingBackend, StaticClient};
use serde_json::json;
use tenantql::policy::{RowPolicy, RuleEvaluator};
use tenantql::query::{CallerContext, ExecutionOptions, Join, OrderBy, Projection, Query};
use tenantql::result::NativeResult;
use tenantql::router::{AnalyticalEngine, PositionalRows};
use tenantql::{EngineConfig, ErrorKind, QueryEngine, QueryRequest, Route};

// =============================================================================
// Helper Functions
// =============================================================================

/// Embedded engine double answering in its own column order
struct RecordingEngine {
    seen: Mutex<Vec<String>>,
}

impl RecordingEngine {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            seen: Mutex::new(Vec::new()),
        })
    }

    fn last_sql(&self) -> Option<String> {
        self.seen.lock().unwrap().last().cloned()
    }
}

impl AnalyticalEngine for RecordingEngine {
    fn query(&self, sql: &str) -> Result<PositionalRows, String> {
        self.seen.lock().unwrap().push(sql.to_string());
        Ok((
            vec!["amount".into(), "name".into()],
            vec![vec![json!(10), json!("ops")], vec![json!(4), json!("hr")]],
        ))
    }
}

fn write_config(body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

// =============================================================================
// Reference Request
// =============================================================================

/// `name, amount` from `budgets` for T1, unrestricted, limit 10 offset 0.
#[tokio::test]
async fn test_budgets_request_end_to_end() {
    let primary = CountingBackend::new(
        "embedded",
        Behavior::Rows(NativeResult::positional(
            vec!["name".into(), "amount".into()],
            vec![vec![json!("ops"), json!(10)]],
        )),
    );
    let fallback = CountingBackend::new("relational", Behavior::Fail);
    let evaluator = RuleEvaluator::new().with_policy("budgets", RowPolicy::None);
    let engine = QueryEngine::from_config(
        &EngineConfig::default(),
        Arc::new(evaluator),
        primary.clone(),
        fallback.clone(),
    )
    .unwrap();

    let query = Query::select(Projection::fields(["name", "amount"]), "budgets");
    let options = ExecutionOptions::new(CallerContext::new("T1", "u-1", "VIEWER"))
        .with_limit(10)
        .with_offset(0);

    let result = engine.execute(&query, &options).await.unwrap();

    assert_eq!(
        primary.last_sql().unwrap(),
        "SELECT name, amount FROM budgets WHERE tenant_id = 'T1' LIMIT 10 OFFSET 0"
    );
    assert_eq!(result.columns, vec!["name", "amount"]);
    assert_eq!(result.rows, vec![vec![json!("ops"), json!(10)]]);
    assert_eq!(result.row_count, 1);
    assert_eq!(result.served_by, Route::Primary);
    assert!(!result.served_from_cache);
    assert!(result.is_aligned());
    assert_eq!(fallback.calls(), 0);
    assert_eq!(engine.metrics().snapshot().queries_executed, 1);
}

/// Query-level pagination overrides the options.
#[tokio::test]
async fn test_query_pagination_takes_precedence() {
    let primary = CountingBackend::new(
        "embedded",
        Behavior::Rows(NativeResult::positional(vec!["name".into()], vec![])),
    );
    let engine = QueryEngine::from_config(
        &EngineConfig::default(),
        common::CountingEvaluator::unrestricted(),
        primary.clone(),
        CountingBackend::new("relational", Behavior::Fail),
    )
    .unwrap();

    let query = Query::select(Projection::fields(["name"]), "budgets")
        .order_by(OrderBy::asc("name"))
        .with_limit(3)
        .with_offset(6);

    let result = engine
        .execute(&query, &common::options("T1"))
        .await
        .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.columns, vec!["name"]);
    assert!(primary
        .last_sql()
        .unwrap()
        .ends_with("ORDER BY name ASC LIMIT 3 OFFSET 6"));
}

// =============================================================================
// Column Alignment
// =============================================================================

/// Positional rows from the embedded engine follow the declared projection.
#[tokio::test]
async fn test_embedded_rows_follow_projection() {
    let analytical = RecordingEngine::new();
    let engine = QueryEngine::with_backends(
        &EngineConfig::default(),
        Arc::new(RuleEvaluator::new().with_privileged_role("ADMIN")),
        Some(analytical.clone()),
        Arc::new(StaticClient(vec![])),
    )
    .unwrap();

    let query = Query::select(Projection::fields(["name", "amount"]), "budgets");
    let options = ExecutionOptions::new(CallerContext::new("T1", "root", "ADMIN")).with_limit(5);

    let result = engine.execute(&query, &options).await.unwrap();

    assert_eq!(result.served_by, Route::Primary);
    assert_eq!(result.columns, vec!["name", "amount"]);
    assert_eq!(
        result.rows,
        vec![vec![json!("ops"), json!(10)], vec![json!("hr"), json!(4)]]
    );
    assert!(analytical
        .last_sql()
        .unwrap()
        .starts_with("SELECT name, amount FROM budgets WHERE tenant_id = 'T1'"));
}

/// Named rows from the relational store align the same way.
#[tokio::test]
async fn test_relational_rows_follow_projection() {
    let config = EngineConfig {
        embedded_enabled: false,
        ..EngineConfig::default()
    };
    let client = StaticClient(vec![
        named_row(&[("amount", json!(10)), ("name", json!("ops"))]),
        named_row(&[("name", json!("hr")), ("amount", json!(null))]),
    ]);
    let engine = QueryEngine::with_backends(
        &config,
        Arc::new(RuleEvaluator::new()),
        Some(RecordingEngine::new()),
        Arc::new(client),
    )
    .unwrap();

    let query = Query::select(Projection::fields(["budgets.name", "amount"]), "budgets")
        .with_join(Join::left("owners", "budgets.owner_id", "owners.id"));

    let result = engine
        .execute(&query, &common::options("T1"))
        .await
        .unwrap();

    assert_eq!(result.served_by, Route::Fallback);
    assert_eq!(result.columns, vec!["name", "amount"]);
    assert_eq!(
        result.rows,
        vec![vec![json!("ops"), json!(10)], vec![json!("hr"), json!(null)]]
    );
}

/// A backend returning ragged rows fails the request.
#[tokio::test]
async fn test_ragged_backend_rows_fail() {
    let primary = CountingBackend::new(
        "embedded",
        Behavior::Rows(NativeResult::positional(
            vec!["name".into(), "amount".into()],
            vec![vec![json!("ops")]],
        )),
    );
    let engine = QueryEngine::from_config(
        &EngineConfig::default(),
        common::CountingEvaluator::unrestricted(),
        primary,
        CountingBackend::new("relational", Behavior::Fail),
    )
    .unwrap();

    let err = engine
        .execute(
            &Query::select(Projection::Wildcard, "budgets"),
            &common::options("T1"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
}

/// A projected column neither backend returned fails on either route.
#[tokio::test]
async fn test_missing_column_fails_on_both_routes() {
    let positional = NativeResult::positional(vec!["name".into()], vec![vec![json!("ops")]]);
    let named = NativeResult::named(vec![named_row(&[("name", json!("ops"))])]);

    let cases = [
        (Behavior::Rows(positional), Behavior::Fail),
        (Behavior::Unavailable, Behavior::Rows(named)),
    ];

    for (primary, fallback) in cases {
        let engine = QueryEngine::from_config(
            &EngineConfig::default(),
            common::CountingEvaluator::unrestricted(),
            CountingBackend::new("embedded", primary),
            CountingBackend::new("relational", fallback),
        )
        .unwrap();

        let err = engine
            .execute(
                &Query::select(Projection::fields(["name", "total"]), "budgets"),
                &common::options("T1"),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ExecutionFailed);
        assert_eq!(engine.metrics().snapshot().execution_failures, 1);
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// A configuration file drives tenant column, limits and row policy.
#[tokio::test]
async fn test_engine_from_config_file() {
    let file = write_config(
        r#"{
            "tenant_column": "org_id",
            "default_limit": 50,
            "max_limit": 200,
            "log_level": "error",
            "policy": {
                "privileged_roles": ["AUDITOR"],
                "relations": {"budgets": {"type": "ownership", "owner_field": "created_by"}}
            }
        }"#,
    );
    let config = EngineConfig::load(file.path()).unwrap();

    let primary = CountingBackend::new(
        "embedded",
        Behavior::Rows(NativeResult::positional(vec!["name".into()], vec![])),
    );
    let engine = QueryEngine::from_config(
        &config,
        Arc::new(RuleEvaluator::from_config(&config.policy)),
        primary.clone(),
        CountingBackend::new("relational", Behavior::Fail),
    )
    .unwrap();

    let request: QueryRequest = serde_json::from_value(json!({
        "query": {"projection": {"fields": ["name"]}, "source": {"relation": "budgets"}},
        "caller": {"caller_id": "u-7", "role": "VIEWER", "tenant_id": "acme"}
    }))
    .unwrap();

    engine
        .execute(&request.query, &request.options(&config))
        .await
        .unwrap();
    assert_eq!(
        primary.last_sql().unwrap(),
        "SELECT name FROM budgets WHERE org_id = 'acme' AND created_by = 'u-7' LIMIT 50 OFFSET 0"
    );

    let mut over = request.clone();
    over.limit = Some(201);
    let err = engine
        .execute(&over.query, &over.options(&config))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidLimit);
}

/// An invalid configuration file is refused at load.
#[test]
fn test_invalid_config_file() {
    let file = write_config(r#"{"default_limit": 500, "max_limit": 100}"#);
    let err = EngineConfig::load(file.path()).unwrap_err();
    assert_eq!(err.code(), "TQL_CONFIG_INVALID");
}
