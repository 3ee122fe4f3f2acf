//! Query engine
//!
//! The single entry point: plan, route, normalize. A request that fails any
//! step gets no partial result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::{EngineResult, ErrorKind};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::policy::AccessEvaluator;
use crate::query::{ExecutionOptions, Query};
use crate::result::{QueryResult, ResultNormalizer};
use crate::router::{
    AnalyticalEngine, ConnectionPool, EmbeddedBackend, ExecutionRouter, QueryBackend,
    RelationalBackend, RelationalClient,
};

use super::planner::StatementPlanner;

/// Secure analytical query engine
pub struct QueryEngine {
    planner: StatementPlanner,
    router: ExecutionRouter,
    normalizer: ResultNormalizer,
    metrics: Arc<MetricsRegistry>,
}

impl QueryEngine {
    /// Assembles an engine from its stages, sharing one metrics registry.
    pub fn new(planner: StatementPlanner, router: ExecutionRouter) -> Self {
        let metrics = Arc::clone(planner.metrics());
        Self {
            router: router.with_metrics(Arc::clone(&metrics)),
            planner,
            normalizer: ResultNormalizer::new(),
            metrics,
        }
    }

    /// Engine over arbitrary primary and fallback backends
    pub fn from_config(
        config: &EngineConfig,
        evaluator: Arc<dyn AccessEvaluator>,
        primary: Arc<dyn QueryBackend>,
        fallback: Arc<dyn QueryBackend>,
    ) -> EngineResult<Self> {
        let planner = StatementPlanner::from_config(config, evaluator)?;
        Ok(Self::new(planner, ExecutionRouter::new(primary, fallback)))
    }

    /// Engine over the embedded engine (primary) and a pooled relational
    /// client (fallback). The embedded side is left unavailable when the
    /// configuration disables it or no engine could be opened.
    pub fn with_backends(
        config: &EngineConfig,
        evaluator: Arc<dyn AccessEvaluator>,
        analytical: Option<Arc<dyn AnalyticalEngine>>,
        client: Arc<dyn RelationalClient>,
    ) -> EngineResult<Self> {
        let primary = match analytical {
            Some(engine) if config.embedded_enabled => {
                EmbeddedBackend::new(engine).with_max_in_flight(config.embedded_max_in_flight)
            }
            Some(_) => EmbeddedBackend::unavailable("disabled by configuration"),
            None => EmbeddedBackend::unavailable("no analytical engine"),
        };
        let fallback =
            RelationalBackend::new(client, ConnectionPool::new(config.relational_pool_size));

        Self::from_config(config, evaluator, Arc::new(primary), Arc::new(fallback))
    }

    pub fn planner(&self) -> &StatementPlanner {
        &self.planner
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Executes `query` for the caller in `options`.
    ///
    /// Dropping the returned future cancels the request and whatever backend
    /// call is in flight.
    pub async fn execute(
        &self,
        query: &Query,
        options: &ExecutionOptions,
    ) -> EngineResult<QueryResult> {
        let request_id = Uuid::new_v4().to_string();
        let started = Instant::now();

        log_event_with_fields(
            Event::QueryReceived,
            &[
                ("caller_id", options.caller.caller_id.as_str()),
                ("request_id", request_id.as_str()),
                ("tenant_id", options.caller.tenant_id.as_str()),
            ],
        );

        let outcome = self.run(query, options, started).await;

        match &outcome {
            Ok(result) => {
                self.metrics.increment_queries_executed();
                let rows = result.row_count.to_string();
                let elapsed = result.execution_time_ms.to_string();
                log_event_with_fields(
                    Event::QueryCompleted,
                    &[
                        ("elapsed_ms", elapsed.as_str()),
                        ("request_id", request_id.as_str()),
                        ("route", result.served_by.as_str()),
                        ("rows", rows.as_str()),
                    ],
                );
            }
            Err(e) => {
                if matches!(e.kind(), ErrorKind::ExecutionFailed | ErrorKind::Timeout) {
                    self.metrics.increment_execution_failures();
                }
                log_event_with_fields(
                    Event::QueryFailed,
                    &[
                        ("code", e.code()),
                        ("reason", e.message()),
                        ("request_id", request_id.as_str()),
                    ],
                );
            }
        }

        outcome
    }

    async fn run(
        &self,
        query: &Query,
        options: &ExecutionOptions,
        started: Instant,
    ) -> EngineResult<QueryResult> {
        let statement = self.planner.prepare(query, options).await?;

        let routed = self
            .router
            .execute(&statement, Duration::from_millis(options.timeout_ms))
            .await?;

        let (columns, rows) = self
            .normalizer
            .normalize(statement.projection(), routed.native)?;

        Ok(QueryResult {
            row_count: rows.len(),
            columns,
            rows,
            execution_time_ms: started.elapsed().as_millis() as u64,
            served_from_cache: false,
            served_by: routed.route,
        })
    }
}
