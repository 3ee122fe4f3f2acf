//! Statement planning
//!
//! validate → optimize → resolve security → render. Everything up to the
//! point a backend would be called. Used on its own for dry runs.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::errors::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::policy::{AccessEvaluator, SecurityPredicateAdapter};
use crate::query::{ExecutionOptions, Query};
use crate::statement::{NoopOptimizer, QueryOptimizer, Statement, StatementBuilder};
use crate::validator::Validator;

/// Turns a request into an executable statement
pub struct StatementPlanner {
    validator: Validator,
    optimizer: Arc<dyn QueryOptimizer>,
    adapter: SecurityPredicateAdapter,
    builder: StatementBuilder,
    metrics: Arc<MetricsRegistry>,
}

impl StatementPlanner {
    pub fn new(
        validator: Validator,
        builder: StatementBuilder,
        adapter: SecurityPredicateAdapter,
    ) -> Self {
        Self {
            validator,
            optimizer: Arc::new(NoopOptimizer),
            adapter,
            builder,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn from_config(
        config: &EngineConfig,
        evaluator: Arc<dyn AccessEvaluator>,
    ) -> EngineResult<Self> {
        Ok(Self::new(
            Validator::new(config.max_limit),
            StatementBuilder::new(config.tenant_column.clone())?,
            SecurityPredicateAdapter::new(evaluator),
        ))
    }

    pub fn with_optimizer(mut self, optimizer: Arc<dyn QueryOptimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsRegistry>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Structural validation only
    pub fn check(&self, query: &Query, options: &ExecutionOptions) -> EngineResult<()> {
        self.validator.validate(query, options).map_err(|e| {
            self.metrics.increment_queries_rejected();
            log_event_with_fields(
                Event::QueryRejected,
                &[
                    ("code", e.code()),
                    ("reason", e.message()),
                    ("tenant_id", options.caller.tenant_id.as_str()),
                ],
            );
            e
        })
    }

    /// Validates, resolves security and renders the statement.
    pub async fn prepare(
        &self,
        query: &Query,
        options: &ExecutionOptions,
    ) -> EngineResult<Statement> {
        self.check(query, options)?;

        let query = self.optimizer.optimize(query.clone());
        let relations = query.relations();

        let scope = self
            .adapter
            .resolve(&options.caller, &relations)
            .await
            .map_err(|e| self.policy_failure(e))?;

        let statement = self
            .builder
            .build(
                &query,
                &options.caller.tenant_id,
                &scope,
                options.effective_pagination(&query),
            )
            .map_err(|e| {
                if e.kind().is_security() {
                    self.policy_failure(e)
                } else {
                    e
                }
            })?;

        let restricted = scope.restricted_count().to_string();
        log_event_with_fields(
            Event::StatementRendered,
            &[
                ("relations", relations.join(",").as_str()),
                ("restricted", restricted.as_str()),
                ("sql", statement.sql()),
            ],
        );

        Ok(statement)
    }

    fn policy_failure(&self, e: EngineError) -> EngineError {
        self.metrics.increment_policy_failures();
        e
    }
}
