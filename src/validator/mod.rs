//! Pre-flight structural validation
//!
//! Runs before the statement builder. Each check maps to its own error kind.
//! Expression fragments are not parsed, only checked to stay inside their
//! clause.
//!
//! # Checks (in order)
//!
//! 1. Tenant identifier present
//! 2. Timeout greater than zero
//! 3. Options limit within `0..=max_limit`, offset non-negative
//! 4. Per query level (recursively through subqueries):
//!    projection, source, joins, own pagination, HAVING needs GROUP BY
//! 5. Per query level: relation, join and ordering names are identifiers;
//!    projection, predicate, group-by and having fragments stay in place

use crate::errors::{EngineError, EngineResult};
use crate::query::{ExecutionOptions, Projection, Query, Source};
use crate::statement::{check_fragment, is_identifier};

/// Default ceiling on a single request's row limit
pub const DEFAULT_MAX_LIMIT: i64 = 10_000;

/// Structural request validator
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_limit: i64,
}

impl Validator {
    pub fn new(max_limit: i64) -> Self {
        Self { max_limit }
    }

    pub fn max_limit(&self) -> i64 {
        self.max_limit
    }

    /// Validates a query together with its execution options.
    pub fn validate(&self, query: &Query, options: &ExecutionOptions) -> EngineResult<()> {
        if !options.caller.has_tenant() {
            return Err(EngineError::missing_tenant());
        }

        if options.timeout_ms == 0 {
            return Err(EngineError::invalid_timeout());
        }

        self.check_limit(options.limit)?;
        Self::check_offset(options.offset)?;

        self.validate_query(query)
    }

    /// Validates one query level and everything nested under it.
    pub fn validate_query(&self, query: &Query) -> EngineResult<()> {
        match &query.projection {
            None => return Err(EngineError::missing_projection("Query has no projection")),
            Some(Projection::Fields(fields)) if fields.is_empty() => {
                return Err(EngineError::missing_projection(
                    "Projection field list is empty",
                ))
            }
            Some(Projection::Fields(fields)) if fields.iter().any(|f| f.trim().is_empty()) => {
                return Err(EngineError::missing_projection(
                    "Projection contains an empty field name",
                ))
            }
            Some(_) => {}
        }

        match &query.source {
            None => return Err(EngineError::missing_source("Query has no source")),
            Some(Source::Relation(name)) if name.trim().is_empty() => {
                return Err(EngineError::missing_source("Source relation name is empty"))
            }
            Some(Source::Relation(_)) => {}
            Some(Source::Subquery(inner)) => self.validate_query(inner)?,
        }

        if let Some(join) = query.joins.iter().find(|j| j.table.trim().is_empty()) {
            return Err(EngineError::missing_source(format!(
                "Join on '{} = {}' has no table",
                join.on.left, join.on.right
            )));
        }

        if let Some(limit) = query.limit {
            self.check_limit(limit)?;
        }
        if let Some(offset) = query.offset {
            Self::check_offset(offset)?;
        }

        if query.having.is_some() && !query.has_group_by() {
            return Err(EngineError::having_without_group_by());
        }

        Self::check_expressions(query)
    }

    /// Rejects caller text that could end the clause it is rendered into.
    fn check_expressions(query: &Query) -> EngineResult<()> {
        if let Some(Source::Relation(name)) = &query.source {
            Self::check_identifier("Relation", name)?;
        }
        for join in &query.joins {
            Self::check_identifier("Join table", &join.table)?;
            Self::check_identifier("Join column", &join.on.left)?;
            Self::check_identifier("Join column", &join.on.right)?;
        }
        if let Some(order) = &query.order_by {
            Self::check_identifier("Ordering field", &order.field)?;
        }

        if let Some(fields) = query.projection.as_ref().and_then(Projection::field_list) {
            for field in fields {
                Self::check_text("Projection field", field)?;
            }
        }
        for field in query.group_by.iter().flatten() {
            Self::check_text("Grouping field", field)?;
        }
        if let Some(predicate) = &query.predicate {
            Self::check_text("Predicate", predicate)?;
        }
        if let Some(having) = &query.having {
            Self::check_text("Having", having)?;
        }
        Ok(())
    }

    fn check_identifier(what: &str, name: &str) -> EngineResult<()> {
        if is_identifier(name) {
            return Ok(());
        }
        Err(EngineError::invalid_expression(format!(
            "{} '{}' is not an identifier",
            what, name
        )))
    }

    fn check_text(what: &str, text: &str) -> EngineResult<()> {
        check_fragment(text).map_err(|e| {
            EngineError::invalid_expression(format!("{} '{}' contains {}", what, text, e))
        })
    }

    fn check_limit(&self, limit: i64) -> EngineResult<()> {
        if limit < 0 {
            return Err(EngineError::invalid_limit(format!(
                "Limit must be >= 0, got {}",
                limit
            )));
        }
        if limit > self.max_limit {
            return Err(EngineError::invalid_limit(format!(
                "Limit {} exceeds maximum {}",
                limit, self.max_limit
            )));
        }
        Ok(())
    }

    fn check_offset(offset: i64) -> EngineResult<()> {
        if offset < 0 {
            return Err(EngineError::invalid_offset(offset));
        }
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LIMIT)
    }
}
