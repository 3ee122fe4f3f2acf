//! Statement builder
//!
//! Renders a query, its resolved security scope and the tenant predicate
//! into one statement. Pure and deterministic: same inputs, same text.
//!
//! Restriction composition (fixed, not caller-controllable):
//!
//! ```text
//! <tenant_col> = <tenant> AND <security> AND (<caller predicate>)
//! ```
//!
//! The tenant predicate comes first and has no code path that omits it.
//! Joined relations carry their own tenant and security predicates in their
//! ON clause. Nested sources are rendered by the same routine.

use crate::errors::{EngineError, EngineResult, ErrorKind};
use crate::policy::{SecurityPredicate, SecurityScope};
use crate::query::{Join, Pagination, Projection, Query, Source};

use super::literal::{is_aggregate, is_identifier, qualify, SqlLiteral};
use super::statement::Statement;

pub const DEFAULT_TENANT_COLUMN: &str = "tenant_id";

/// Renders queries into tenant-restricted statements
#[derive(Debug, Clone)]
pub struct StatementBuilder {
    tenant_column: String,
}

/// Per-level rendering inputs shared by the whole tree
struct RenderCtx<'a> {
    tenant: &'a SqlLiteral,
    scope: &'a SecurityScope,
}

impl StatementBuilder {
    /// Creates a builder restricting on `tenant_column`
    pub fn new(tenant_column: impl Into<String>) -> EngineResult<Self> {
        let tenant_column = tenant_column.into();
        if !is_identifier(&tenant_column) || tenant_column.contains('.') {
            return Err(EngineError::new(
                ErrorKind::MissingTenant,
                format!("Tenant column '{}' is not a plain identifier", tenant_column),
            ));
        }
        Ok(Self { tenant_column })
    }

    pub fn tenant_column(&self) -> &str {
        &self.tenant_column
    }

    /// Builds the executable statement for a top-level query.
    pub fn build(
        &self,
        query: &Query,
        tenant_id: &str,
        scope: &SecurityScope,
        pagination: Pagination,
    ) -> EngineResult<Statement> {
        if tenant_id.trim().is_empty() {
            return Err(EngineError::missing_tenant());
        }
        let tenant = SqlLiteral::string(tenant_id)
            .map_err(|e| EngineError::new(ErrorKind::MissingTenant, e.to_string()))?;
        let ctx = RenderCtx {
            tenant: &tenant,
            scope,
        };

        let sql = self.render_level(query, &ctx, 1, Some(pagination))?;
        let projection = query
            .projection
            .clone()
            .ok_or_else(|| EngineError::missing_projection("Query has no projection"))?;

        Ok(Statement::new(
            sql,
            projection,
            query.relations(),
            tenant_id.to_string(),
            pagination,
        ))
    }

    /// Renders one query level. `pagination` is Some only at top level.
    fn render_level(
        &self,
        query: &Query,
        ctx: &RenderCtx<'_>,
        depth: usize,
        pagination: Option<Pagination>,
    ) -> EngineResult<String> {
        let projection = query
            .projection
            .as_ref()
            .ok_or_else(|| EngineError::missing_projection("Query has no projection"))?;
        let source = query
            .source
            .as_ref()
            .ok_or_else(|| EngineError::missing_source("Query has no source"))?;

        if query.having.is_some() && !query.has_group_by() {
            return Err(EngineError::having_without_group_by());
        }

        // 2. Source, plus the name its predicates are qualified with
        let (from, qualifier) = match source {
            Source::Relation(name) => (name.clone(), name.clone()),
            Source::Subquery(inner) => {
                let alias = format!("q{}", depth);
                let inner_sql = self.render_level(inner, ctx, depth + 1, None)?;
                (format!("({}) AS {}", inner_sql, alias), alias)
            }
        };
        let qualified = !query.joins.is_empty();
        let own_qualifier = qualified.then_some(qualifier.as_str());

        // 1. Projection; nested levels must expose the tenant column upward
        let nested = depth > 1;
        let mut group_by = query.group_by.clone().unwrap_or_default();
        let select = match projection {
            Projection::Wildcard => "*".to_string(),
            Projection::Fields(fields) => {
                let mut fields = fields.clone();
                if nested && !self.exposes_tenant(&fields) {
                    let column = qualify(&self.tenant_column, own_qualifier);
                    if !group_by.is_empty() {
                        group_by.push(column.clone());
                        fields.push(column);
                    } else if fields.iter().any(|f| is_aggregate(f)) {
                        // Ungrouped aggregate: one row, already tenant-filtered
                        fields.push(format!("{} AS {}", ctx.tenant, self.tenant_column));
                    } else {
                        fields.push(column);
                    }
                }
                fields.join(", ")
            }
        };

        // 3. Restriction
        let mut restriction = vec![format!(
            "{} = {}",
            qualify(&self.tenant_column, own_qualifier),
            ctx.tenant
        )];
        if let Source::Relation(name) = source {
            if let Some(security) = Self::security_for(ctx.scope, name)?.render(own_qualifier) {
                restriction.push(security);
            }
        }
        if let Some(predicate) = &query.predicate {
            restriction.push(format!("({})", predicate));
        }

        let mut sql = format!("SELECT {} FROM {}", select, from);

        // 4. Joins, in list order
        for join in &query.joins {
            sql.push(' ');
            sql.push_str(&self.render_join(join, ctx)?);
        }

        sql.push_str(" WHERE ");
        sql.push_str(&restriction.join(" AND "));

        // 5-6. Grouping
        if !group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&group_by.join(", "));
            if let Some(having) = &query.having {
                sql.push_str(" HAVING ");
                sql.push_str(having);
            }
        }

        // 7. Ordering
        if let Some(order) = &query.order_by {
            sql.push_str(&format!(" ORDER BY {} {}", order.field, order.direction.as_sql()));
        }

        // 8. Pagination
        match pagination {
            Some(p) => sql.push_str(&format!(" LIMIT {} OFFSET {}", p.limit, p.offset)),
            None => {
                if let Some(limit) = query.limit {
                    if limit < 0 {
                        return Err(EngineError::invalid_limit(format!(
                            "Limit must be >= 0, got {}",
                            limit
                        )));
                    }
                    sql.push_str(&format!(" LIMIT {}", limit));
                }
                if let Some(offset) = query.offset {
                    if offset < 0 {
                        return Err(EngineError::invalid_offset(offset));
                    }
                    sql.push_str(&format!(" OFFSET {}", offset));
                }
            }
        }

        Ok(sql)
    }

    fn render_join(&self, join: &Join, ctx: &RenderCtx<'_>) -> EngineResult<String> {
        let mut on = vec![
            format!("{} = {}", join.on.left, join.on.right),
            format!("{}.{} = {}", join.table, self.tenant_column, ctx.tenant),
        ];
        if let Some(security) = Self::security_for(ctx.scope, &join.table)?.render(Some(&join.table)) {
            on.push(security);
        }
        Ok(format!(
            "{} {} ON {}",
            join.kind.as_sql(),
            join.table,
            on.join(" AND ")
        ))
    }

    fn security_for<'s>(
        scope: &'s SecurityScope,
        relation: &str,
    ) -> EngineResult<&'s SecurityPredicate> {
        scope.get(relation).ok_or_else(|| {
            EngineError::policy_unavailable(format!(
                "No access decision resolved for relation '{}'",
                relation
            ))
        })
    }

    fn exposes_tenant(&self, fields: &[String]) -> bool {
        fields.iter().any(|f| {
            f == &self.tenant_column
                || f.rsplit_once('.').is_some_and(|(_, col)| col == self.tenant_column)
        })
    }
}

impl Default for StatementBuilder {
    fn default() -> Self {
        Self {
            tenant_column: DEFAULT_TENANT_COLUMN.to_string(),
        }
    }
}
