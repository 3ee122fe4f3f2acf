//! Rendered statement

use std::fmt;

use crate::query::{Pagination, Projection};

/// An executable statement. Only the builder constructs one, and every
/// statement it constructs carries the tenant predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    sql: String,
    projection: Projection,
    relations: Vec<String>,
    tenant_id: String,
    pagination: Pagination,
}

impl Statement {
    pub(crate) fn new(
        sql: String,
        projection: Projection,
        relations: Vec<String>,
        tenant_id: String,
        pagination: Pagination,
    ) -> Self {
        Self {
            sql,
            projection,
            relations,
            tenant_id,
            pagination,
        }
    }

    /// Statement text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Top-level projection; drives result column order
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Every named relation the statement reads
    pub fn relations(&self) -> &[String] {
        &self.relations
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn pagination(&self) -> Pagination {
        self.pagination
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}
