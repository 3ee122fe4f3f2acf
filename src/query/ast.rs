//! Query AST structures
//!
//! The structural representation every other stage operates on. Sources
//! nest: a subquery is rendered exactly like a top-level query.

use serde::{Deserialize, Serialize};

/// Column selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    /// `*`, column order decided by the backend
    Wildcard,
    /// Ordered field list; output columns follow this order
    Fields(Vec<String>),
}

impl Projection {
    /// Creates a field-list projection
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Projection::Fields(fields.into_iter().map(Into::into).collect())
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Projection::Wildcard)
    }

    /// Returns the explicit field list, or None for a wildcard
    pub fn field_list(&self) -> Option<&[String]> {
        match self {
            Projection::Wildcard => None,
            Projection::Fields(fields) => Some(fields),
        }
    }
}

/// Where rows come from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// A named relation
    Relation(String),
    /// A nested query
    Subquery(Box<Query>),
}

impl Source {
    /// Returns the relation name if this is a named relation
    pub fn relation(&self) -> Option<&str> {
        match self {
            Source::Relation(name) => Some(name),
            Source::Subquery(_) => None,
        }
    }
}

/// Join kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
            JoinKind::Full => "FULL JOIN",
        }
    }
}

/// Equality pair for a join condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOn {
    pub left: String,
    pub right: String,
}

/// A single join, applied in list order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub on: JoinOn,
}

impl Join {
    pub fn new(
        kind: JoinKind,
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            table: table.into(),
            on: JoinOn {
                left: left.into(),
                right: right.into(),
            },
        }
    }

    pub fn inner(
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::new(JoinKind::Inner, table, left, right)
    }

    pub fn left(
        table: impl Into<String>,
        left: impl Into<String>,
        right: impl Into<String>,
    ) -> Self {
        Self::new(JoinKind::Left, table, left, right)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Ordering expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// A caller's query request
///
/// `projection` and `source` are optional so that decoded requests missing
/// them reach the validator instead of failing to decode.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub projection: Option<Projection>,
    #[serde(default)]
    pub source: Option<Source>,
    /// Opaque caller expression, never a security boundary
    #[serde(default)]
    pub predicate: Option<String>,
    #[serde(default)]
    pub group_by: Option<Vec<String>>,
    #[serde(default)]
    pub having: Option<String>,
    #[serde(default)]
    pub order_by: Option<OrderBy>,
    #[serde(default)]
    pub joins: Vec<Join>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: Option<i64>,
}

impl Query {
    /// Creates a query selecting `projection` from a named relation
    pub fn select(projection: Projection, relation: impl Into<String>) -> Self {
        Self {
            projection: Some(projection),
            source: Some(Source::Relation(relation.into())),
            ..Self::default()
        }
    }

    /// Creates a query selecting `projection` from a nested query
    pub fn from_subquery(projection: Projection, inner: Query) -> Self {
        Self {
            projection: Some(projection),
            source: Some(Source::Subquery(Box::new(inner))),
            ..Self::default()
        }
    }

    pub fn with_predicate(mut self, predicate: impl Into<String>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn having(mut self, expr: impl Into<String>) -> Self {
        self.having = Some(expr.into());
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by = Some(order);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if a non-empty GROUP BY list is present
    pub fn has_group_by(&self) -> bool {
        self.group_by.as_ref().is_some_and(|g| !g.is_empty())
    }

    /// Nesting depth: 1 for a query over a named relation
    pub fn depth(&self) -> usize {
        match &self.source {
            Some(Source::Subquery(inner)) => 1 + inner.depth(),
            _ => 1,
        }
    }

    /// Every named relation this query reads, first-seen order, no duplicates.
    ///
    /// Includes base relations at every nesting depth and all joined tables.
    pub fn relations(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_relations(&mut out);
        out
    }

    fn collect_relations(&self, out: &mut Vec<String>) {
        match &self.source {
            Some(Source::Relation(name)) => push_unique(out, name),
            Some(Source::Subquery(inner)) => inner.collect_relations(out),
            None => {}
        }
        for join in &self.joins {
            push_unique(out, &join.table);
        }
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}
