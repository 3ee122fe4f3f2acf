//! Decision tree → predicate translation
//!
//! Translation, not policy. Anything the translator cannot express is a
//! hard error: dropping a restriction would widen access.

use crate::errors::{EngineError, EngineResult};
use crate::statement::literal::{is_identifier, qualify, SqlLiteral};

use super::decision::{AccessDecision, DecisionNode};

/// A translated restriction with every literal already escaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateExpr {
    Or(Vec<PredicateExpr>),
    And(Vec<PredicateExpr>),
    Eq { field: String, value: SqlLiteral },
    In { field: String, values: Vec<SqlLiteral> },
}

impl PredicateExpr {
    /// Renders the expression, qualifying bare field names with `qualifier`
    pub fn render(&self, qualifier: Option<&str>) -> String {
        match self {
            PredicateExpr::Or(children) => Self::render_group(children, " OR ", qualifier),
            PredicateExpr::And(children) => Self::render_group(children, " AND ", qualifier),
            PredicateExpr::Eq { field, value } => {
                format!("{} = {}", qualify(field, qualifier), value)
            }
            PredicateExpr::In { field, values } => {
                let list: Vec<&str> = values.iter().map(SqlLiteral::as_sql).collect();
                format!("{} IN ({})", qualify(field, qualifier), list.join(", "))
            }
        }
    }

    fn render_group(children: &[PredicateExpr], joiner: &str, qualifier: Option<&str>) -> String {
        let parts: Vec<String> = children.iter().map(|c| c.render(qualifier)).collect();
        format!("({})", parts.join(joiner))
    }
}

/// Security restriction for one relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecurityPredicate {
    /// No row-level restriction beyond tenant isolation
    Unrestricted,
    Restricted(PredicateExpr),
}

impl SecurityPredicate {
    /// Renders the restriction, or None when unrestricted
    pub fn render(&self, qualifier: Option<&str>) -> Option<String> {
        match self {
            SecurityPredicate::Unrestricted => None,
            SecurityPredicate::Restricted(expr) => Some(expr.render(qualifier)),
        }
    }

    pub fn is_restricted(&self) -> bool {
        matches!(self, SecurityPredicate::Restricted(_))
    }
}

/// Translates an evaluator decision into a security predicate.
pub fn translate(decision: &AccessDecision) -> EngineResult<SecurityPredicate> {
    match decision {
        AccessDecision::Unrestricted => Ok(SecurityPredicate::Unrestricted),
        AccessDecision::Restricted(node) => Ok(SecurityPredicate::Restricted(translate_node(node)?)),
    }
}

fn translate_node(node: &DecisionNode) -> EngineResult<PredicateExpr> {
    match node {
        DecisionNode::AnyOf { children } => Ok(PredicateExpr::Or(translate_children(node, children)?)),
        DecisionNode::AllOf { children } => Ok(PredicateExpr::And(translate_children(node, children)?)),
        DecisionNode::FieldEquals { field, value } => Ok(PredicateExpr::Eq {
            field: checked_field(field)?,
            value: literal(field, value)?,
        }),
        DecisionNode::FieldIn { field, values } => {
            if values.is_empty() {
                return Err(EngineError::unsupported_policy_shape(format!(
                    "Empty set for field '{}'",
                    field
                )));
            }
            let values = values
                .iter()
                .map(|v| literal(field, v))
                .collect::<EngineResult<Vec<_>>>()?;
            Ok(PredicateExpr::In {
                field: checked_field(field)?,
                values,
            })
        }
        other => Err(EngineError::unsupported_policy_shape(format!(
            "Decision node kind '{}' is not supported",
            other.kind()
        ))),
    }
}

fn translate_children(
    parent: &DecisionNode,
    children: &[DecisionNode],
) -> EngineResult<Vec<PredicateExpr>> {
    if children.is_empty() {
        return Err(EngineError::unsupported_policy_shape(format!(
            "Empty '{}' node",
            parent.kind()
        )));
    }
    children.iter().map(translate_node).collect()
}

fn checked_field(field: &str) -> EngineResult<String> {
    if !is_identifier(field) {
        return Err(EngineError::unsupported_policy_shape(format!(
            "Field name '{}' is not an identifier",
            field
        )));
    }
    Ok(field.to_string())
}

fn literal(field: &str, value: &serde_json::Value) -> EngineResult<SqlLiteral> {
    SqlLiteral::from_json(value).map_err(|e| {
        EngineError::unsupported_policy_shape(format!("Value for field '{}': {}", field, e))
    })
}
