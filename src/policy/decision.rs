//! Access decisions as produced by an access-control evaluator
//!
//! The tree may carry node kinds the translator does not support; those are
//! kept (not dropped at decode time) so translation can refuse them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of evaluating a caller against a relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "tree", rename_all = "snake_case")]
pub enum AccessDecision {
    /// Caller may read every row of the relation (within the tenant)
    Unrestricted,
    /// Caller may read rows matching the tree
    Restricted(DecisionNode),
}

/// A node of the decision tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecisionNode {
    /// Logical OR over children
    AnyOf { children: Vec<DecisionNode> },
    /// Logical AND over children
    AllOf { children: Vec<DecisionNode> },
    /// `field = value`
    FieldEquals { field: String, value: Value },
    /// `field IN (values…)`
    FieldIn { field: String, values: Vec<Value> },
    /// Ordered comparison; not translatable
    Compare {
        field: String,
        op: String,
        value: Value,
    },
    /// Negation; not translatable
    Not { child: Box<DecisionNode> },
    /// Any kind this crate does not know
    #[serde(other)]
    Unknown,
}

impl DecisionNode {
    pub fn any_of(children: Vec<DecisionNode>) -> Self {
        DecisionNode::AnyOf { children }
    }

    pub fn all_of(children: Vec<DecisionNode>) -> Self {
        DecisionNode::AllOf { children }
    }

    pub fn field_equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
        DecisionNode::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn field_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        DecisionNode::FieldIn {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the node kind name
    pub fn kind(&self) -> &'static str {
        match self {
            DecisionNode::AnyOf { .. } => "any_of",
            DecisionNode::AllOf { .. } => "all_of",
            DecisionNode::FieldEquals { .. } => "field_equals",
            DecisionNode::FieldIn { .. } => "field_in",
            DecisionNode::Compare { .. } => "compare",
            DecisionNode::Not { .. } => "not",
            DecisionNode::Unknown => "unknown",
        }
    }
}
