//! Access-control evaluator contract and the built-in rule evaluator
//!
//! The evaluator decides policy; this crate only translates its answer.
//! `RuleEvaluator` covers the common row policies (ownership, org-unit
//! scope) from configuration. Deployments with a policy service implement
//! [`AccessEvaluator`] themselves.

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::query::CallerContext;

use super::decision::{AccessDecision, DecisionNode};

/// Errors raised by an evaluator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Policy store or policy service could not be reached
    #[error("Policy source unavailable: {0}")]
    Unavailable(String),

    /// Policy depends on an org-unit scope the caller does not carry
    #[error("Caller has no organizational-unit scope for relation '{0}'")]
    MissingScope(String),

    /// Policy configuration cannot be evaluated
    #[error("Invalid row policy: {0}")]
    InvalidPolicy(String),
}

/// Boxed future returned by [`AccessEvaluator::evaluate`]
pub type EvaluationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<AccessDecision, PolicyError>> + Send + 'a>>;

/// External access-control evaluator
pub trait AccessEvaluator: Send + Sync {
    /// Decide what `ctx` may read from `relation`
    fn evaluate<'a>(&'a self, ctx: &'a CallerContext, relation: &'a str) -> EvaluationFuture<'a>;
}

/// Row policy for a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RowPolicy {
    /// Every row in the tenant is visible
    None,

    /// Rows owned by the caller
    Ownership { owner_field: String },

    /// Rows belonging to one of the caller's org units
    OrgUnit { unit_field: String },

    /// Rows owned by the caller or in one of the caller's org units
    OwnershipOrOrgUnit {
        owner_field: String,
        unit_field: String,
    },
}

impl Default for RowPolicy {
    fn default() -> Self {
        Self::Ownership {
            owner_field: "owner_id".to_string(),
        }
    }
}

/// Rule set for [`RuleEvaluator`]
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Roles that read every row of their tenant
    #[serde(default)]
    pub privileged_roles: Vec<String>,

    /// Policy for relations without an explicit entry
    #[serde(default)]
    pub default_policy: RowPolicy,

    /// Policies per relation
    #[serde(default)]
    pub relations: HashMap<String, RowPolicy>,
}

/// Configurable evaluator over [`RowPolicy`] rules
#[derive(Debug, Clone, Default)]
pub struct RuleEvaluator {
    privileged_roles: BTreeSet<String>,
    default_policy: RowPolicy,
    policies: HashMap<String, RowPolicy>,
}

impl RuleEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            privileged_roles: config.privileged_roles.iter().cloned().collect(),
            default_policy: config.default_policy.clone(),
            policies: config.relations.clone(),
        }
    }

    pub fn with_policy(mut self, relation: &str, policy: RowPolicy) -> Self {
        self.policies.insert(relation.to_string(), policy);
        self
    }

    pub fn with_default_policy(mut self, policy: RowPolicy) -> Self {
        self.default_policy = policy;
        self
    }

    pub fn with_privileged_role(mut self, role: &str) -> Self {
        self.privileged_roles.insert(role.to_string());
        self
    }

    fn policy_for(&self, relation: &str) -> &RowPolicy {
        self.policies.get(relation).unwrap_or(&self.default_policy)
    }

    /// Synchronous decision, shared by the async trait method
    pub fn decide(&self, ctx: &CallerContext, relation: &str) -> Result<AccessDecision, PolicyError> {
        if self.privileged_roles.contains(&ctx.role) {
            return Ok(AccessDecision::Unrestricted);
        }

        let owner = |field: &str| -> Result<DecisionNode, PolicyError> {
            if ctx.caller_id.is_empty() {
                return Err(PolicyError::InvalidPolicy(format!(
                    "Ownership policy on '{}' needs a caller identity",
                    relation
                )));
            }
            Ok(DecisionNode::field_equals(field, ctx.caller_id.clone()))
        };
        // An empty unit list scopes the caller to nothing, same as no list
        let scope = ctx.org_units.as_ref().filter(|units| !units.is_empty());
        let units = |field: &str| -> Result<DecisionNode, PolicyError> {
            match scope {
                Some(units) => Ok(DecisionNode::field_in(field, units.iter().cloned())),
                None => Err(PolicyError::MissingScope(relation.to_string())),
            }
        };

        match self.policy_for(relation) {
            RowPolicy::None => Ok(AccessDecision::Unrestricted),
            RowPolicy::Ownership { owner_field } => {
                Ok(AccessDecision::Restricted(owner(owner_field)?))
            }
            RowPolicy::OrgUnit { unit_field } => Ok(AccessDecision::Restricted(units(unit_field)?)),
            RowPolicy::OwnershipOrOrgUnit {
                owner_field,
                unit_field,
            } => {
                let mut children = vec![owner(owner_field)?];
                // An unscoped caller still sees their own rows
                if scope.is_some() {
                    children.push(units(unit_field)?);
                }
                Ok(AccessDecision::Restricted(DecisionNode::any_of(children)))
            }
        }
    }
}

impl AccessEvaluator for RuleEvaluator {
    fn evaluate<'a>(&'a self, ctx: &'a CallerContext, relation: &'a str) -> EvaluationFuture<'a> {
        Box::pin(async move { self.decide(ctx, relation) })
    }
}
