//! Security predicate adapter
//!
//! Asks the evaluator about every relation a query touches and translates
//! each answer. Any evaluator error or untranslatable answer fails the whole
//! request; there is no unrestricted fallback.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{EngineError, EngineResult};
use crate::observability::{log_event_with_fields, Event};
use crate::query::CallerContext;

use super::evaluator::AccessEvaluator;
use super::translate::{translate, SecurityPredicate};

/// Resolved security predicates, keyed by relation name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityScope {
    predicates: HashMap<String, SecurityPredicate>,
}

impl SecurityScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope granting unrestricted access to the given relations (tests, dry runs)
    pub fn unrestricted<I, S>(relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut scope = Self::new();
        for relation in relations {
            scope.insert(relation, SecurityPredicate::Unrestricted);
        }
        scope
    }

    pub fn insert(&mut self, relation: impl Into<String>, predicate: SecurityPredicate) {
        self.predicates.insert(relation.into(), predicate);
    }

    /// Returns the predicate for `relation`, or None if it was never resolved
    pub fn get(&self, relation: &str) -> Option<&SecurityPredicate> {
        self.predicates.get(relation)
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Number of relations carrying a row-level restriction
    pub fn restricted_count(&self) -> usize {
        self.predicates.values().filter(|p| p.is_restricted()).count()
    }
}

/// Bridges the access-control evaluator to the statement builder
#[derive(Clone)]
pub struct SecurityPredicateAdapter {
    evaluator: Arc<dyn AccessEvaluator>,
}

impl SecurityPredicateAdapter {
    pub fn new(evaluator: Arc<dyn AccessEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Security predicate for one relation.
    pub async fn predicate_for(
        &self,
        ctx: &CallerContext,
        relation: &str,
    ) -> EngineResult<SecurityPredicate> {
        let decision = self.evaluator.evaluate(ctx, relation).await.map_err(|e| {
            let reason = e.to_string();
            log_event_with_fields(
                Event::PolicyDenied,
                &[("relation", relation), ("reason", reason.as_str())],
            );
            EngineError::policy_unavailable(format!("Relation '{}': {}", relation, e))
        })?;

        translate(&decision).map_err(|e| {
            log_event_with_fields(
                Event::PolicyDenied,
                &[("relation", relation), ("reason", e.message())],
            );
            e
        })
    }

    /// Resolves every relation, stopping at the first failure.
    pub async fn resolve(
        &self,
        ctx: &CallerContext,
        relations: &[String],
    ) -> EngineResult<SecurityScope> {
        let mut scope = SecurityScope::new();
        for relation in relations {
            let predicate = self.predicate_for(ctx, relation).await?;
            scope.insert(relation.clone(), predicate);
        }
        Ok(scope)
    }
}
