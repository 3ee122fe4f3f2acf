//! Caller context
//!
//! Identity used to compute the security predicate. Built per request,
//! never cached and never persisted.

use serde::{Deserialize, Serialize};

/// The action being performed. This engine only reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Read,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
        }
    }
}

/// Caller identity carried with each request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Caller identity
    pub caller_id: String,
    /// Caller role
    pub role: String,
    /// Organizational units the caller may see (None if unscoped)
    #[serde(default)]
    pub org_units: Option<Vec<String>>,
    /// Tenant the request runs in (mandatory)
    pub tenant_id: String,
    #[serde(default)]
    pub action: Action,
}

impl CallerContext {
    /// Create a context for a caller within a tenant
    pub fn new(
        tenant_id: impl Into<String>,
        caller_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            caller_id: caller_id.into(),
            role: role.into(),
            org_units: None,
            tenant_id: tenant_id.into(),
            action: Action::Read,
        }
    }

    /// Restrict the caller to a set of organizational units
    pub fn with_org_units<I, S>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.org_units = Some(units.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if the context names a tenant
    pub fn has_tenant(&self) -> bool {
        !self.tenant_id.trim().is_empty()
    }
}
