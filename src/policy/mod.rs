//! Role-based policy enforcement
//!
//! A rule is named `"<scope>:<action>"` and lists the roles allowed to
//! perform it. Two pseudo-roles exist:
//!
//! - `*`: any authenticated caller
//! - `tenant_admin`: a caller with the `admin` role acting on their own
//!   tenant, i.e. `target["tenant_id"]` equals the caller's tenant, or an
//!   `admin` of the configured admin tenant acting on any tenant
//!
//! Actions without a rule fall back to the default rule.

use crate::auth::AuthContext;
use crate::config::PolicyConfig;
use crate::error::{Error, Result};
use crate::types::StringMap;
use std::collections::HashMap;
use tracing::{debug, warn};

const ANY: &str = "*";
const TENANT_ADMIN: &str = "tenant_admin";
const ADMIN: &str = "admin";

/// Evaluates policy rules against a caller
#[derive(Debug, Clone)]
pub struct PolicyEnforcer {
    default_rule: Vec<String>,
    rules: HashMap<String, Vec<String>>,
    admin_tenant: Option<String>,
}

impl PolicyEnforcer {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            default_rule: config.default.clone(),
            rules: config.rules.clone(),
            admin_tenant: None,
        }
    }

    /// Tenant whose admins manage every tenant
    #[must_use]
    pub fn with_admin_tenant(mut self, tenant: impl Into<String>) -> Self {
        self.admin_tenant = Some(tenant.into());
        self
    }

    fn is_tenant_admin(&self, ctx: &AuthContext, target: &StringMap) -> bool {
        let Some(tenant) = ctx.tenant_id.as_ref() else {
            return false;
        };
        ctx.has_role(ADMIN)
            && (self.admin_tenant.as_ref() == Some(tenant) || target.get("tenant_id") == Some(tenant))
    }

    fn rule(&self, name: &str) -> &[String] {
        self.rules
            .get(name)
            .map_or(self.default_rule.as_slice(), Vec::as_slice)
    }

    /// Whether `ctx` may perform `action` in `scope` on `target`
    pub fn allows(&self, ctx: &AuthContext, scope: &str, action: &str, target: &StringMap) -> bool {
        let name = format!("{scope}:{action}");
        self.rule(&name).iter().any(|role| match role.as_str() {
            ANY => true,
            TENANT_ADMIN => self.is_tenant_admin(ctx, target),
            role => ctx.has_role(role),
        })
    }

    /// Fail with 403 unless allowed
    pub fn enforce(&self, ctx: &AuthContext, scope: &str, action: &str, target: &StringMap) -> Result<()> {
        if self.allows(ctx, scope, action, target) {
            debug!(scope, action, "policy allowed");
            Ok(())
        } else {
            warn!(scope, action, user = ?ctx.user_name, "policy denied");
            Err(Error::Forbidden)
        }
    }
}
