//! Identity gateway (`/nbi/identity/api`)
//!
//! Fronts Keystone v3: login, token validation, and management of tenants
//! (Keystone domains), their users, and global roles. Every call is made
//! with the caller's own token; policy is enforced before it is forwarded.

mod handlers;
pub mod transform;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::http::{HttpClient, RequestConfig};
use crate::policy::PolicyEnforcer;
use crate::server::{options, protected};
use crate::auth::AuthContext;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;

/// Keystone-backed identity service
#[derive(Debug, Clone)]
pub struct IdentityGateway {
    keystone: HttpClient,
    policy: PolicyEnforcer,
}

impl IdentityGateway {
    pub fn new(keystone: HttpClient, policy: PolicyEnforcer) -> Self {
        Self { keystone, policy }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let keystone = super::backend("Keystone", &config.keystone.url, config.request_timeout())?;
        let policy =
            PolicyEnforcer::new(&config.policy).with_admin_tenant(&config.keystone.admin_tenant);
        Ok(Self::new(keystone, policy))
    }

    /// Forward the caller's token
    fn as_caller(ctx: &AuthContext) -> RequestConfig {
        RequestConfig::new().header("X-Auth-Token", ctx.auth_token.as_str())
    }

    pub fn router(self) -> Router {
        let public = Router::new().route(
            "/login",
            post(handlers::login).options(|| async { options("OPTIONS, POST") }),
        );

        let private = Router::new()
            .route("/token/validate", get(handlers::validate_token))
            .route(
                "/tenants",
                get(handlers::list_tenants)
                    .post(handlers::create_tenant)
                    .options(|| async { options("GET, OPTIONS, POST") }),
            )
            .route(
                "/tenants/:tenant_id",
                get(handlers::get_tenant)
                    .patch(handlers::update_tenant)
                    .delete(handlers::delete_tenant)
                    .options(|| async { options("DELETE, GET, OPTIONS, PATCH") }),
            )
            .route(
                "/tenants/:tenant_id/users",
                get(handlers::list_users)
                    .post(handlers::create_user)
                    .options(|| async { options("GET, OPTIONS, POST") }),
            )
            .route(
                "/tenants/:tenant_id/users/:user_id",
                get(handlers::get_user)
                    .patch(handlers::update_user)
                    .delete(handlers::delete_user)
                    .options(|| async { options("DELETE, GET, OPTIONS, PATCH") }),
            )
            .route(
                "/roles",
                get(handlers::list_roles)
                    .post(handlers::create_role)
                    .options(|| async { options("GET, OPTIONS") }),
            )
            .route(
                "/roles/:role_id",
                get(handlers::get_role)
                    .delete(handlers::delete_role)
                    .options(|| async { options("GET, OPTIONS") }),
            );

        public
            .merge(protected(private))
            .with_state(Arc::new(self))
    }
}

#[cfg(test)]
mod tests;
