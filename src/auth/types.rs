//! Authentication types

use crate::error::{Error, Result};
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the caller, as decoded by the upstream token validator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub auth_token: String,
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    /// Keystone domain of the user
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
    pub roles: Vec<String>,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

impl AuthContext {
    /// Build from validator headers
    ///
    /// Fails when the token is missing or the validator marked it invalid.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self> {
        if header(headers, "X-Identity-Status").is_some_and(|s| s.eq_ignore_ascii_case("invalid")) {
            return Err(Error::unauthorized("The provided token is not valid"));
        }
        let auth_token = header(headers, "X-Auth-Token")
            .ok_or_else(|| Error::unauthorized("Please provide an authentication token"))?;

        let roles = header(headers, "X-Roles")
            .map(|r| {
                r.split(',')
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            auth_token,
            user_id: header(headers, "X-User-Id"),
            user_name: header(headers, "X-User-Name"),
            project_id: header(headers, "X-Project-Id"),
            project_name: header(headers, "X-Project-Name"),
            tenant_id: header(headers, "X-User-Domain-Id"),
            tenant_name: header(headers, "X-User-Domain-Name"),
            roles,
        })
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

/// Cached token with optional expiration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self { token, expires_at }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self {
            token,
            expires_at: Some(expires_at),
        }
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false,
        }
    }
}
