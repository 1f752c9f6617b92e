//! Keystone service-token holder

use super::types::CachedToken;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const SUBJECT_TOKEN: &str = "X-Subject-Token";

/// Lazily obtained Keystone token shared by every request
///
/// `get` holds the lock across a refresh, so concurrent callers wait for
/// the one in-flight request and then see the new token.
pub struct TokenHolder {
    keystone: HttpClient,
    auth: Value,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenHolder {
    /// `keystone` is based at the identity endpoint; `auth` is the body
    /// posted to `auth/tokens`
    pub fn new(keystone: HttpClient, auth: Value) -> Self {
        Self {
            keystone,
            auth,
            cached: Mutex::new(None),
        }
    }

    /// Current token, obtaining a new one when absent or expired
    pub async fn get(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| !t.is_expired()) {
            return Ok(token.token.clone());
        }

        let token = self.fetch_new_token().await?;
        let value = token.token.clone();
        *cached = Some(token);
        Ok(value)
    }

    /// Drop the cached token; the next `get` authenticates again
    pub async fn invalidate(&self) {
        let mut cached = self.cached.lock().await;
        if cached.take().is_some() {
            info!("service token invalidated");
        }
    }

    async fn fetch_new_token(&self) -> Result<CachedToken> {
        debug!("requesting service token");
        let response = self
            .keystone
            .probe(
                Method::POST,
                "auth/tokens",
                RequestConfig::new().json(self.auth.clone()),
            )
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "service authentication rejected");
            return Err(Error::Other(format!(
                "cannot obtain service token: status {status} and message {body}"
            )));
        }

        let token = response
            .headers()
            .get(SUBJECT_TOKEN)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
            .ok_or_else(|| Error::Other(format!("Keystone response lacks {SUBJECT_TOKEN}")))?;

        let body: Value = response.json().await.unwrap_or(Value::Null);
        let expires_at = body
            .pointer("/token/expires_at")
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        info!(expires_at = ?expires_at, "service token obtained");
        Ok(CachedToken::new(token, expires_at))
    }
}

impl std::fmt::Debug for TokenHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenHolder")
            .field("keystone", &self.keystone)
            .finish_non_exhaustive()
    }
}
