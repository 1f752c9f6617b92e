//! Extractors over the incoming request

use crate::query::RawQuery;
use async_trait::async_trait;
use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::header::HOST;
use axum::http::request::Parts;
use std::convert::Infallible;

/// Absolute URI the client used, including the query string
///
/// Pagination links are derived from it so they point back at the
/// gateway, whatever base path the service is mounted under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestUri(pub String);

impl RequestUri {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The URI without its query string
    pub fn path(&self) -> &str {
        self.0.split_once('?').map_or(self.0.as_str(), |(p, _)| p)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestUri {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let uri = parts
            .extensions
            .get::<OriginalUri>()
            .map_or(&parts.uri, |original| &original.0);

        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("http");
        let host = parts
            .headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .or_else(|| uri.authority().map(|a| a.as_str()))
            .unwrap_or("localhost");
        let path_and_query = uri.path_and_query().map_or("/", |p| p.as_str());

        Ok(Self(format!("{scheme}://{host}{path_and_query}")))
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RawQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RawQuery::parse(parts.uri.query()))
    }
}
