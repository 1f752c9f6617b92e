//! Request id and access log stages of the middleware chain

use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

pub const REQUEST_ID_HEADER: &str = "request-id";

/// Identifier of the request being served
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Simple unique id (timestamp + sequence)
fn generate_request_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let seq = SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{timestamp:x}-{seq:x}")
}

/// Tag the request with an id and echo it on the response
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(generate_request_id, ToString::to_string);

    request.extensions_mut().insert(RequestId(id.clone()));
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// One access line per request
pub async fn access_log(request: Request, next: Next) -> Response {
    let id = request
        .extensions()
        .get::<RequestId>()
        .map(|r| r.0.clone())
        .unwrap_or_default();
    let method = request.method().clone();
    let uri = request
        .uri()
        .path_and_query()
        .map_or_else(|| request.uri().path().to_string(), ToString::to_string);

    let response = next.run(request).await;

    info!(
        target: "access",
        "ID: {} | VERB: {} | URI: {} | RESP: {}",
        id,
        method,
        uri,
        response.status().as_u16()
    );
    response
}
