//! Authentication stage of the middleware chain

use super::types::AuthContext;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

/// Attach the caller's [`AuthContext`] or reject with 401
pub async fn require_auth(mut request: Request, next: Next) -> Response {
    match AuthContext::from_headers(request.headers()) {
        Ok(ctx) => {
            debug!(user = ?ctx.user_name, tenant = ?ctx.tenant_id, "authenticated");
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
