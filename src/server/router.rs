//! Router assembly and serving

use super::middleware::{access_log, request_id};
use crate::auth::require_auth;
use crate::error::{Error, Result};
use axum::extract::{Request, State};
use axum::http::header::{ACCESS_CONTROL_REQUEST_METHOD, ALLOW};
use axum::http::{Method, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower::{Layer, ServiceExt};
use tower_http::cors::{Any, Cors, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// A fully layered application
pub type App = NormalizePath<Router>;

/// Require an authenticated caller on every route of `router`
///
/// Applied as a route layer so unknown paths still answer 404.
pub fn protected<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(from_fn(require_auth))
}

/// `204 No Content` advertising the allowed methods
pub fn options(allow: &'static str) -> Response {
    (StatusCode::NO_CONTENT, [(ALLOW, allow)]).into_response()
}

async fn fallback() -> Error {
    Error::not_found("Resource")
}

/// Mount service routers under their base paths and wrap the chain
pub fn build_app(mounts: Vec<(String, Router)>) -> App {
    let mut app = Router::new();
    for (base_path, router) in mounts {
        let base_path = base_path.trim_end_matches('/');
        info!(base_path, "mounting service");
        app = if base_path.is_empty() {
            app.merge(router)
        } else {
            app.nest(base_path, router)
        };
    }

    let app = app
        .fallback(fallback)
        .layer(from_fn(access_log))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .layer(app.clone());
    let app = Router::new().fallback_service(from_fn_with_state(cors, cors_unless_options).layer(app));

    NormalizePathLayer::trim_trailing_slash().layer(app)
}

/// Send every request through CORS except plain `OPTIONS`
///
/// `CorsLayer` answers any `OPTIONS` itself, so only real preflights (those
/// carrying `Access-Control-Request-Method`) may reach it; the rest go to
/// the route's own `OPTIONS` handler.
async fn cors_unless_options(State(cors): State<Cors<Router>>, request: Request, next: Next) -> Response {
    let preflight = request.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD);
    if request.method() == Method::OPTIONS && !preflight {
        return next.run(request).await;
    }
    match cors.oneshot(request).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

/// Serve until the process is stopped
pub async fn serve(app: App, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(
        listener,
        axum::ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .await
    .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}
