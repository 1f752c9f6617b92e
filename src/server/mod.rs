//! HTTP surface shared by every gateway
//!
//! The middleware chain, outermost first:
//!
//! 1. CORS (all origins)
//! 2. `TraceLayer`
//! 3. request id (`request-id` header, generated when absent)
//! 4. access log (one event per request on target `access`)
//! 5. `require_auth` on protected routes only
//!
//! Trailing slashes are trimmed before routing, so every route answers
//! with or without one.

mod body;
mod middleware;
mod request;
mod router;

pub use body::{parse_body, parse_json, BodySchema, Field, FieldKind};
pub use middleware::{access_log, request_id, RequestId, REQUEST_ID_HEADER};
pub use request::RequestUri;
pub use router::{build_app, options, protected, serve, App};
