//! Authentication module
//!
//! Two concerns live here:
//!
//! - **Caller identity**: the upstream token validator decodes the caller's
//!   token into `X-*` headers. `require_auth` turns them into an
//!   [`AuthContext`] and rejects requests without a usable identity before
//!   any handler or backend call runs.
//! - **Service tokens**: the monitoring gateway authenticates against
//!   Keystone on its own behalf. [`TokenHolder`] caches that token behind a
//!   single-flight `get()` and an `invalidate()` for backend 401s.

mod holder;
mod middleware;
mod types;

pub use holder::TokenHolder;
pub use middleware::require_auth;
pub use types::{AuthContext, CachedToken};
