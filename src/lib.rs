// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # SELFNET Northbound Interface
//!
//! HTTP gateways in front of the SELFNET orchestration stack. Five
//! services share one process and one configuration file:
//!
//! - **identity**: login, users, tenants and roles over Keystone, gated by
//!   a role policy
//! - **monitoring**: alarms, flow and VM metrics from Monasca
//! - **autonomous**: symptoms, TALs and intelligence models
//! - **orchestration**: topology snapshots, VM search, LTE equipment and
//!   the service inventory
//! - **catalogue**: app packages
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use selfnet_nbi::config::{load_config, Service};
//! use selfnet_nbi::server::{build_app, serve};
//!
//! #[tokio::main]
//! async fn main() -> selfnet_nbi::Result<()> {
//!     let config = load_config("gateway.yaml")?;
//!     let router = selfnet_nbi::gateway::router(Service::Orchestration, &config).await?;
//!     let app = build_app(vec![(config.server.base_path(Service::Orchestration), router)]);
//!     serve(app, &config.server.host, config.server.port).await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │   request id → access log → trailing slash → caller identity    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬────────────┬──────┴───────┬───────────────┬──────────┐
//! │ Identity │ Monitoring │  Autonomous  │ Orchestration │ Catalogue│
//! └──────────┴────────────┴──────┬───────┴───────────────┴──────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬────────────┬─────────────┐
//! │  Query   │  Cursor   │  Pagination   │ Projection │  Snapshot   │
//! ├──────────┼───────────┼───────────────┼────────────┼─────────────┤
//! │ search_by│ ObjectId  │ limit+1 probe │ filter     │ FK joins    │
//! │ filter   │ Row id    │ offset links  │ identity   │ topology    │
//! │ limit    │           │ link rewrite  │            │ cache       │
//! └──────────┴───────────┴───────────────┴────────────┴─────────────┘
//!                                │
//!              Record sources (DuckDB) · HTTP backends
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types and HTTP error bodies
pub mod error;

/// Common types and type aliases
pub mod types;

/// Gateway configuration
pub mod config;

/// Query-string normalization
pub mod query;

/// Pagination cursors
pub mod cursor;

/// Field projection
pub mod projection;

/// Pagination and link building
pub mod pagination;

/// Declared entity schemas and event strategies
pub mod entity;

/// Database engine via DuckDB
pub mod database;

/// Record sources
pub mod store;

/// Foreign-key joins and the topology snapshot
pub mod snapshot;

/// HTTP client for backend services
pub mod http;

/// Caller identity and token handling
pub mod auth;

/// Role policy
pub mod policy;

/// Middleware chain, extractors and the HTTP server
pub mod server;

/// The northbound services
pub mod gateway;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::{load_config, load_config_from_str, GatewayConfig, Service};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
