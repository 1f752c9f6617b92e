//! Catalogue gateway (`/nbi/catalogue/api`)
//!
//! App packages held by the app catalogue: listing, per-package facets,
//! upload, update, activation and removal.

mod handlers;

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::http::HttpClient;
use crate::server::protected;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// App classes a listing may be narrowed to
pub const APP_CLASSES: &[&str] = &["VNF", "SDN_APP", "SDN_CTRL_APP", "PNF"];

/// Per-package facets readable from the catalogue
pub const PACKAGE_FACETS: &[&str] = &[
    "app-configuration",
    "app-descriptor",
    "app-monitoring",
    "app-info",
    "app-status",
];

/// Package activation actions
pub const PACKAGE_ACTIONS: &[&str] = &["enable", "disable"];

/// Response key of a facet: its name without the `app-` prefix
pub fn facet_key(facet: &str) -> Option<String> {
    let facet = facet.to_ascii_lowercase();
    if !PACKAGE_FACETS.contains(&facet.as_str()) {
        return None;
    }
    facet.strip_prefix("app-").map(str::to_string)
}

/// Whether `class` names a known app class, in any case
pub fn is_app_class(class: &str) -> bool {
    APP_CLASSES.contains(&class.to_ascii_uppercase().as_str())
}

/// App package service
#[derive(Debug, Clone)]
pub struct CatalogueGateway {
    catalogue: HttpClient,
}

impl CatalogueGateway {
    pub fn new(catalogue: HttpClient) -> Self {
        Self { catalogue }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let catalogue = super::backend(
            "APP Catalogue",
            super::required_url("app_catalogue", config.app_catalogue.as_ref())?,
            config.request_timeout(),
        )?;
        Ok(Self::new(catalogue))
    }

    pub fn router(self) -> Router {
        let routes = Router::new()
            .route(
                "/packages",
                get(handlers::list_packages).post(handlers::upload_package),
            )
            .route(
                "/packages/:package_id",
                get(handlers::get_package)
                    .put(handlers::update_package)
                    .delete(handlers::delete_package),
            )
            .route(
                "/packages/:package_id/:facet",
                get(handlers::package_facet).put(handlers::package_action),
            );

        protected(routes).with_state(Arc::new(self))
    }
}
