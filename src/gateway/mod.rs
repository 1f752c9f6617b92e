//! The five northbound services
//!
//! Each service owns its backends and exposes an axum [`Router`] that the
//! server mounts under the service's base path.

pub mod autonomous;
pub mod catalogue;
pub mod identity;
pub mod monitoring;
pub mod orchestration;

use crate::config::{DatabaseConfig, GatewayConfig, Service};
use crate::database::DatabaseEngine;
use crate::entity::EntitySchema;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig};
use crate::store::SqlRecordSource;
use crate::types::StringMap;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Build the router of one service from configuration
pub async fn router(service: Service, config: &GatewayConfig) -> Result<Router> {
    let router = match service {
        Service::Identity => identity::IdentityGateway::from_config(config)?.router(),
        Service::Monitoring => monitoring::MonitoringGateway::from_config(config)?.router(),
        Service::Autonomous => autonomous::AutonomousGateway::from_config(config).await?.router(),
        Service::Orchestration => {
            orchestration::OrchestrationGateway::from_config(config).await?.router()
        }
        Service::Catalogue => catalogue::CatalogueGateway::from_config(config)?.router(),
    };
    Ok(router)
}

/// Attach a configured database and bind the entities read from it
///
/// This is the one-time schema-load step: a table that lacks a declared
/// column fails here, before any request is served.
pub async fn attach(
    config: &DatabaseConfig,
    schemas: &[&'static EntitySchema],
) -> Result<Arc<SqlRecordSource>> {
    let connection = config.connection_string()?;
    let kind = config.kind;
    let schema = config.schema.clone();
    let tables = config.tables.clone();
    let schemas = schemas.to_vec();
    let entities = schemas.len();

    let source = tokio::task::spawn_blocking(move || {
        let engine = DatabaseEngine::open(kind, &connection, schema)?;
        SqlRecordSource::bind(Arc::new(engine), &schemas, &tables)
    })
    .await
    .map_err(|e| Error::database(format!("attach task failed: {e}")))??;

    info!(kind = ?kind, entities, "database attached");
    Ok(Arc::new(source))
}

/// Client for one backend service
pub(crate) fn backend(service: &str, url: &str, timeout: Duration) -> Result<HttpClient> {
    HttpClient::with_config(
        HttpClientConfig::builder()
            .service(service)
            .base_url(url)
            .timeout(timeout)
            .build(),
    )
}

/// A configured backend URL, or a config error naming the key
pub(crate) fn required_url<'a>(field: &str, value: Option<&'a String>) -> Result<&'a str> {
    value
        .map(String::as_str)
        .ok_or_else(|| Error::invalid_config(field, "must be set to serve this service"))
}

/// Policy target from path parameters
pub(crate) fn target(pairs: &[(&str, &str)]) -> StringMap {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}
