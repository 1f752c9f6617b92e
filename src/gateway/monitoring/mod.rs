//! Monitoring gateway (`/nbi/monitoring/api`)
//!
//! Reshapes Monasca alarms, flows, metrics and measurements. Monasca is
//! called with the gateway's own service token, not the caller's; Monasca
//! keeps its own pagination and the gateway only rewrites its links.

mod handlers;
pub mod transform;

use crate::auth::TokenHolder;
use crate::config::GatewayConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClient, RequestConfig};
use crate::query::{parse_limit, LimitPolicy};
use crate::server::protected;
use crate::types::{JsonValue, QueryPairs};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tracing::warn;

/// Monasca-backed monitoring service
#[derive(Debug, Clone)]
pub struct MonitoringGateway {
    monasca: HttpClient,
    tokens: Arc<TokenHolder>,
}

impl MonitoringGateway {
    pub fn new(monasca: HttpClient, tokens: Arc<TokenHolder>) -> Self {
        Self { monasca, tokens }
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let timeout = config.monasca.timeout(config.request_timeout());
        let monasca = super::backend("Monasca", &config.monasca.url, timeout)?;
        let keystone = super::backend("Keystone", &config.monasca.keystone, timeout)?;
        let tokens = TokenHolder::new(keystone, config.monasca.auth.clone());
        Ok(Self::new(monasca, Arc::new(tokens)))
    }

    /// GET a Monasca endpoint with the service token
    ///
    /// A client `limit` is checked before Monasca or Keystone is called.
    /// A 401 from Monasca means the cached token went stale; it is dropped
    /// so the next request authenticates again.
    async fn fetch(&self, endpoint: &str, query: QueryPairs) -> Result<JsonValue> {
        if let Some((_, limit)) = query.iter().find(|(key, _)| key == "limit") {
            parse_limit(Some(limit.as_str()), LimitPolicy::MONASCA)?;
        }
        let token = self.tokens.get().await?;
        let config = RequestConfig::new()
            .header("X-Auth-Token", token)
            .query_pairs(query);

        match self.monasca.get_json(endpoint, config).await {
            Err(err @ Error::Unauthorized { .. }) => {
                warn!(endpoint, "Monasca rejected the service token");
                self.tokens.invalidate().await;
                Err(err)
            }
            other => other,
        }
    }

    pub fn router(self) -> Router {
        let routes = Router::new()
            .route("/alarms", get(handlers::list_alarms))
            .route("/alarms/:alarm_id", get(handlers::get_alarm))
            .route(
                "/alarm-definitions/:definition_id",
                get(handlers::get_alarm_definition),
            )
            .route("/flow/:source", get(handlers::flows_from))
            .route("/flow/:source/:destination_ip", get(handlers::flows_to))
            .route(
                "/flow/:source/:destination_ip/:destination_port",
                get(handlers::flows_to_port),
            )
            .route("/flow/metrics/:flow_id", get(handlers::flow_metrics))
            .route(
                "/flow/measurements/:flow_id/:metric",
                get(handlers::flow_measurements),
            )
            .route("/vm/metrics/:instance_id", get(handlers::vm_metrics))
            .route(
                "/vm/measurements/:instance_id/:metric",
                get(handlers::vm_measurements),
            )
            .route(
                "/metrics/:metric_name/measurements",
                get(handlers::metric_measurements),
            );

        protected(routes).with_state(Arc::new(self))
    }
}
