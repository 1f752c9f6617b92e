//! Autonomous gateway (`/nbi/autonomous/api`)
//!
//! Symptoms, tactic action reports, TALs and intelligence models, read
//! from the document tables of the TAL database and paginated natively.
//! TAL scripts are written through the TAL service; their activation state
//! comes from the TAL engine.

mod handlers;
pub mod transform;

use crate::config::GatewayConfig;
use crate::entity::{INTELLIGENCE_MODEL, SYMPTOM_ACTION_CASE, TAL};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::server::protected;
use crate::store::{Collection, RecordSource};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Symptom and TAL service
#[derive(Debug, Clone)]
pub struct AutonomousGateway {
    symptoms: Collection,
    tals: Collection,
    models: Collection,
    tal_service: HttpClient,
    tal_engine: HttpClient,
}

impl AutonomousGateway {
    pub fn new(source: Arc<dyn RecordSource>, tal_service: HttpClient, tal_engine: HttpClient) -> Self {
        Self {
            symptoms: Collection::new(Arc::clone(&source), &SYMPTOM_ACTION_CASE),
            tals: Collection::new(Arc::clone(&source), &TAL),
            models: Collection::new(source, &INTELLIGENCE_MODEL),
            tal_service,
            tal_engine,
        }
    }

    pub async fn from_config(config: &GatewayConfig) -> Result<Self> {
        let database = config
            .tal_database
            .as_ref()
            .ok_or_else(|| Error::invalid_config("tal_database", "must be set to serve this service"))?;
        let source =
            super::attach(database, &[&SYMPTOM_ACTION_CASE, &TAL, &INTELLIGENCE_MODEL]).await?;

        let timeout = config.request_timeout();
        let tal_service = super::backend(
            "TAL",
            super::required_url("tal_service", config.tal_service.as_ref())?,
            timeout,
        )?;
        let tal_engine = super::backend(
            "TAL engine",
            super::required_url("tal_engine", config.tal_engine.as_ref())?,
            timeout,
        )?;

        Ok(Self::new(source, tal_service, tal_engine))
    }

    pub fn router(self) -> Router {
        let routes = Router::new()
            .route("/symptom", get(handlers::list_symptoms))
            .route("/symptom/affected", get(handlers::affected_ips))
            .route("/symptom/affected/:symptom_type", get(handlers::affected_ips_of_type))
            .route("/symptom/:symptom_type", get(handlers::symptoms_of_type))
            .route("/symptom/:symptom_type/:hash", get(handlers::symptom_by_hash))
            .route("/tal", get(handlers::list_tals).post(handlers::create_tal))
            .route(
                "/tal/:tal_id",
                get(handlers::get_tal).delete(handlers::delete_tal),
            )
            .route("/intelligence/model", get(handlers::list_models));

        protected(routes).with_state(Arc::new(self))
    }
}
