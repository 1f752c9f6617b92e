//! Orchestration gateway (`/nbi/orchestration/api`)
//!
//! Topology views over the topology database (the cached whole-topology
//! snapshot, virtual machine search, LTE user equipment) and the service
//! inventory, whose apps are expanded with the machines they run on.

mod handlers;
pub mod inventory;
pub mod vm;

use crate::config::GatewayConfig;
use crate::entity::{PHYSICAL_MACHINE, UE, VIRTUAL_MACHINE, VM_NETWORK};
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::server::protected;
use crate::snapshot::{TopologyCache, TopologySnapshot};
use crate::store::{Collection, RecordSource};
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Topology and service inventory service
pub struct OrchestrationGateway {
    source: Arc<dyn RecordSource>,
    vms: Collection,
    topology: TopologyCache,
    inventory: HttpClient,
}

impl std::fmt::Debug for OrchestrationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrchestrationGateway")
            .field("inventory", &self.inventory)
            .field("snapshot_cached", &self.topology.is_cached())
            .finish_non_exhaustive()
    }
}

impl OrchestrationGateway {
    pub fn new(source: Arc<dyn RecordSource>, inventory: HttpClient) -> Self {
        Self {
            vms: Collection::new(Arc::clone(&source), &VIRTUAL_MACHINE),
            topology: TopologyCache::new(TopologySnapshot::new(Arc::clone(&source))),
            source,
            inventory,
        }
    }

    pub async fn from_config(config: &GatewayConfig) -> Result<Self> {
        let database = config.topology_database.as_ref().ok_or_else(|| {
            Error::invalid_config("topology_database", "must be set to serve this service")
        })?;
        let source =
            super::attach(database, &[&PHYSICAL_MACHINE, &VIRTUAL_MACHINE, &VM_NETWORK, &UE]).await?;

        let inventory = super::backend(
            "Service Inventory",
            super::required_url("service_inventory", config.service_inventory.as_ref())?,
            config.request_timeout(),
        )?;

        Ok(Self::new(source, inventory))
    }

    pub fn router(self) -> Router {
        let routes = Router::new()
            .route(
                "/topology/snapshot",
                get(handlers::snapshot).delete(handlers::invalidate_snapshot),
            )
            .route("/topology/vm", get(handlers::search_vms))
            .route("/topology/lte/ue/enb", get(handlers::enb_addresses))
            .route("/topology/lte/ue/ip/:ue_ip", get(handlers::ue_by_ip))
            .route("/topology/locations", get(handlers::locations))
            .route("/services", get(handlers::list_services))
            .route("/services/:service_id", get(handlers::get_service))
            .route(
                "/services/:service_id/network-services",
                get(handlers::network_services),
            )
            .route(
                "/services/:service_id/network-services/:ns_id",
                get(handlers::network_service),
            )
            .route(
                "/services/:service_id/network-services/:ns_id/apps",
                get(handlers::ns_apps),
            )
            .route(
                "/services/:service_id/network-services/:ns_id/apps/:app_id",
                get(handlers::ns_app),
            )
            .route(
                "/services/:service_id/network-services/:ns_id/apps/:app_id/virtual-machines",
                get(handlers::app_machines),
            )
            .route(
                "/services/:service_id/network-services/:ns_id/apps/:app_id/virtual-machines/:vm_id",
                get(handlers::app_machine),
            )
            .route("/services/:service_id/sdn-apps", get(handlers::sdn_apps))
            .route("/services/:service_id/sdn-apps/:app_id", get(handlers::sdn_app));

        protected(routes).with_state(Arc::new(self))
    }
}

#[cfg(test)]
mod tests;
