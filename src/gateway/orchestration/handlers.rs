//! Orchestration route handlers

use super::inventory::{AppView, NetworkServiceView, ServiceRecord, ServiceSummary, ServiceView};
use super::vm::{machine_ids, VmQuery, FOREIGN_KEY, NETWORK_KEY};
use super::OrchestrationGateway;
use crate::entity::{UE, VIRTUAL_MACHINE};
use crate::error::{Error, Result};
use crate::http::RequestConfig;
use crate::query::{normalize, LimitPolicy, RawQuery};
use crate::server::RequestUri;
use crate::snapshot::{assemble, network_children, Join};
use crate::store::FetchRequest;
use crate::types::{JsonValue, Record, SortOrder};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

type Gateway = State<Arc<OrchestrationGateway>>;

const NETWORK_JOIN: Join<'static> = Join {
    foreign_key: FOREIGN_KEY,
    child_key: NETWORK_KEY,
};

// ============================================================================
// Topology
// ============================================================================

pub(super) async fn snapshot(State(gw): Gateway) -> Result<Json<JsonValue>> {
    let snapshot = gw.topology.get().await?;
    Ok(Json(JsonValue::Object((*snapshot).clone())))
}

pub(super) async fn invalidate_snapshot(State(gw): Gateway) -> StatusCode {
    gw.topology.invalidate();
    StatusCode::NO_CONTENT
}

/// Virtual machines by machine or network criteria, paginated by row id
pub(super) async fn search_vms(
    State(gw): Gateway,
    uri: RequestUri,
    raw: RawQuery,
) -> Result<Json<JsonValue>> {
    let spec = normalize(&raw, LimitPolicy::TOPOLOGY)?;
    let query = VmQuery::translate(&spec);
    debug!(
        vm_criteria = query.vm_search.len(),
        network_criteria = query.network_search.len(),
        "virtual machine search"
    );

    let mut request = query.vm_request();
    if !query.network_search.is_empty() {
        let networks = gw.source.fetch(&query.network_request(None)).await?;
        request = request.one_of(FOREIGN_KEY, machine_ids(&networks));
    }
    let before = spec
        .cursor
        .as_deref()
        .map(|c| VIRTUAL_MACHINE.codec().decode(c))
        .transpose()?;
    let request = request.before(before);

    let mut page = gw
        .vms
        .find_with(request, spec.limit, &query.projection(), uri.as_str())
        .await?;

    if query.attaches_networks() {
        let source = gw.source.as_ref();
        let machines = std::mem::take(&mut page.items);
        let machines = assemble(machines, NETWORK_JOIN, |uuid| query.networks_of(source, uuid)).await?;
        page = page.with_items(machines);
    }
    Ok(Json(JsonValue::Object(page.into_envelope("vms"))))
}

/// User equipment holding an address
pub(super) async fn ue_by_ip(
    State(gw): Gateway,
    Path(ue_ip): Path<String>,
) -> Result<Json<Vec<Record>>> {
    let request = FetchRequest::new(&UE)
        .equals("ue_ip", ue_ip)
        .order(SortOrder::Ascending);
    Ok(Json(gw.source.fetch(&request).await?))
}

pub(super) async fn enb_addresses(State(gw): Gateway) -> Result<Json<JsonValue>> {
    let enb = gw.source.distinct(&UE, "enb_ip_s1u").await?;
    Ok(Json(json!({ "enb": enb })))
}

pub(super) async fn locations(State(gw): Gateway) -> Result<Json<JsonValue>> {
    let locations = gw.source.distinct(&VIRTUAL_MACHINE, "location").await?;
    Ok(Json(json!({ "locations": locations })))
}

// ============================================================================
// Service inventory
// ============================================================================

impl OrchestrationGateway {
    /// Machines by uuid, each with its networks
    async fn machines(&self, ids: Vec<String>) -> Result<HashMap<String, Record>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let wanted = ids.len();
        let request = FetchRequest::new(&VIRTUAL_MACHINE)
            .one_of(FOREIGN_KEY, ids)
            .order(SortOrder::Ascending);
        let rows = self.source.fetch(&request).await?;
        if rows.len() < wanted {
            warn!(wanted, found = rows.len(), "inventory references unknown machines");
        }

        let source = self.source.as_ref();
        let rows = assemble(rows, NETWORK_JOIN, |uuid| network_children(source, uuid)).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let uuid = row.get(FOREIGN_KEY)?.as_str()?.to_string();
                Some((uuid, row))
            })
            .collect())
    }

    async fn service(&self, service_id: &str) -> Result<ServiceView> {
        let record: ServiceRecord = self
            .inventory
            .get_json(service_id, RequestConfig::new())
            .await?;
        let machines = self.machines(record.vm_ids()).await?;
        Ok(ServiceView::build(&record, &machines))
    }

    async fn network_service(&self, service_id: &str, ns_id: &str) -> Result<NetworkServiceView> {
        let mut service = self.service(service_id).await?;
        let position = service
            .network_services
            .iter()
            .position(|ns| ns.id == ns_id)
            .ok_or_else(|| Error::not_found(format!("network service {ns_id}")))?;
        Ok(service.network_services.swap_remove(position))
    }

    async fn ns_app(&self, service_id: &str, ns_id: &str, app_id: &str) -> Result<AppView> {
        let ns = self.network_service(service_id, ns_id).await?;
        ns.app(app_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("app {app_id}")))
    }
}

pub(super) async fn list_services(State(gw): Gateway) -> Result<Json<Vec<ServiceSummary>>> {
    let records: Vec<ServiceRecord> = gw.inventory.get_json("", RequestConfig::new()).await?;
    Ok(Json(records.iter().map(ServiceSummary::from).collect()))
}

pub(super) async fn get_service(
    State(gw): Gateway,
    Path(service_id): Path<String>,
) -> Result<Json<ServiceView>> {
    Ok(Json(gw.service(&service_id).await?))
}

pub(super) async fn network_services(
    State(gw): Gateway,
    Path(service_id): Path<String>,
) -> Result<Json<Vec<NetworkServiceView>>> {
    Ok(Json(gw.service(&service_id).await?.network_services))
}

pub(super) async fn network_service(
    State(gw): Gateway,
    Path((service_id, ns_id)): Path<(String, String)>,
) -> Result<Json<NetworkServiceView>> {
    Ok(Json(gw.network_service(&service_id, &ns_id).await?))
}

pub(super) async fn ns_apps(
    State(gw): Gateway,
    Path((service_id, ns_id)): Path<(String, String)>,
) -> Result<Json<Vec<AppView>>> {
    Ok(Json(gw.network_service(&service_id, &ns_id).await?.apps))
}

pub(super) async fn ns_app(
    State(gw): Gateway,
    Path((service_id, ns_id, app_id)): Path<(String, String, String)>,
) -> Result<Json<AppView>> {
    Ok(Json(gw.ns_app(&service_id, &ns_id, &app_id).await?))
}

pub(super) async fn app_machines(
    State(gw): Gateway,
    Path((service_id, ns_id, app_id)): Path<(String, String, String)>,
) -> Result<Json<JsonValue>> {
    let app = gw.ns_app(&service_id, &ns_id, &app_id).await?;
    Ok(Json(json!({ "vms": app.virtual_machines.unwrap_or_default() })))
}

pub(super) async fn app_machine(
    State(gw): Gateway,
    Path((service_id, ns_id, app_id, vm_id)): Path<(String, String, String, String)>,
) -> Result<Json<Record>> {
    let app = gw.ns_app(&service_id, &ns_id, &app_id).await?;
    app.machine(&vm_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("virtual machine {vm_id}")))
}

pub(super) async fn sdn_apps(
    State(gw): Gateway,
    Path(service_id): Path<String>,
) -> Result<Json<Vec<AppView>>> {
    Ok(Json(gw.service(&service_id).await?.sdn_apps))
}

pub(super) async fn sdn_app(
    State(gw): Gateway,
    Path((service_id, app_id)): Path<(String, String)>,
) -> Result<Json<AppView>> {
    let service = gw.service(&service_id).await?;
    service
        .sdn_app(&app_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| Error::not_found(format!("SDN app {app_id}")))
}
