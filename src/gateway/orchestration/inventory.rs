//! Service inventory documents and their client views

use crate::types::{JsonValue, Record};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// App class marker of virtual network functions
const VNF_CLASS: &str = "VNF";

// ============================================================================
// Inventory documents
// ============================================================================

/// A service as the inventory stores it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceRecord {
    pub service_id: Option<String>,
    pub created_at: JsonValue,
    pub service_status: JsonValue,
    pub service_type: JsonValue,
    pub service_info: JsonValue,
    pub lifecycle_status: JsonValue,
    pub related_services: JsonValue,
    pub network_services: Vec<NetworkServiceRecord>,
    pub apps: Vec<AppRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NetworkServiceRecord {
    pub ns_instance_id: Option<String>,
    pub ns_status: JsonValue,
    pub ns_type: JsonValue,
    pub nfvo_id: JsonValue,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppRecord {
    pub app_instance_id: Option<String>,
    pub ns_instance_id: Option<String>,
    pub app_class: Option<String>,
    pub app_type: JsonValue,
    pub status: JsonValue,
    pub location: JsonValue,
    pub vm_ids: Vec<VmRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VmRef {
    pub vim_vm_id: Option<String>,
}

impl AppRecord {
    fn is_vnf(&self) -> bool {
        self.app_class
            .as_deref()
            .is_some_and(|class| class.contains(VNF_CLASS))
    }

    fn belongs_to(&self, ns_id: &str) -> bool {
        self.ns_instance_id.as_deref() == Some(ns_id)
    }

    fn vm_ids(&self) -> impl Iterator<Item = &str> {
        self.vm_ids.iter().filter_map(|vm| vm.vim_vm_id.as_deref())
    }
}

impl ServiceRecord {
    /// Every virtual machine referenced by the service's apps
    pub fn vm_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for id in self.apps.iter().flat_map(AppRecord::vm_ids) {
            if !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        ids
    }
}

// ============================================================================
// Client views
// ============================================================================

/// Listing entry of a service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub id: String,
    #[serde(skip_serializing_if = "JsonValue::is_null")]
    pub created: JsonValue,
    pub status: JsonValue,
    #[serde(rename = "type")]
    pub kind: JsonValue,
}

impl From<&ServiceRecord> for ServiceSummary {
    fn from(record: &ServiceRecord) -> Self {
        Self {
            id: record.service_id.clone().unwrap_or_default(),
            created: record.created_at.clone(),
            status: record.service_status.clone(),
            kind: record.service_type.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceView {
    #[serde(flatten)]
    pub summary: ServiceSummary,
    pub info: JsonValue,
    pub lifecycle: JsonValue,
    pub related_services: JsonValue,
    pub network_services: Vec<NetworkServiceView>,
    pub sdn_apps: Vec<AppView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkServiceView {
    pub id: String,
    pub status: JsonValue,
    #[serde(rename = "type")]
    pub kind: JsonValue,
    pub nfvo: JsonValue,
    pub apps: Vec<AppView>,
    pub sdn_apps: Vec<AppView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppView {
    pub id: String,
    pub status: JsonValue,
    #[serde(rename = "type")]
    pub kind: JsonValue,
    pub app_class: JsonValue,
    pub location: JsonValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_machines: Option<Vec<Record>>,
}

impl AppView {
    /// App with its machines resolved; ids missing from `machines` drop out
    pub fn build(app: &AppRecord, machines: &HashMap<String, Record>) -> Self {
        let virtual_machines = if app.vm_ids.is_empty() {
            None
        } else {
            Some(app.vm_ids().filter_map(|id| machines.get(id).cloned()).collect())
        };
        Self {
            id: app.app_instance_id.clone().unwrap_or_default(),
            status: app.status.clone(),
            kind: app.app_type.clone(),
            app_class: app
                .app_class
                .clone()
                .map_or(JsonValue::Null, JsonValue::String),
            location: app.location.clone(),
            virtual_machines,
        }
    }

    /// Machine of this app by its uuid
    pub fn machine(&self, uuid: &str) -> Option<&Record> {
        self.virtual_machines
            .as_deref()?
            .iter()
            .find(|vm| vm.get("uuid").and_then(JsonValue::as_str) == Some(uuid))
    }
}

impl NetworkServiceView {
    pub fn build(ns: &NetworkServiceRecord, apps: &[AppRecord], machines: &HashMap<String, Record>) -> Self {
        let id = ns.ns_instance_id.clone().unwrap_or_default();
        let (vnf, sdn): (Vec<&AppRecord>, Vec<&AppRecord>) = apps
            .iter()
            .filter(|app| app.belongs_to(&id))
            .partition(|app| app.is_vnf());
        Self {
            status: ns.ns_status.clone(),
            kind: ns.ns_type.clone(),
            nfvo: ns.nfvo_id.clone(),
            apps: vnf.into_iter().map(|a| AppView::build(a, machines)).collect(),
            sdn_apps: sdn.into_iter().map(|a| AppView::build(a, machines)).collect(),
            id,
        }
    }

    pub fn app(&self, app_id: &str) -> Option<&AppView> {
        self.apps.iter().find(|app| app.id == app_id)
    }
}

impl ServiceView {
    /// Full service; apps outside any network service that are not VNFs
    /// are the service's own SDN apps
    pub fn build(record: &ServiceRecord, machines: &HashMap<String, Record>) -> Self {
        let network_services = record
            .network_services
            .iter()
            .map(|ns| NetworkServiceView::build(ns, &record.apps, machines))
            .collect();
        let sdn_apps = record
            .apps
            .iter()
            .filter(|app| !app.is_vnf() && app.ns_instance_id.is_none())
            .map(|app| AppView::build(app, machines))
            .collect();

        Self {
            summary: ServiceSummary::from(record),
            info: record.service_info.clone(),
            lifecycle: record.lifecycle_status.clone(),
            related_services: record.related_services.clone(),
            network_services,
            sdn_apps,
        }
    }

    pub fn network_service(&self, ns_id: &str) -> Option<&NetworkServiceView> {
        self.network_services.iter().find(|ns| ns.id == ns_id)
    }

    pub fn sdn_app(&self, app_id: &str) -> Option<&AppView> {
        self.sdn_apps.iter().find(|app| app.id == app_id)
    }
}
