//! Entities served by the gateways

use super::schema::{Column, ColumnKind, EntitySchema};
use crate::cursor::CursorKind;

const ROW_ID: Column = Column::new("id", "id", ColumnKind::Integer);
const OBJECT_ID: Column = Column::text("id", "_id");
const STATE: Column = Column::text("state", "state").optional();

// ============================================================================
// Topology
// ============================================================================

pub static PHYSICAL_MACHINE: EntitySchema = EntitySchema {
    name: "physical_machine",
    table: "physical_machine",
    identity: ROW_ID,
    cursor: CursorKind::RowId,
    columns: &[
        Column::text("hostname", "hostname"),
        Column::text("location", "location"),
        Column::text("ip", "ip"),
        Column::text("network_id", "networkId"),
    ],
    state: Some(STATE),
    foreign_key: None,
};

pub static VIRTUAL_MACHINE: EntitySchema = EntitySchema {
    name: "virtual_machine",
    table: "virtual_machine",
    identity: ROW_ID,
    cursor: CursorKind::RowId,
    columns: &[
        Column::text("location", "location"),
        Column::text("name", "name"),
        Column::text("tenant_id", "tenantId"),
        Column::text("user_id", "userId"),
        Column::text("hostname", "hostName"),
        Column::text("host_ip", "hostIp"),
        Column::text("instance_id", "instanceId"),
        Column::text("uuid", "uuid"),
        Column::text("image_id", "imageId"),
        Column::new("reported_time", "reportedTime", ColumnKind::Timestamp),
        Column::text("resource_id", "resourceId"),
    ],
    state: Some(STATE),
    foreign_key: Some(Column::text("uuid", "uuid")),
};

pub static VM_NETWORK: EntitySchema = EntitySchema {
    name: "vm_network",
    table: "vm_network",
    identity: ROW_ID,
    cursor: CursorKind::RowId,
    columns: &[
        Column::text("mac", "mac"),
        Column::text("iface", "iface"),
        Column::text("dhcp", "dhcp"),
        Column::text("gateway", "gateway"),
        Column::text("dns", "dns"),
        Column::text("ip", "vmIp"),
        Column::text("network_id", "networkId"),
        Column::text("port_id", "portId"),
        Column::text("ovs_id", "ovsId"),
        Column::text("segmentation_id", "segmentationId"),
        Column::new("network_reported_time", "reportedTime", ColumnKind::Timestamp),
        Column::text("network_resource_id", "resourceId"),
    ],
    state: None,
    foreign_key: Some(Column::text("uuid", "uuid")),
};

pub static UE: EntitySchema = EntitySchema {
    name: "ue",
    table: "ue",
    identity: ROW_ID,
    cursor: CursorKind::RowId,
    columns: &[
        Column::text("imsi", "IMSI"),
        Column::text("mcc", "MCC"),
        Column::text("mnc", "MNC"),
        Column::text("ueid", "UEId"),
        Column::text("mme_teid_s11", "mmeTeidS11"),
        Column::text("sgw_teid_s11", "sgwTeidS11"),
        Column::text("eps_bearer_id", "epsBearerId"),
        Column::text("mme_ip", "MMEIp"),
        Column::text("sgw_teid_s1", "sgwTeidS1"),
        Column::text("enb_teid_s1u", "enbTeidS1u"),
        Column::text("sgw_ip_s1u", "sgwIPS1U"),
        Column::text("enb_ip_s1u", "enbIPS1U"),
        Column::text("ue_ip", "UEIP"),
    ],
    state: None,
    foreign_key: None,
};

// ============================================================================
// Intelligence store
// ============================================================================

pub static SYMPTOM_ACTION_CASE: EntitySchema = EntitySchema {
    name: "symptom_action_case",
    table: "SymptomActionCase",
    identity: OBJECT_ID,
    cursor: CursorKind::ObjectId,
    columns: &[
        Column::text("hash", "hash"),
        Column::text("tactic_id", "tacticID"),
        Column::new("tactic", "m_tactic", ColumnKind::Json),
        Column::text("symptom_id", "symptomID"),
        Column::new("symptom", "symptom", ColumnKind::Json),
        Column::new("actions", "actions", ColumnKind::Json),
        Column::new("created", "created", ColumnKind::Timestamp),
        Column::new("updated", "updated", ColumnKind::Timestamp),
    ],
    state: None,
    foreign_key: None,
};

pub static TAL: EntitySchema = EntitySchema {
    name: "tal",
    table: "Tal",
    identity: OBJECT_ID,
    cursor: CursorKind::ObjectId,
    columns: &[
        Column::new("created", "created", ColumnKind::Timestamp).optional(),
        Column::new("updated", "updated", ColumnKind::Timestamp).optional(),
        Column::new("document", "document", ColumnKind::Document),
    ],
    state: None,
    foreign_key: None,
};

pub static INTELLIGENCE_MODEL: EntitySchema = EntitySchema {
    name: "intelligence_model",
    table: "models",
    identity: OBJECT_ID,
    cursor: CursorKind::ObjectId,
    columns: &[
        Column::text("uuid", "id"),
        Column::new("document", "document", ColumnKind::Document),
    ],
    state: None,
    foreign_key: None,
};
