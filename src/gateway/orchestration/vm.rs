//! Virtual machine search over the topology tables
//!
//! A single `search_by`/`filter` vocabulary spans two tables: names from
//! the virtual machine mapping select and project VM rows, names from the
//! network mapping select and project the networks joined onto them.

use crate::entity::{create_message, VIRTUAL_MACHINE, VM_NETWORK, VM_NETWORK_STRATEGY};
use crate::error::Result;
use crate::projection::Projection;
use crate::query::QuerySpec;
use crate::store::{FetchRequest, RecordSource};
use crate::types::{JsonValue, Record, SortOrder};

/// Join field between a machine and its networks
pub const FOREIGN_KEY: &str = "uuid";
/// Key networks are attached under
pub const NETWORK_KEY: &str = "network";

/// A normalized query split between the two tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmQuery {
    pub vm_search: Vec<(String, String)>,
    pub network_search: Vec<(String, String)>,
    pub vm_fields: Vec<String>,
    pub network_fields: Vec<String>,
    /// `network` itself was asked for
    pub network_requested: bool,
}

impl VmQuery {
    /// Sort query names into the table that maps them; unknown names drop out
    pub fn translate(spec: &QuerySpec) -> Self {
        let mut query = Self::default();

        for (field, value) in &spec.search_by {
            if VIRTUAL_MACHINE.maps(field) {
                query.vm_search.push((field.clone(), value.clone()));
            } else if VM_NETWORK.maps(field) {
                query.network_search.push((field.clone(), value.clone()));
            }
        }

        for field in &spec.filter {
            if VIRTUAL_MACHINE.maps(field) {
                query.vm_fields.push(field.clone());
            } else if VM_NETWORK.maps(field) {
                query.network_fields.push(field.clone());
            } else if field == NETWORK_KEY {
                query.network_requested = true;
            }
        }

        query
    }

    /// Whether any recognised projection was asked for
    pub fn is_filtered(&self) -> bool {
        !self.vm_fields.is_empty() || !self.network_fields.is_empty() || self.network_requested
    }

    /// Networks are attached to full records, or when asked for
    pub fn attaches_networks(&self) -> bool {
        !self.is_filtered() || self.network_requested || !self.network_fields.is_empty()
    }

    /// Projection of machine rows; the join key always survives
    pub fn projection(&self) -> Projection {
        let identity = VIRTUAL_MACHINE.identity.public;
        if !self.is_filtered() {
            return Projection::new(identity).public_identity();
        }
        let mut fields = self.vm_fields.clone();
        if !fields.iter().any(|f| f == FOREIGN_KEY) {
            fields.push(FOREIGN_KEY.to_string());
        }
        Projection::new(identity).fields(&fields)
    }

    /// Machine fetch for this query, unbounded
    pub fn vm_request(&self) -> FetchRequest {
        self.vm_search
            .iter()
            .fold(FetchRequest::new(&VIRTUAL_MACHINE), |request, (field, value)| {
                request.equals(field, value)
            })
    }

    /// Network fetch for this query, optionally for one machine
    pub fn network_request(&self, uuid: Option<String>) -> FetchRequest {
        let request = self
            .network_search
            .iter()
            .fold(FetchRequest::new(&VM_NETWORK), |request, (field, value)| {
                request.equals(field, value)
            })
            .order(SortOrder::Ascending);
        match uuid {
            Some(uuid) => request.equals(FOREIGN_KEY, uuid),
            None => request,
        }
    }

    /// Network as shown under a machine
    pub fn network_view(&self, row: &Record) -> Record {
        if self.network_fields.is_empty() {
            return create_message(&VM_NETWORK_STRATEGY, row);
        }
        self.network_fields
            .iter()
            .map(|f| (f.clone(), row.get(f).cloned().unwrap_or(JsonValue::Null)))
            .collect()
    }

    /// Networks of one machine that satisfy the network criteria
    pub async fn networks_of(&self, source: &dyn RecordSource, uuid: JsonValue) -> Result<Vec<Record>> {
        let request = self.network_request(Some(as_key(uuid)));
        let rows = source.fetch(&request).await?;
        Ok(rows.iter().map(|row| self.network_view(row)).collect())
    }
}

/// Foreign-key value as text
pub fn as_key(value: JsonValue) -> String {
    match value {
        JsonValue::String(s) => s,
        other => other.to_string(),
    }
}

/// Distinct machine ids of network rows, first-seen order
pub fn machine_ids(networks: &[Record]) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in networks
        .iter()
        .filter_map(|n| n.get(FOREIGN_KEY).cloned())
        .filter(|v| !v.is_null())
        .map(as_key)
    {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
