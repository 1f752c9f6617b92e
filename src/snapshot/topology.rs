//! Whole-topology snapshot and its cache

use super::assembler::{assemble, Join};
use crate::entity::{
    create_message, EntityStrategy, PHYSICAL_STRATEGY, UE_STRATEGY, VIRTUAL_STRATEGY,
    VM_NETWORK, VM_NETWORK_STRATEGY,
};
use crate::error::Result;
use crate::store::{FetchRequest, RecordSource};
use crate::types::{JsonObject, JsonValue, Record, SortOrder};
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;
use tracing::{debug, info};

const NETWORK_KEY: &str = "network";

/// Network messages of one virtual machine, in row order
pub async fn network_children(source: &dyn RecordSource, uuid: JsonValue) -> Result<Vec<Record>> {
    let uuid = match uuid {
        JsonValue::String(s) => s,
        other => other.to_string(),
    };
    let request = FetchRequest::new(&VM_NETWORK)
        .equals("uuid", uuid)
        .order(SortOrder::Ascending);
    let rows = source.fetch(&request).await?;
    Ok(rows
        .iter()
        .map(|row| create_message(&VM_NETWORK_STRATEGY, row))
        .collect())
}

/// Event message for a virtual machine row carrying joined networks
pub fn virtual_machine_message(row: &Record) -> Record {
    let mut message = create_message(&VIRTUAL_STRATEGY, row);
    let networks = row
        .get(NETWORK_KEY)
        .cloned()
        .unwrap_or_else(|| JsonValue::Array(Vec::new()));
    if let Some(JsonValue::Object(vm)) = message.get_mut(VIRTUAL_STRATEGY.inner_key) {
        vm.insert(NETWORK_KEY.to_string(), networks);
    }
    message
}

/// Builds `{physical, virtual, ue}` from a record source
#[derive(Clone)]
pub struct TopologySnapshot {
    source: Arc<dyn RecordSource>,
}

impl TopologySnapshot {
    pub fn new(source: Arc<dyn RecordSource>) -> Self {
        Self { source }
    }

    async fn messages(&self, strategy: &EntityStrategy) -> Result<Vec<JsonValue>> {
        let request = FetchRequest::new(strategy.schema).order(SortOrder::Ascending);
        let rows = self.source.fetch(&request).await?;
        Ok(rows
            .iter()
            .map(|row| JsonValue::Object(create_message(strategy, row)))
            .collect())
    }

    /// Point-in-time topology; any failed read fails the whole snapshot
    pub async fn build(&self) -> Result<JsonObject> {
        let physical = self.messages(&PHYSICAL_STRATEGY).await?;

        let vm_rows = self
            .source
            .fetch(&FetchRequest::new(VIRTUAL_STRATEGY.schema).order(SortOrder::Ascending))
            .await?;
        let join = Join {
            foreign_key: "uuid",
            child_key: NETWORK_KEY,
        };
        let source = self.source.as_ref();
        let vm_rows = assemble(vm_rows, join, |uuid| network_children(source, uuid)).await?;
        let virtual_machines: Vec<JsonValue> = vm_rows
            .iter()
            .map(|row| JsonValue::Object(virtual_machine_message(row)))
            .collect();

        let ue = self.messages(&UE_STRATEGY).await?;

        info!(
            physical = physical.len(),
            virtual_machines = virtual_machines.len(),
            ue = ue.len(),
            "topology snapshot built"
        );

        let mut snapshot = JsonObject::new();
        snapshot.insert("physical".to_string(), JsonValue::Array(physical));
        snapshot.insert("virtual".to_string(), JsonValue::Array(virtual_machines));
        snapshot.insert("ue".to_string(), JsonValue::Array(ue));
        Ok(snapshot)
    }
}

/// Process-wide snapshot holder
///
/// `get` builds once and shares the result; concurrent callers during a
/// build wait for that build. `invalidate` discards the snapshot so the
/// next `get` rebuilds it.
pub struct TopologyCache {
    builder: TopologySnapshot,
    cell: RwLock<Arc<OnceCell<Arc<JsonObject>>>>,
}

impl TopologyCache {
    pub fn new(builder: TopologySnapshot) -> Self {
        Self {
            builder,
            cell: RwLock::new(Arc::new(OnceCell::new())),
        }
    }

    fn current(&self) -> Arc<OnceCell<Arc<JsonObject>>> {
        match self.cell.read() {
            Ok(cell) => Arc::clone(&cell),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub async fn get(&self) -> Result<Arc<JsonObject>> {
        let cell = self.current();
        let snapshot = cell
            .get_or_try_init(|| async {
                debug!("building topology snapshot");
                self.builder.build().await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(snapshot))
    }

    pub fn invalidate(&self) {
        let fresh = Arc::new(OnceCell::new());
        match self.cell.write() {
            Ok(mut cell) => *cell = fresh,
            Err(poisoned) => *poisoned.into_inner() = fresh,
        }
        info!("topology snapshot invalidated");
    }

    pub fn is_cached(&self) -> bool {
        self.current().initialized()
    }
}
