//! Event-message strategies
//!
//! Topology snapshots are expressed in the same shape as the real-time
//! events the orchestrator consumes. Each entity supplies a strategy
//! describing how a row becomes such a message.

use super::catalog::{PHYSICAL_MACHINE, UE, VIRTUAL_MACHINE, VM_NETWORK};
use super::schema::EntitySchema;
use crate::types::{without_nulls, JsonValue, Record};

/// How rows of one entity become event messages
#[derive(Debug)]
pub struct EntityStrategy {
    pub schema: &'static EntitySchema,
    /// `eventtype` of the wrapper; `None` emits the bare inner object
    pub event_type: Option<&'static str>,
    /// Key of the inner object inside the wrapper
    pub inner_key: &'static str,
    /// Final adjustment of a built message
    pub customize: Option<fn(Record) -> Record>,
}

pub static PHYSICAL_STRATEGY: EntityStrategy = EntityStrategy {
    schema: &PHYSICAL_MACHINE,
    event_type: Some("compute_event"),
    inner_key: "compute_node",
    customize: None,
};

pub static VIRTUAL_STRATEGY: EntityStrategy = EntityStrategy {
    schema: &VIRTUAL_MACHINE,
    event_type: Some("instance_event"),
    inner_key: "vm",
    customize: None,
};

pub static VM_NETWORK_STRATEGY: EntityStrategy = EntityStrategy {
    schema: &VM_NETWORK,
    event_type: None,
    inner_key: "network",
    customize: None,
};

pub static UE_STRATEGY: EntityStrategy = EntityStrategy {
    schema: &UE,
    event_type: Some("ue_event"),
    inner_key: "ue",
    customize: Some(ue_event_type),
};

/// A UE with an assigned IP has completed attachment
fn ue_event_type(mut message: Record) -> Record {
    let attached = message
        .get(UE_STRATEGY.inner_key)
        .and_then(JsonValue::as_object)
        .is_some_and(|inner| inner.contains_key("ue_ip"));
    let kind = if attached { "UPDATE" } else { "CREATE" };
    message.insert("type".to_string(), JsonValue::String(kind.to_string()));
    message
}

/// Build the event message for one row keyed by public field names
///
/// The inner object holds the mapped fields with nulls dropped. The
/// wrapper carries `eventtype` and, when the row has one, `type` taken
/// from the state column.
pub fn create_message(strategy: &EntityStrategy, row: &Record) -> Record {
    let schema = strategy.schema;
    let mut inner = Record::new();
    for column in schema.columns {
        if let Some(value) = row.get(column.public) {
            inner.insert(column.public.to_string(), value.clone());
        }
    }
    let inner = without_nulls(inner);

    let Some(event_type) = strategy.event_type else {
        return inner;
    };

    let mut message = Record::new();
    message.insert(
        "eventtype".to_string(),
        JsonValue::String(event_type.to_string()),
    );
    if let Some(state) = schema.state.and_then(|c| row.get(c.public)) {
        message.insert("type".to_string(), state.clone());
    }
    message.insert(strategy.inner_key.to_string(), JsonValue::Object(inner));
    let message = without_nulls(message);

    match strategy.customize {
        Some(customize) => customize(message),
        None => message,
    }
}
