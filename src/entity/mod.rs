//! Declared entity schemas
//!
//! Every backend entity is described once: its table, identity column,
//! cursor kind and the mapping table between public field names and
//! backend column names. The same declaration drives query translation,
//! row renaming, startup schema validation and event-message building.

mod catalog;
mod schema;
mod strategy;

pub use catalog::{
    INTELLIGENCE_MODEL, PHYSICAL_MACHINE, SYMPTOM_ACTION_CASE, TAL, UE, VIRTUAL_MACHINE,
    VM_NETWORK,
};
pub use schema::{Column, ColumnKind, EntitySchema};
pub use strategy::{
    create_message, EntityStrategy, PHYSICAL_STRATEGY, UE_STRATEGY, VIRTUAL_STRATEGY,
    VM_NETWORK_STRATEGY,
};
