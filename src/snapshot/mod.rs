//! Hierarchical snapshots
//!
//! Joins child record sets onto parents by foreign key, and materializes
//! the whole topology as event messages behind a process-wide cache.

mod assembler;
mod topology;

pub use assembler::{assemble, Join};
pub use topology::{network_children, virtual_machine_message, TopologyCache, TopologySnapshot};
