//! Record sources
//!
//! A `RecordSource` answers fetches expressed against declared entity
//! schemas, returning records keyed by public field names. `Collection`
//! layers the limit+1 probe, cursor decoding and projection on top of a
//! source, giving every natively paginated endpoint the same behaviour.

mod collection;
mod memory;
mod sql;
mod types;

pub use collection::Collection;
pub use memory::MemorySource;
pub use sql::SqlRecordSource;
pub use types::{Condition, FetchRequest, RecordSource};
