//! Relational backend access via DuckDB
//!
//! The topology and document stores are attached read-only to an
//! in-process DuckDB instance, which speaks PostgreSQL, MySQL, SQLite and
//! native DuckDB files through its extensions.

mod engine;

pub use engine::{duckdb_value_to_json, DatabaseEngine, DatabaseKind};
pub(crate) use engine::quote_ident;
