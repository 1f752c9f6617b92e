//! DuckDB-based query engine

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use duckdb::Connection;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tracing::debug;

const IN_MEMORY: &str = ":memory:";

/// Backend database flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseKind {
    Postgres,
    Mysql,
    Sqlite,
    #[default]
    Duckdb,
}

/// Database query engine using DuckDB
pub struct DatabaseEngine {
    /// Root connection; sessions are cloned from it
    conn: Mutex<Connection>,
    kind: DatabaseKind,
    /// Connection string used (for logging)
    connection_string: String,
    /// Schema holding the tables, when not the backend default
    schema: Option<String>,
}

impl std::fmt::Debug for DatabaseEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseEngine")
            .field("kind", &self.kind)
            .field("connection", &self.connection_info())
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl DatabaseEngine {
    /// Open an engine and attach the backend database
    pub fn open(kind: DatabaseKind, connection_string: &str, schema: Option<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::database(format!("Failed to create DuckDB connection: {e}")))?;

        let engine = Self {
            conn: Mutex::new(conn),
            kind,
            connection_string: connection_string.to_string(),
            schema,
        };

        engine.attach_database()?;
        debug!(kind = ?engine.kind, connection = %engine.connection_info(), "database attached");

        Ok(engine)
    }

    /// Engine over a private in-memory database
    pub fn in_memory() -> Result<Self> {
        Self::open(DatabaseKind::Duckdb, IN_MEMORY, None)
    }

    fn is_attached(&self) -> bool {
        !(self.kind == DatabaseKind::Duckdb && self.connection_string == IN_MEMORY)
    }

    /// Attach external database to DuckDB
    fn attach_database(&self) -> Result<()> {
        let extension = match self.kind {
            DatabaseKind::Postgres => Some(("postgres", "POSTGRES")),
            DatabaseKind::Mysql => Some(("mysql", "MYSQL")),
            DatabaseKind::Sqlite => Some(("sqlite", "SQLITE")),
            DatabaseKind::Duckdb => None,
        };

        let sql = match extension {
            Some((name, ty)) => format!(
                "INSTALL {name}; LOAD {name}; ATTACH '{}' AS source_db (TYPE {ty}, READ_ONLY);",
                self.connection_string
            ),
            None if self.is_attached() => {
                format!("ATTACH '{}' AS source_db (READ_ONLY);", self.connection_string)
            }
            None => return Ok(()),
        };

        self.execute_batch(&sql)
            .map_err(|e| Error::config(format!("Failed to attach {:?} database: {e}", self.kind)))
    }

    /// Run statements on the root connection
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::database("database connection lock poisoned"))?;
        conn.execute_batch(sql)
            .map_err(|e| Error::database(e.to_string()))
    }

    /// A fresh session on the same database, released on drop
    pub fn session(&self) -> Result<Connection> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| Error::database("database connection lock poisoned"))?;
        conn.try_clone()
            .map_err(|e| Error::database(format!("Failed to open session: {e}")))
    }

    /// Fully qualified, quoted table reference
    pub fn qualify(&self, table: &str) -> String {
        let table = quote_ident(table);
        let schema = self.schema.as_deref().map(quote_ident);
        match (self.is_attached(), schema) {
            (true, Some(schema)) => format!("source_db.{schema}.{table}"),
            (true, None) if self.kind == DatabaseKind::Postgres => {
                format!("source_db.public.{table}")
            }
            (true, None) => format!("source_db.{table}"),
            (false, Some(schema)) => format!("{schema}.{table}"),
            (false, None) => table,
        }
    }

    /// Column names of a table, in declaration order
    pub fn describe(&self, table: &str) -> Result<Vec<String>> {
        let session = self.session()?;
        let sql = format!("DESCRIBE SELECT * FROM {}", self.qualify(table));
        let mut stmt = session
            .prepare(&sql)
            .map_err(|e| Error::database(format!("Failed to describe '{table}': {e}")))?;

        let columns: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .map_err(|e| Error::database(format!("Failed to describe '{table}': {e}")))?
            .filter_map(std::result::Result::ok)
            .collect();

        Ok(columns)
    }

    /// Run a parameterized query, naming output columns by `columns`
    pub fn query(&self, sql: &str, params: &[String], columns: &[String]) -> Result<Vec<Record>> {
        debug!(sql, ?params, "executing query");

        let session = self.session()?;
        let mut stmt = session
            .prepare(sql)
            .map_err(|e| Error::database(format!("Failed to prepare query: {e}")))?;
        let mut rows = stmt
            .query(duckdb::params_from_iter(params.iter()))
            .map_err(|e| Error::database(format!("Query failed: {e}")))?;

        let mut records = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| Error::database(format!("Failed to read row: {e}")))?
        {
            let mut record = Record::new();
            for (idx, name) in columns.iter().enumerate() {
                let value: duckdb::types::Value = row
                    .get(idx)
                    .map_err(|e| Error::database(format!("Failed to read '{name}': {e}")))?;
                record.insert(name.clone(), duckdb_value_to_json(value));
            }
            records.push(record);
        }

        Ok(records)
    }

    pub fn kind(&self) -> DatabaseKind {
        self.kind
    }

    /// Get connection string (for logging - password masked)
    pub fn connection_info(&self) -> String {
        if let Some(at_pos) = self.connection_string.find('@') {
            if let Some(colon_pos) = self.connection_string[..at_pos].rfind(':') {
                let before_pass = &self.connection_string[..=colon_pos];
                let after_at = &self.connection_string[at_pos..];
                return format!("{before_pass}****{after_at}");
            }
        }
        self.connection_string.clone()
    }
}

/// Double-quote an identifier for DuckDB
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Convert DuckDB Value to JSON Value
pub fn duckdb_value_to_json(value: duckdb::types::Value) -> JsonValue {
    use duckdb::types::Value;
    match value {
        Value::Null => JsonValue::Null,
        Value::Boolean(b) => JsonValue::Bool(b),
        Value::TinyInt(i) => JsonValue::Number(i.into()),
        Value::SmallInt(i) => JsonValue::Number(i.into()),
        Value::Int(i) => JsonValue::Number(i.into()),
        Value::BigInt(i) => JsonValue::Number(i.into()),
        Value::HugeInt(i) => JsonValue::String(i.to_string()),
        Value::UTinyInt(i) => JsonValue::Number(i.into()),
        Value::USmallInt(i) => JsonValue::Number(i.into()),
        Value::UInt(i) => JsonValue::Number(i.into()),
        Value::UBigInt(i) => JsonValue::Number(i.into()),
        Value::Float(f) => {
            serde_json::Number::from_f64(f64::from(f)).map_or(JsonValue::Null, JsonValue::Number)
        }
        Value::Double(f) => serde_json::Number::from_f64(f).map_or(JsonValue::Null, JsonValue::Number),
        Value::Text(s) => JsonValue::String(s),
        Value::Blob(b) => JsonValue::String(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            b,
        )),
        Value::Timestamp(_, i) => {
            let secs = i.div_euclid(1_000_000);
            let nsecs = (i.rem_euclid(1_000_000) * 1000) as u32;
            chrono::DateTime::from_timestamp(secs, nsecs)
                .map(|dt| JsonValue::String(dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()))
                .unwrap_or(JsonValue::Number(i.into()))
        }
        Value::Date32(d) => {
            // Days since epoch (719163 is the number of days from 1 CE to 1970-01-01)
            chrono::NaiveDate::from_num_days_from_ce_opt(d + 719_163)
                .map(|date| JsonValue::String(date.format("%Y-%m-%d").to_string()))
                .unwrap_or(JsonValue::Number(d.into()))
        }
        Value::Time64(_, t) => {
            let secs = t / 1_000_000;
            let micros = t % 1_000_000;
            JsonValue::String(format!(
                "{:02}:{:02}:{:02}.{:06}",
                secs / 3600,
                (secs % 3600) / 60,
                secs % 60,
                micros
            ))
        }
        _ => JsonValue::String(format!("{value:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detached(kind: DatabaseKind, connection_string: &str, schema: Option<&str>) -> DatabaseEngine {
        DatabaseEngine {
            conn: Mutex::new(Connection::open_in_memory().unwrap()),
            kind,
            connection_string: connection_string.to_string(),
            schema: schema.map(String::from),
        }
    }

    #[test]
    fn test_connection_info_masks_password() {
        let engine = detached(DatabaseKind::Postgres, "postgresql://user:secret@db:5432/topology", None);
        assert_eq!(engine.connection_info(), "postgresql://user:****@db:5432/topology");
    }

    #[test]
    fn test_qualify_attached() {
        let pg = detached(DatabaseKind::Postgres, "postgresql://db/topology", None);
        assert_eq!(pg.qualify("ue"), "source_db.public.\"ue\"");

        let schema = detached(DatabaseKind::Mysql, "mysql://db/topology", Some("topo"));
        assert_eq!(schema.qualify("ue"), "source_db.\"topo\".\"ue\"");

        let sqlite = detached(DatabaseKind::Sqlite, "/tmp/topo.db", None);
        assert_eq!(sqlite.qualify("ue"), "source_db.\"ue\"");
    }
}
