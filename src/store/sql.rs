//! Relational source over the DuckDB engine

use super::types::{Condition, FetchRequest, RecordSource};
use crate::database::{quote_ident, DatabaseEngine};
use crate::entity::{Column, ColumnKind, EntitySchema};
use crate::error::{code, Error, Result};
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info};

const TIMESTAMP_PARAM: &str = "%Y-%m-%d %H:%M:%S%.f";

/// A declared entity bound to a live table
#[derive(Debug, Clone)]
struct TableBinding {
    table: String,
    /// Declared columns present in the table, identity first
    columns: Vec<Column>,
}

/// Reads declared entities from tables attached to a `DatabaseEngine`
#[derive(Debug)]
pub struct SqlRecordSource {
    engine: Arc<DatabaseEngine>,
    bindings: HashMap<&'static str, TableBinding>,
}

impl SqlRecordSource {
    /// Validate each schema against its live table and bind it
    ///
    /// Fails when a table is missing or lacks a required declared column.
    pub fn bind(
        engine: Arc<DatabaseEngine>,
        schemas: &[&'static EntitySchema],
        table_overrides: &HashMap<String, String>,
    ) -> Result<Self> {
        let mut bindings = HashMap::new();

        for schema in schemas {
            let table = table_overrides
                .get(schema.name)
                .map_or(schema.table, String::as_str);
            let actual = engine.describe(table).map_err(|e| {
                Error::config(format!("table '{table}' for '{}' is unavailable: {e}", schema.name))
            })?;

            let missing = schema.missing_columns(&actual);
            if !missing.is_empty() {
                return Err(Error::config(format!(
                    "table '{table}' for '{}' lacks declared columns: {}",
                    schema.name,
                    missing.join(", ")
                )));
            }

            let columns: Vec<Column> = schema
                .all_columns()
                .into_iter()
                .filter(|c| actual.iter().any(|a| a.eq_ignore_ascii_case(c.backend)))
                .copied()
                .collect();

            info!(entity = schema.name, table, columns = columns.len(), "schema validated");
            bindings.insert(
                schema.name,
                TableBinding {
                    table: engine.qualify(table),
                    columns,
                },
            );
        }

        Ok(Self { engine, bindings })
    }

    pub fn engine(&self) -> &Arc<DatabaseEngine> {
        &self.engine
    }

    fn binding(&self, schema: &EntitySchema) -> Result<&TableBinding> {
        self.bindings
            .get(schema.name)
            .ok_or_else(|| Error::config(format!("entity '{}' is not bound to a table", schema.name)))
    }

    /// SQL text, bind parameters and output column names for a fetch
    fn build_select(&self, request: &FetchRequest) -> Result<(String, Vec<String>, Vec<String>)> {
        let schema = request.schema;
        let binding = self.binding(schema)?;

        let names: Vec<String> = binding.columns.iter().map(|c| c.backend.to_string()).collect();
        let select_list = names
            .iter()
            .map(|n| quote_ident(n))
            .collect::<Vec<_>>()
            .join(", ");

        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<String> = Vec::new();

        for condition in &request.conditions {
            let column = lookup(schema, condition.field())?;
            let ident = quote_ident(column.backend);
            match condition {
                Condition::Equals { value, .. } => {
                    clauses.push(format!("CAST({ident} AS VARCHAR) = ?"));
                    params.push(value.clone());
                }
                Condition::OneOf { values, .. } if values.is_empty() => {
                    clauses.push("FALSE".to_string());
                }
                Condition::OneOf { values, .. } => {
                    let marks = vec!["?"; values.len()].join(", ");
                    clauses.push(format!("CAST({ident} AS VARCHAR) IN ({marks})"));
                    params.extend(values.iter().cloned());
                }
                Condition::Since { at, .. } => {
                    clauses.push(format!("CAST({ident} AS TIMESTAMP) >= CAST(? AS TIMESTAMP)"));
                    params.push(at.format(TIMESTAMP_PARAM).to_string());
                }
                Condition::Until { at, .. } => {
                    clauses.push(format!("CAST({ident} AS TIMESTAMP) <= CAST(? AS TIMESTAMP)"));
                    params.push(at.format(TIMESTAMP_PARAM).to_string());
                }
            }
        }

        let identity = quote_ident(schema.identity.backend);
        if let Some(before) = &request.before {
            clauses.push(format!(
                "{identity} < CAST(? AS {})",
                schema.identity.kind.sql_type()
            ));
            params.push(before.before.to_sql_param());
        }

        let mut sql = format!("SELECT {select_list} FROM {}", binding.table);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(&format!(" ORDER BY {identity} {}", request.order.as_sql()));
        if let Some(limit) = request.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        Ok((sql, params, names))
    }

    async fn run(&self, sql: String, params: Vec<String>, names: Vec<String>) -> Result<Vec<Record>> {
        let engine = Arc::clone(&self.engine);
        let statement = sql.clone();
        tokio::task::spawn_blocking(move || engine.query(&sql, &params, &names))
            .await
            .map_err(|e| Error::database(format!("query task failed: {e}")))?
            .inspect_err(|e| error!(sql = %statement, error = %e, "database query failed"))
    }
}

/// Declared column behind a public field
fn lookup(schema: &EntitySchema, field: &str) -> Result<Column> {
    schema.column(field).copied().ok_or_else(|| {
        Error::bad_request(
            "Invalid search_by",
            format!("'{field}' is not a searchable field of {}", schema.name),
            code::INVALID_SEARCH,
        )
    })
}

/// Decode JSON-bearing columns and rename to public fields
fn decode_row(schema: &EntitySchema, mut row: Record) -> Record {
    for column in schema.all_columns() {
        if matches!(column.kind, ColumnKind::Json | ColumnKind::Document) {
            if let Some(JsonValue::String(text)) = row.get(column.backend) {
                if let Ok(parsed) = serde_json::from_str::<JsonValue>(text) {
                    row.insert(column.backend.to_string(), parsed);
                }
            }
        }
    }
    schema.rename_row(&row)
}

#[async_trait]
impl RecordSource for SqlRecordSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Record>> {
        let (sql, params, names) = self.build_select(request)?;
        let rows = self.run(sql, params, names).await?;
        debug!(entity = request.schema.name, rows = rows.len(), "fetched");
        Ok(rows
            .into_iter()
            .map(|row| decode_row(request.schema, row))
            .collect())
    }

    async fn distinct(&self, schema: &'static EntitySchema, field: &str) -> Result<Vec<JsonValue>> {
        let binding = self.binding(schema)?;
        let column = lookup(schema, field)?;
        let ident = quote_ident(column.backend);
        let sql = format!(
            "SELECT DISTINCT {ident} FROM {} WHERE {ident} IS NOT NULL ORDER BY {ident}",
            binding.table
        );
        let rows = self
            .run(sql, Vec::new(), vec![column.backend.to_string()])
            .await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.remove(column.backend))
            .collect())
    }
}
