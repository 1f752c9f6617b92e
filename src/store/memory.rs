//! In-memory source for fixtures and tests

use super::types::{Condition, FetchRequest, RecordSource};
use crate::entity::EntitySchema;
use crate::error::Result;
use crate::query::parse_datetime;
use crate::types::{JsonValue, Record, SortOrder};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

/// Records held per entity, already keyed by public field names
#[derive(Debug, Default)]
pub struct MemorySource {
    records: RwLock<HashMap<&'static str, Vec<Record>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add records for an entity
    #[must_use]
    pub fn with(self, schema: &'static EntitySchema, records: Vec<Record>) -> Self {
        self.insert(schema, records);
        self
    }

    pub fn insert(&self, schema: &'static EntitySchema, records: Vec<Record>) {
        if let Ok(mut map) = self.records.write() {
            map.entry(schema.name).or_default().extend(records);
        }
    }

    fn snapshot(&self, schema: &EntitySchema) -> Vec<Record> {
        self.records
            .read()
            .map(|map| map.get(schema.name).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
}

fn as_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(record: &Record, condition: &Condition) -> bool {
    let value = record.get(condition.field()).and_then(as_text);
    match condition {
        Condition::Equals { value: expected, .. } => value.as_deref() == Some(expected.as_str()),
        Condition::OneOf { values, .. } => value.is_some_and(|v| values.contains(&v)),
        Condition::Since { at, .. } => value
            .and_then(|v| parse_datetime(&v))
            .is_some_and(|v| v >= *at),
        Condition::Until { at, .. } => value
            .and_then(|v| parse_datetime(&v))
            .is_some_and(|v| v <= *at),
    }
}

fn compare_identity(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(JsonValue::Number(x)), Some(JsonValue::Number(y))) => {
            x.as_i64().unwrap_or_default().cmp(&y.as_i64().unwrap_or_default())
        }
        (Some(JsonValue::String(x)), Some(JsonValue::String(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Record>> {
        let identity = request.schema.identity.public;
        let mut records: Vec<Record> = self
            .snapshot(request.schema)
            .into_iter()
            .filter(|r| request.conditions.iter().all(|c| matches(r, c)))
            .filter(|r| request.before.as_ref().map_or(true, |p| p.admits(r)))
            .collect();

        records.sort_by(|a, b| {
            let ord = compare_identity(a.get(identity), b.get(identity));
            match request.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        if let Some(limit) = request.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn distinct(&self, schema: &'static EntitySchema, field: &str) -> Result<Vec<JsonValue>> {
        let mut values: Vec<JsonValue> = Vec::new();
        for record in self.snapshot(schema) {
            if let Some(value) = record.get(field).filter(|v| !v.is_null()) {
                if !values.contains(value) {
                    values.push(value.clone());
                }
            }
        }
        values.sort_by_key(|v| match v {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        });
        Ok(values)
    }
}
