//! Result projection
//!
//! Narrows backend records to the requested fields. The identity field is
//! always carried in the narrow case because the paginator needs it to
//! compute the next cursor; in the full-record case internal artifacts are
//! removed instead.

use crate::types::{JsonValue, Record};

/// What to keep from each record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// Requested fields; empty means the full record
    pub fields: Vec<String>,
    /// Field the collection is ordered and paginated by
    pub identity: String,
    /// Keep the identity in full records too
    pub identity_is_public: bool,
    /// Backend artifacts never shown in full records
    pub internal: Vec<String>,
    /// Collapse records equal on the projected fields
    pub unique: bool,
}

impl Projection {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        self.fields = fields.iter().map(|f| f.as_ref().to_string()).collect();
        self
    }

    #[must_use]
    pub fn internal(mut self, keys: &[&str]) -> Self {
        self.internal = keys.iter().map(|k| (*k).to_string()).collect();
        self
    }

    #[must_use]
    pub fn public_identity(mut self) -> Self {
        self.identity_is_public = true;
        self
    }

    /// Collapse records that are equal after projection, keeping the first
    ///
    /// Part of the projector contract for narrow listings; no gateway route
    /// asks for it today.
    #[must_use]
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn is_narrow(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Apply to one record
    pub fn apply(&self, record: &Record) -> Record {
        if self.is_narrow() {
            let mut out = Record::new();
            for field in &self.fields {
                let value = record.get(field).cloned().unwrap_or(JsonValue::Null);
                out.insert(field.clone(), value);
            }
            if let Some(id) = record.get(&self.identity) {
                out.insert(self.identity.clone(), id.clone());
            }
            out
        } else {
            record
                .iter()
                .filter(|(k, _)| !self.internal.iter().any(|i| i == *k))
                .filter(|(k, _)| self.identity_is_public || **k != self.identity)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        }
    }
}

/// Project every record, preserving order
pub fn project(records: &[Record], projection: &Projection) -> Vec<Record> {
    let projected = records.iter().map(|r| projection.apply(r));
    if !projection.unique {
        return projected.collect();
    }

    let mut seen: Vec<Record> = Vec::new();
    let mut out = Vec::new();
    for record in projected {
        let key: Record = record
            .iter()
            .filter(|(k, _)| **k != projection.identity)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if !seen.contains(&key) {
            seen.push(key);
            out.push(record);
        }
    }
    out
}
