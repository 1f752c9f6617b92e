use crate::error::{code, Error, Result};
use crate::types::{JsonValue, Record};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

const OBJECT_ID_LEN: usize = 24;

/// Shape of the identifiers a collection is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorKind {
    /// 24 hex characters, ordered lexicographically
    ObjectId,
    /// Signed 64-bit row identifier
    RowId,
}

/// A decoded identity value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorValue {
    Text(String),
    Integer(i64),
}

impl CursorValue {
    /// Bind form for parameterized SQL
    pub fn to_sql_param(&self) -> String {
        match self {
            CursorValue::Text(s) => s.clone(),
            CursorValue::Integer(i) => i.to_string(),
        }
    }

    /// Compare against a record's identity value
    ///
    /// Returns `None` when the value has an incompatible shape.
    pub fn compare(&self, value: &JsonValue) -> Option<Ordering> {
        match (self, value) {
            (CursorValue::Text(c), JsonValue::String(v)) => Some(v.as_str().cmp(c.as_str())),
            (CursorValue::Integer(c), JsonValue::Number(n)) => n.as_i64().map(|v| v.cmp(c)),
            (CursorValue::Integer(c), JsonValue::String(s)) => {
                s.parse::<i64>().ok().map(|v| v.cmp(c))
            }
            _ => None,
        }
    }
}

/// "Identity strictly less than value"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorPredicate {
    pub field: String,
    pub before: CursorValue,
}

impl CursorPredicate {
    /// Whether a record lies after the cursor in descending order
    pub fn admits(&self, record: &Record) -> bool {
        record
            .get(&self.field)
            .and_then(|v| self.before.compare(v))
            .is_some_and(|ord| ord == Ordering::Less)
    }
}

/// Encodes and decodes cursors for one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CursorCodec {
    kind: CursorKind,
    identity: String,
}

impl CursorCodec {
    pub fn new(kind: CursorKind, identity: impl Into<String>) -> Self {
        Self {
            kind,
            identity: identity.into(),
        }
    }

    pub fn kind(&self) -> CursorKind {
        self.kind
    }

    /// Field holding the identity
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Cursor pointing at `last`
    pub fn encode(&self, last: &Record) -> Result<String> {
        match last.get(&self.identity) {
            Some(JsonValue::String(s)) => Ok(s.clone()),
            Some(JsonValue::Number(n)) => Ok(n.to_string()),
            _ => Err(Error::Other(format!(
                "record has no usable '{}' identity for pagination",
                self.identity
            ))),
        }
    }

    /// Predicate selecting records strictly before `cursor`
    pub fn decode(&self, cursor: &str) -> Result<CursorPredicate> {
        let before = match self.kind {
            CursorKind::ObjectId => {
                if cursor.len() != OBJECT_ID_LEN || !cursor.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(malformed(cursor));
                }
                CursorValue::Text(cursor.to_ascii_lowercase())
            }
            CursorKind::RowId => CursorValue::Integer(cursor.parse().map_err(|_| malformed(cursor))?),
        };

        Ok(CursorPredicate {
            field: self.identity.clone(),
            before,
        })
    }
}

fn malformed(cursor: &str) -> Error {
    Error::bad_request(
        "Invalid Parameter",
        format!("Offset '{cursor}' is not a valid pagination cursor"),
        code::INVALID_CURSOR,
    )
}
