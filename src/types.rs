//! Common types used throughout the gateways
//!
//! Shared type aliases and small value types used across the query,
//! pagination, store and gateway modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single record as returned by a backend, keyed by field name
pub type Record = JsonObject;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// Ordered query-string pairs, as received
pub type QueryPairs = Vec<(String, String)>;

// ============================================================================
// Ordering
// ============================================================================

/// Sort direction on the identity column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    /// Backend-native pagination order
    #[default]
    Descending,
}

impl SortOrder {
    /// SQL keyword for this direction
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

// ============================================================================
// Links
// ============================================================================

/// A `{href, rel}` pagination link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

impl Link {
    /// Link to the current page
    pub fn self_link(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: "self".to_string(),
        }
    }

    /// Link to the following page
    pub fn next(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: "next".to_string(),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Drop keys whose value is JSON null
pub fn without_nulls(record: Record) -> Record {
    record.into_iter().filter(|(_, v)| !v.is_null()).collect()
}

/// Copy of `record` without the listed keys
pub fn without_keys(record: &Record, keys: &[&str]) -> Record {
    record
        .iter()
        .filter(|(k, _)| !keys.contains(&k.as_str()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sort_order_sql() {
        assert_eq!(SortOrder::default().as_sql(), "DESC");
        assert_eq!(SortOrder::Ascending.as_sql(), "ASC");
    }

    #[test]
    fn test_link_serialization() {
        let link = Link::next("http://gw/api/symptom?offset=5");
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value, json!({"href": "http://gw/api/symptom?offset=5", "rel": "next"}));
    }

    #[test]
    fn test_without_nulls_and_keys() {
        let record = json!({"a": 1, "b": null, "c": "x"});
        let record = record.as_object().unwrap().clone();

        let cleaned = without_nulls(record.clone());
        assert_eq!(cleaned.len(), 2);
        assert!(!cleaned.contains_key("b"));

        let stripped = without_keys(&record, &["a", "c"]);
        assert_eq!(stripped.len(), 1);
        assert!(record.contains_key("a"));
    }
}
