//! Query types
//!
//! Raw and normalized representations of an inbound query string.

use crate::types::QueryPairs;
use chrono::NaiveDateTime;

/// A query parameter value as delivered by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// The key appeared once
    Single(String),
    /// The key appeared several times
    Multiple(Vec<String>),
}

impl ParamValue {
    /// All values, in arrival order
    pub fn values(&self) -> Vec<&str> {
        match self {
            ParamValue::Single(v) => vec![v.as_str()],
            ParamValue::Multiple(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    /// First value
    pub fn first(&self) -> Option<&str> {
        match self {
            ParamValue::Single(v) => Some(v.as_str()),
            ParamValue::Multiple(vs) => vs.first().map(String::as_str),
        }
    }
}

/// Query string exactly as received, decoded but not interpreted
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    pairs: QueryPairs,
}

impl RawQuery {
    /// Decode a raw `a=1&b=2` query string
    pub fn parse(query: Option<&str>) -> Self {
        let pairs = query
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .map(|(k, v)| (k.into_owned(), v.into_owned()))
                    .collect()
            })
            .unwrap_or_default();
        Self { pairs }
    }

    /// Build from already-decoded pairs
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value(s) for a key, grouped the way the transport delivered them
    pub fn get(&self, key: &str) -> Option<ParamValue> {
        let mut values: Vec<String> = self
            .pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .collect();
        match values.len() {
            0 => None,
            1 => values.pop().map(ParamValue::Single),
            _ => Some(ParamValue::Multiple(values)),
        }
    }

    /// First value for a key
    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the key is present at all
    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Distinct keys in first-arrival order
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for (k, _) in &self.pairs {
            if !keys.contains(&k.as_str()) {
                keys.push(k.as_str());
            }
        }
        keys
    }

    /// All pairs in arrival order
    pub fn pairs(&self) -> &QueryPairs {
        &self.pairs
    }

    /// Pairs without the given keys, order preserved
    pub fn without(&self, keys: &[&str]) -> QueryPairs {
        self.pairs
            .iter()
            .filter(|(k, _)| !keys.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    /// Copy with `key` set to `value`, replacing any previous values
    #[must_use]
    pub fn with(&self, key: &str, value: impl Into<String>) -> Self {
        let mut pairs = self.without(&[key]);
        pairs.push((key.to_string(), value.into()));
        Self { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Inclusive date-time bounds on one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub field: String,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// Default and ceiling for `limit` on one endpoint family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default: usize,
    pub max: usize,
}

impl LimitPolicy {
    /// Document-store listings
    pub const DOCUMENTS: LimitPolicy = LimitPolicy::new(999, 999);
    /// Symptom and TAL listings
    pub const SYMPTOMS: LimitPolicy = LimitPolicy::new(9999, 9999);
    /// Relational topology listings
    pub const TOPOLOGY: LimitPolicy = LimitPolicy::new(999, 9999);
    /// Monasca listings, which page on their own
    pub const MONASCA: LimitPolicy = LimitPolicy::new(5, 10000);

    pub const fn new(default: usize, max: usize) -> Self {
        Self { default, max }
    }
}

/// A normalized query, independent of backend encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    /// Equality constraints, in arrival order; later duplicates win
    pub search_by: Vec<(String, String)>,
    /// Fields to project, deduplicated in arrival order
    pub filter: Vec<String>,
    pub date_ranges: Vec<DateRange>,
    /// Always positive
    pub limit: usize,
    /// Opaque cursor, decoded later against a collection's cursor kind
    pub cursor: Option<String>,
}

impl QuerySpec {
    /// Spec with no constraints
    pub fn with_limit(limit: usize) -> Self {
        Self {
            search_by: Vec::new(),
            filter: Vec::new(),
            date_ranges: Vec::new(),
            limit,
            cursor: None,
        }
    }

    /// Search value for a field
    pub fn search(&self, field: &str) -> Option<&str> {
        self.search_by
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace an equality constraint
    #[must_use]
    pub fn and_search(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        self.search_by.retain(|(k, _)| *k != field);
        self.search_by.push((field, value.into()));
        self
    }

    /// Replace the projection list
    #[must_use]
    pub fn project(mut self, fields: &[&str]) -> Self {
        self.filter = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }
}
