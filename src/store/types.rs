//! Source seam and fetch requests

use crate::cursor::CursorPredicate;
use crate::entity::EntitySchema;
use crate::error::Result;
use crate::query::DateRange;
use crate::types::{JsonValue, Record, SortOrder};
use async_trait::async_trait;
use chrono::NaiveDateTime;

/// A constraint on one public field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Field equals value, compared as text
    Equals { field: String, value: String },
    /// Field equals one of the values; an empty list matches nothing
    OneOf { field: String, values: Vec<String> },
    /// Field is at or after the instant
    Since { field: String, at: NaiveDateTime },
    /// Field is at or before the instant
    Until { field: String, at: NaiveDateTime },
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals { field, .. }
            | Condition::OneOf { field, .. }
            | Condition::Since { field, .. }
            | Condition::Until { field, .. } => field,
        }
    }
}

/// One bounded read against an entity
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub schema: &'static EntitySchema,
    pub conditions: Vec<Condition>,
    /// Cursor predicate on the identity column
    pub before: Option<CursorPredicate>,
    /// Maximum rows; `None` reads everything that matches
    pub limit: Option<usize>,
    pub order: SortOrder,
}

impl FetchRequest {
    pub fn new(schema: &'static EntitySchema) -> Self {
        Self {
            schema,
            conditions: Vec::new(),
            before: None,
            limit: None,
            order: SortOrder::default(),
        }
    }

    #[must_use]
    pub fn equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.push(Condition::Equals {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    #[must_use]
    pub fn one_of(mut self, field: impl Into<String>, values: Vec<String>) -> Self {
        self.conditions.push(Condition::OneOf {
            field: field.into(),
            values,
        });
        self
    }

    /// Add the bounds of a date range that are present
    #[must_use]
    pub fn within(mut self, range: &DateRange) -> Self {
        if let Some(at) = range.start {
            self.conditions.push(Condition::Since {
                field: range.field.clone(),
                at,
            });
        }
        if let Some(at) = range.end {
            self.conditions.push(Condition::Until {
                field: range.field.clone(),
                at,
            });
        }
        self
    }

    #[must_use]
    pub fn before(mut self, predicate: Option<CursorPredicate>) -> Self {
        self.before = predicate;
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }
}

/// Where records come from
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Matching records, ordered by identity, renamed to public fields
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Record>>;

    /// Distinct non-null values of one public field
    async fn distinct(&self, schema: &'static EntitySchema, field: &str) -> Result<Vec<JsonValue>>;
}
