//! Column and entity declarations

use crate::cursor::{CursorCodec, CursorKind};
use crate::types::{JsonValue, Record};

/// Storage type of a declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Integer,
    Float,
    Boolean,
    Timestamp,
    /// JSON text holding a nested value
    Json,
    /// JSON text holding an object whose keys are merged into the record
    Document,
}

impl ColumnKind {
    /// DuckDB type used when binding parameters against this column
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnKind::Integer => "BIGINT",
            ColumnKind::Float => "DOUBLE",
            ColumnKind::Boolean => "BOOLEAN",
            ColumnKind::Timestamp => "TIMESTAMP",
            ColumnKind::Text | ColumnKind::Json | ColumnKind::Document => "VARCHAR",
        }
    }
}

/// One public field and the backend column behind it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub public: &'static str,
    pub backend: &'static str,
    pub kind: ColumnKind,
    /// Absent columns are tolerated at schema validation
    pub optional: bool,
}

impl Column {
    pub const fn new(public: &'static str, backend: &'static str, kind: ColumnKind) -> Self {
        Self {
            public,
            backend,
            kind,
            optional: false,
        }
    }

    pub const fn text(public: &'static str, backend: &'static str) -> Self {
        Self::new(public, backend, ColumnKind::Text)
    }

    #[must_use]
    pub const fn optional(self) -> Self {
        Self {
            optional: true,
            ..self
        }
    }
}

/// Declared description of one backend entity
#[derive(Debug, PartialEq, Eq)]
pub struct EntitySchema {
    /// Logical name, also the key for table-name overrides
    pub name: &'static str,
    /// Default table name
    pub table: &'static str,
    pub identity: Column,
    pub cursor: CursorKind,
    /// Mapping table: public field name to backend column
    pub columns: &'static [Column],
    /// Column carrying the event state, outside the mapping table
    pub state: Option<Column>,
    /// Join column for child entities, outside the mapping table
    pub foreign_key: Option<Column>,
}

impl EntitySchema {
    /// Every declared column, identity first, without duplicates
    pub fn all_columns(&self) -> Vec<&Column> {
        let mut out: Vec<&Column> = vec![&self.identity];
        for column in self
            .columns
            .iter()
            .chain(self.state.iter())
            .chain(self.foreign_key.iter())
        {
            if !out.iter().any(|c| c.backend == column.backend) {
                out.push(column);
            }
        }
        out
    }

    /// Declared column for a public field name
    pub fn column(&self, public: &str) -> Option<&Column> {
        self.all_columns().into_iter().find(|c| c.public == public)
    }

    /// Declared column for a backend column name
    pub fn column_by_backend(&self, backend: &str) -> Option<&Column> {
        self.all_columns().into_iter().find(|c| c.backend == backend)
    }

    /// Whether `public` is part of the mapping table
    pub fn maps(&self, public: &str) -> bool {
        self.columns.iter().any(|c| c.public == public)
    }

    pub fn codec(&self) -> CursorCodec {
        CursorCodec::new(self.cursor, self.identity.public)
    }

    /// Required backend columns missing from `actual`
    pub fn missing_columns<S: AsRef<str>>(&self, actual: &[S]) -> Vec<&'static str> {
        self.all_columns()
            .into_iter()
            .filter(|c| !c.optional)
            .filter(|c| !actual.iter().any(|a| a.as_ref().eq_ignore_ascii_case(c.backend)))
            .map(|c| c.backend)
            .collect()
    }

    /// New record with backend column names replaced by public names
    ///
    /// Unmapped keys pass through unchanged; document columns are merged
    /// into the record.
    pub fn rename_row(&self, row: &Record) -> Record {
        let mut out = Record::new();
        for (key, value) in row {
            match self.column_by_backend(key) {
                Some(column) if column.kind == ColumnKind::Document => {
                    if let JsonValue::Object(doc) = value {
                        for (k, v) in doc {
                            out.entry(k.clone()).or_insert_with(|| v.clone());
                        }
                    }
                }
                Some(column) => {
                    out.insert(column.public.to_string(), value.clone());
                }
                None => {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        out
    }
}
