//! Request body parsing and validation

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};

/// JSON type expected for a body field
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Boolean,
    /// Nested object with its own fields
    Object(&'static [Field]),
    Any,
}

impl FieldKind {
    fn name(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Boolean => "boolean",
            FieldKind::Object(_) => "object",
            FieldKind::Any => "any",
        }
    }

    fn matches(self, value: &JsonValue) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Boolean => value.is_boolean(),
            FieldKind::Object(_) => value.is_object(),
            FieldKind::Any => true,
        }
    }
}

/// One declared body field
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Shape of a `{ <root>: { ..fields } }` request body
#[derive(Debug, Clone, Copy)]
pub struct BodySchema {
    pub root: &'static str,
    pub fields: &'static [Field],
}

impl BodySchema {
    pub const fn new(root: &'static str, fields: &'static [Field]) -> Self {
        Self { root, fields }
    }

    /// Validate a parsed body and return the object under `root`
    pub fn validate(&self, body: &JsonValue) -> Result<JsonObject> {
        let outer = body
            .as_object()
            .ok_or_else(|| Error::schema(format!("{body} is not of type 'object'")))?;
        let inner = outer
            .get(self.root)
            .ok_or_else(|| Error::schema(format!("'{}' is a required property", self.root)))?;
        let inner = inner
            .as_object()
            .ok_or_else(|| Error::schema(format!("{inner} is not of type 'object'")))?;

        check_fields(inner, self.fields)?;
        Ok(inner.clone())
    }
}

fn check_fields(object: &JsonObject, fields: &[Field]) -> Result<()> {
    for field in fields {
        match object.get(field.name) {
            None | Some(JsonValue::Null) if field.required => {
                return Err(Error::schema(format!(
                    "'{}' is a required property",
                    field.name
                )));
            }
            None | Some(JsonValue::Null) => {}
            Some(value) => {
                if !field.kind.matches(value) {
                    return Err(Error::schema(format!(
                        "{value} is not of type '{}'",
                        field.kind.name()
                    )));
                }
                if let (FieldKind::Object(nested), Some(inner)) = (field.kind, value.as_object()) {
                    check_fields(inner, nested)?;
                }
            }
        }
    }
    Ok(())
}

/// Parse a raw body as JSON
pub fn parse_json(body: &[u8]) -> Result<JsonValue> {
    serde_json::from_slice(body).map_err(|_| Error::InvalidBody {
        description: "Could not properly parse the provided data as JSON".to_string(),
    })
}

/// Parse a raw body and validate it against `schema`
pub fn parse_body(body: &[u8], schema: &BodySchema) -> Result<JsonObject> {
    schema.validate(&parse_json(body)?)
}
