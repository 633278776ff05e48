//! The record-side contract implemented by `#[derive(GraphEntity)]`.

use serde_json::Value as JsonValue;
use thiserror::Error;

/// A record type that can be stored as a graph node.
///
/// Implementations are generated by `#[derive(GraphEntity)]`; the schema
/// carries the label override and the per-field directive strings, and the
/// field accessors encode and decode values through serde.
pub trait GraphEntity: Default + Send + Sync + 'static {
    /// Declared mapping of the type.
    fn schema() -> TypeSchema;

    /// Encodes the named field.
    fn read_field(&self, field: &str) -> Result<JsonValue, MappingError>;

    /// Decodes `value` into the named field.
    fn write_field(&mut self, field: &str, value: JsonValue) -> Result<(), MappingError>;
}

/// Declared shape of a type, as seen by the metadata resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSchema {
    pub type_name: &'static str,
    /// Label override; `None` means the type name is used.
    pub label: Option<&'static str>,
    pub kind: SchemaKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaKind {
    /// A struct with named fields.
    Record(Vec<FieldSchema>),
    /// Anything without addressable fields.
    Opaque,
}

impl TypeSchema {
    pub fn record(
        type_name: &'static str,
        label: Option<&'static str>,
        fields: Vec<FieldSchema>,
    ) -> Self {
        Self {
            type_name,
            label,
            kind: SchemaKind::Record(fields),
        }
    }

    pub fn opaque(type_name: &'static str) -> Self {
        Self {
            type_name,
            label: None,
            kind: SchemaKind::Opaque,
        }
    }
}

/// One annotated field and its raw directive string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: &'static str,
    pub directive: &'static str,
}

impl FieldSchema {
    pub fn new(name: &'static str, directive: &'static str) -> Self {
        Self { name, directive }
    }
}

/// Field encode/decode failures.
#[derive(Error, Debug)]
pub enum MappingError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("cannot encode field '{field}': {source}")]
    Encode {
        field: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot decode field '{field}': {source}")]
    Decode {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}
