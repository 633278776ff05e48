//! Entity metadata derived from a type's declared schema.

use indexmap::IndexMap;
use thiserror::Error;

use crate::graph::is_identifier;
use crate::mapping::entity::{GraphEntity, SchemaKind, TypeSchema};

/// Errors raised while deriving metadata. Never retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("field '{field}' is missing a 'property:' directive")]
    MissingPropertyName { field: String },

    #[error("no primary key ('pk') declared for {type_name}")]
    MissingPrimaryKey { type_name: String },

    #[error("{type_name} declares more than one primary key: '{first}' and '{second}'")]
    DuplicatePrimaryKey {
        type_name: String,
        first: String,
        second: String,
    },

    #[error("{type_name} is not a record type")]
    NotARecord { type_name: String },

    #[error("{type_name} maps property '{property}' from more than one field")]
    DuplicateProperty { type_name: String, property: String },

    #[error("field '{field}' maps to '{property}', which is not a valid property name")]
    InvalidPropertyName { field: String, property: String },

    #[error("{type_name} declares label '{label}', which is not a valid label")]
    InvalidLabel { type_name: String, label: String },
}

/// How one record type maps onto graph nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMetadata {
    pub label: String,
    pub primary_key_field: String,
    pub primary_key_property: String,
    /// Field name to property name, in declaration order. Includes the key.
    pub field_to_property: IndexMap<String, String>,
}

impl EntityMetadata {
    /// Derives metadata for `T`.
    pub fn for_type<T: GraphEntity>() -> Result<Self, MetadataError> {
        Self::resolve(&T::schema())
    }

    /// Derives metadata from a declared schema.
    ///
    /// Directives are comma-separated tokens: `pk` marks the primary key and
    /// `property:<name>` names the graph property. Unknown tokens are ignored.
    /// Fields with an empty directive are skipped.
    pub fn resolve(schema: &TypeSchema) -> Result<Self, MetadataError> {
        let SchemaKind::Record(fields) = &schema.kind else {
            return Err(MetadataError::NotARecord {
                type_name: schema.type_name.to_string(),
            });
        };

        let label = match schema.label {
            Some(label) if !label.trim().is_empty() => label.trim().to_string(),
            _ => schema.type_name.to_string(),
        };
        if !is_identifier(&label) {
            return Err(MetadataError::InvalidLabel {
                type_name: schema.type_name.to_string(),
                label,
            });
        }

        let mut field_to_property = IndexMap::new();
        let mut primary_key: Option<(String, String)> = None;

        for field in fields {
            if field.directive.trim().is_empty() {
                continue;
            }
            let directive = parse_directive(field.directive);
            let property = directive
                .property
                .ok_or_else(|| MetadataError::MissingPropertyName {
                    field: field.name.to_string(),
                })?;
            if !is_identifier(&property) {
                return Err(MetadataError::InvalidPropertyName {
                    field: field.name.to_string(),
                    property,
                });
            }

            if field_to_property.values().any(|p: &String| *p == property) {
                return Err(MetadataError::DuplicateProperty {
                    type_name: schema.type_name.to_string(),
                    property,
                });
            }

            if directive.primary_key {
                if let Some((first, _)) = &primary_key {
                    return Err(MetadataError::DuplicatePrimaryKey {
                        type_name: schema.type_name.to_string(),
                        first: first.clone(),
                        second: field.name.to_string(),
                    });
                }
                primary_key = Some((field.name.to_string(), property.clone()));
            }
            field_to_property.insert(field.name.to_string(), property);
        }

        let (primary_key_field, primary_key_property) =
            primary_key.ok_or_else(|| MetadataError::MissingPrimaryKey {
                type_name: schema.type_name.to_string(),
            })?;

        Ok(Self {
            label,
            primary_key_field,
            primary_key_property,
            field_to_property,
        })
    }

    pub fn is_mapped_property(&self, property: &str) -> bool {
        self.field_to_property.values().any(|p| p == property)
    }

    pub fn property_for(&self, field: &str) -> Option<&str> {
        self.field_to_property.get(field).map(String::as_str)
    }

    /// Mapped `(field, property)` pairs other than the primary key.
    pub fn non_key_mappings(&self) -> impl Iterator<Item = (&str, &str)> {
        self.field_to_property
            .iter()
            .filter(move |(field, _)| **field != self.primary_key_field)
            .map(|(field, property)| (field.as_str(), property.as_str()))
    }
}

struct Directive {
    primary_key: bool,
    property: Option<String>,
}

fn parse_directive(raw: &str) -> Directive {
    let mut directive = Directive {
        primary_key: false,
        property: None,
    };
    for token in raw.split(',').map(str::trim) {
        if token == "pk" {
            directive.primary_key = true;
        } else if let Some(name) = token.strip_prefix("property:") {
            let name = name.trim();
            if !name.is_empty() {
                directive.property = Some(name.to_string());
            }
        }
    }
    directive
}
