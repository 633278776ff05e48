//! Record-to-node mapping: declared schemas, derived metadata and its cache.

mod cache;
mod entity;
mod metadata;

pub use cache::MetadataCache;
pub use entity::{FieldSchema, GraphEntity, MappingError, SchemaKind, TypeSchema};
pub use metadata::{EntityMetadata, MetadataError};
