//! Per-type metadata cache.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::mapping::entity::GraphEntity;
use crate::mapping::metadata::{EntityMetadata, MetadataError};

/// Caches [`EntityMetadata`] per record type.
///
/// Entries are created on first use and never mutated or evicted. Resolution
/// runs outside the lock; when two callers race on the same type, the first
/// insert wins and both receive the stored entry.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<TypeId, Arc<EntityMetadata>>>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns cached metadata for `T`, resolving it on first use.
    pub fn get_or_resolve<T: GraphEntity>(&self) -> Result<Arc<EntityMetadata>, MetadataError> {
        if let Some(cached) = self.get::<T>() {
            return Ok(cached);
        }

        tracing::debug!(entity = type_name::<T>(), "resolving entity metadata");
        let resolved = Arc::new(EntityMetadata::for_type::<T>()?);

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(entries
            .entry(TypeId::of::<T>())
            .or_insert(resolved)
            .clone())
    }

    /// Returns cached metadata for `T` without resolving.
    pub fn get<T: GraphEntity>(&self) -> Option<Arc<EntityMetadata>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&TypeId::of::<T>())
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
