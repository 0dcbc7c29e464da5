use crate::entity::{Entity, EntityMetadata};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::any::{type_name, TypeId};
use std::ops::Deref;
use std::sync::Arc;

/// Shared, immutable view of one entity's metadata.
///
/// Obtained from a [`MetadataRegistry`] and passed explicitly to
/// [`crate::Service::new`].
#[derive(Debug, Clone)]
pub struct MetadataHandle(Arc<EntityMetadata>);

impl MetadataHandle {
    pub fn new(metadata: EntityMetadata) -> Self {
        Self(Arc::new(metadata))
    }
}

impl Deref for MetadataHandle {
    type Target = EntityMetadata;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for MetadataHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

/// Entity metadata keyed by entity type.
///
/// Registration happens once per type; the first registration wins and later
/// attempts return the existing handle.
#[derive(Default)]
pub struct MetadataRegistry {
    inner: DashMap<TypeId, MetadataHandle>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metadata` for `E`.
    pub fn register<E: Entity>(&self, metadata: EntityMetadata) -> MetadataHandle {
        match self.inner.entry(TypeId::of::<E>()) {
            Entry::Occupied(existing) => {
                let handle = existing.get().clone();
                if *handle != metadata {
                    tracing::warn!(
                        entity = handle.name(),
                        rust_type = type_name::<E>(),
                        "Entity metadata already registered, ignoring new registration"
                    );
                }
                handle
            }
            Entry::Vacant(slot) => {
                tracing::debug!(entity = metadata.name(), table = metadata.table(), "Registered entity metadata");
                slot.insert(MetadataHandle::new(metadata)).clone()
            }
        }
    }

    /// Look up the metadata registered for `E`.
    pub fn resolve<E: Entity>(&self) -> Option<MetadataHandle> {
        self.inner.get(&TypeId::of::<E>()).map(|h| h.clone())
    }

    /// Look up `E`, registering [`Entity::metadata`] on first use.
    pub fn resolve_or_register<E: Entity>(&self) -> MetadataHandle {
        if let Some(handle) = self.resolve::<E>() {
            return handle;
        }
        self.register::<E>(E::metadata())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
