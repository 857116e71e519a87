//! Persistent entity references and their serialization-time substitutes.
//!
//! Before an object crosses a serialization boundary,
//! [`Container::prepare_for_serialization`](crate::Container::prepare_for_serialization)
//! replaces every reference to an already persisted entity with an
//! [`EntityReferenceRecord`] kept in the object's [`EntityReferences`] side
//! table. [`Container::restore_after_deserialization`](crate::Container::restore_after_deserialization)
//! fetches the entities back through a [`PersistenceLookup`].

use std::any::Any;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::ServiceId;

mod path;
mod tracker;
mod value;

pub use path::{PathSegment, PropertyPath};
pub use value::Value;

/// Property name under which the side table is listed for serialization.
pub const ENTITY_REFERENCES_PROPERTY: &str = "__entityReferences";

/// A persistent domain object with a durable identity.
pub trait Entity: Send + Sync + 'static {
    fn entity_type(&self) -> &str;

    fn identifier(&self) -> String;

    /// `true` for entities that were never saved; those are serialized as-is.
    fn is_new(&self) -> bool {
        false
    }

    /// `true` for lazy or remote stand-ins that have not loaded their data yet.
    fn is_unresolved_proxy(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any;
}

pub type EntityRef = Arc<dyn Entity>;

/// Why a lookup did not produce an entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("entity not found")]
    NotFound,
    #[error("{0}")]
    Failed(String),
}

/// Fetches entities by type and identifier on restore.
///
/// Any `Fn(&str, &str) -> Result<EntityRef, LookupError>` closure is a lookup.
pub trait PersistenceLookup: Send + Sync {
    fn resolve_entity(&self, entity_type: &str, identifier: &str) -> Result<EntityRef, LookupError>;
}

impl<F> PersistenceLookup for F
where
    F: Fn(&str, &str) -> Result<EntityRef, LookupError> + Send + Sync,
{
    fn resolve_entity(&self, entity_type: &str, identifier: &str) -> Result<EntityRef, LookupError> {
        self(entity_type, identifier)
    }
}

/// Serialization-time substitute for one entity reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReferenceRecord {
    pub path: PropertyPath,
    pub entity_type: String,
    pub identifier: String,
    /// `false` when the reference was detached because it was an unloaded proxy of an unsaved entity.
    pub persisted: bool,
}

/// A collaborator property left out of serialization, rebound on restore.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollaboratorRecord {
    pub property: String,
    pub identity: ServiceId,
}

/// Side table of detached references owned by a persistable object.
///
/// Entity records keep the order in which they were detached. Collaborator
/// records name the properties whose singleton or lazily bound service was
/// dropped from serialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReferences {
    #[serde(default)]
    records: Vec<EntityReferenceRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    collaborators: Vec<CollaboratorRecord>,
}

impl EntityReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: EntityReferenceRecord) {
        self.records.push(record);
    }

    pub fn push_collaborator(&mut self, record: CollaboratorRecord) {
        self.collaborators.push(record);
    }

    pub fn records(&self) -> &[EntityReferenceRecord] {
        &self.records
    }

    pub fn collaborators(&self) -> &[CollaboratorRecord] {
        &self.collaborators
    }

    /// Number of entity and collaborator records.
    pub fn len(&self) -> usize {
        self.records.len() + self.collaborators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.collaborators.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.collaborators.clear();
    }

    /// `true` when `property` as a whole was taken out of the object.
    pub(crate) fn replaces(&self, property: &str) -> bool {
        self.records.iter().any(|r| !r.path.is_nested() && r.path.property() == property)
            || self.collaborators.iter().any(|c| c.property == property)
    }
}
