//! Entity reference tracker.

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::lazy::Bound;
use crate::lifetime::Lifetime;
use crate::provider::Container;
use crate::schema::{InjectionStrategy, TypeSchema};
use crate::traits::{Component, LifecycleCause, Persistable};

use super::path::{PathSegment, PropertyPath};
use super::value::Value;
use super::{
    CollaboratorRecord, EntityRef, EntityReferenceRecord, EntityReferences, LookupError, ENTITY_REFERENCES_PROPERTY,
};

fn is_detachable(entity: &EntityRef) -> bool {
    entity.is_unresolved_proxy() || !entity.is_new()
}

fn detach(value: &mut Value, path: PropertyPath, entity: &EntityRef, table: &mut EntityReferences) {
    table.push(EntityReferenceRecord {
        path,
        entity_type: entity.entity_type().to_string(),
        identifier: entity.identifier(),
        persisted: !entity.is_new(),
    });
    *value = Value::Null;
}

/// Nulls out detachable entities anywhere below `value`, recording each by path.
fn detach_nested(value: &mut Value, path: &PropertyPath, table: &mut EntityReferences) {
    match value {
        Value::Entity(entity) if is_detachable(entity) => {
            let entity = entity.clone();
            detach(value, path.clone(), &entity, table);
        }
        Value::Seq(items) | Value::Set(items) => {
            for (index, item) in items.iter_mut().enumerate() {
                detach_nested(item, &path.child(PathSegment::Index(index)), table);
            }
        }
        Value::Map(map) => {
            for (key, item) in map.iter_mut() {
                detach_nested(item, &path.child(PathSegment::Key(key.clone())), table);
            }
        }
        _ => {}
    }
}

fn property_of<'o, T: Persistable>(object: &'o mut T, schema: &TypeSchema, property: &str) -> DiResult<&'o mut Value> {
    object.property_mut(property).ok_or_else(|| DiError::UnknownSlot {
        type_name: schema.type_name(),
        slot: property.to_string(),
    })
}

/// Keeps the records of an earlier preparation whose location still holds `Null`.
fn still_detached<T: Persistable>(object: &T, previous: EntityReferences) -> EntityReferences {
    let holds_null = |property: &str, segments: &[PathSegment]| {
        object
            .property(property)
            .and_then(|value| value.get_at(segments))
            .map_or(false, Value::is_null)
    };

    let mut table = EntityReferences::new();
    for record in previous.records {
        if holds_null(record.path.property(), record.path.segments()) {
            table.push(record);
        }
    }
    for record in previous.collaborators {
        if holds_null(&record.property, &[]) {
            table.push_collaborator(record);
        }
    }
    table
}

impl Container {
    /// `true` for collaborators that are re-injected on restore instead of serialized.
    fn is_reinjected(&self, identity: &ServiceId, bound: &Bound) -> bool {
        bound.is_proxy() || self.lifetime_of(identity) == Some(Lifetime::Singleton)
    }

    /// Detaches entity references from `object` and returns the names to serialize.
    ///
    /// Persisted entities and unresolved entity proxies are replaced by records
    /// in the object's side table. Top-level entity properties are left out of
    /// the returned list; container properties stay in it with their entity
    /// elements nulled. Singleton collaborators and pending lazy proxies are
    /// left out and remembered by identity so restore can rebind them.
    /// Transient properties are skipped.
    ///
    /// Records left by an earlier preparation are kept while their location
    /// still holds `Null`, so preparing twice loses nothing; stale ones are
    /// discarded.
    pub fn prepare_for_serialization<T: Component + Persistable>(&self, object: &mut T) -> DiResult<Vec<String>> {
        let schema = self.schema_of::<T>();
        let previous = std::mem::take(object.entity_references_mut());
        let mut table = still_detached(&*object, previous);
        let carried = table.records().len();

        let mut names = Vec::new();

        for property in schema.properties() {
            if schema.is_transient(property.name) {
                continue;
            }
            let value = object.property_mut(property.name).ok_or_else(|| DiError::UnknownSlot {
                type_name: schema.type_name(),
                slot: property.name.to_string(),
            })?;
            let path = PropertyPath::new(property.name);

            match value {
                Value::Entity(entity) if is_detachable(entity) => {
                    let entity = entity.clone();
                    detach(value, path, &entity, &mut table);
                }
                Value::Null if table.replaces(property.name) => {}
                Value::Service { identity, bound } => {
                    if self.is_reinjected(identity, bound) {
                        table.push_collaborator(CollaboratorRecord {
                            property: property.name.to_string(),
                            identity: identity.clone(),
                        });
                    } else {
                        names.push(property.name.to_string());
                    }
                }
                _ => {
                    detach_nested(value, &path, &mut table);
                    names.push(property.name.to_string());
                }
            }
        }

        for (name, identity, _) in schema.service_slots() {
            let cell = object.slot(name).ok_or_else(|| DiError::UnknownSlot {
                type_name: schema.type_name(),
                slot: name.to_string(),
            })?;
            match cell.bound() {
                Some(bound) if !self.is_reinjected(identity, &bound) => names.push(name.to_string()),
                _ => {}
            }
        }

        let detached = table.records().len() - carried;
        if detached > 0 {
            tracing::debug!(type_name = schema.type_name(), count = detached, "detached entity references");
            let observers = &self.inner().observers;
            if observers.has_observers() {
                observers.entities_detached(schema.type_name(), detached);
            }
        }
        if !table.is_empty() {
            names.push(ENTITY_REFERENCES_PROPERTY.to_string());
        }
        *object.entity_references_mut() = table;

        Ok(names)
    }

    /// Reattaches detached entities, then re-runs injection and the post-construction hook.
    ///
    /// Records are restored in order. The first one that cannot be resolved
    /// aborts the restore and leaves the object partially restored; the side
    /// table is only cleared once every record was written back. Collaborator
    /// properties dropped by preparation are bound again the way a lazy slot
    /// would be.
    ///
    /// # Errors
    ///
    /// [`DiError::DanglingEntityReference`] when the lookup reports an entity as
    /// missing, [`DiError::Persistence`] for any other lookup failure or when no
    /// lookup is configured, [`DiError::InvalidPropertyPath`] for a record whose
    /// path cannot be written.
    pub fn restore_after_deserialization<T: Component + Persistable>(&self, object: &mut T) -> DiResult<()> {
        let schema = self.schema_of::<T>();

        let records = object.entity_references().records().to_vec();
        if !records.is_empty() {
            let lookup = self
                .inner()
                .persistence
                .clone()
                .ok_or_else(|| DiError::Persistence("no persistence lookup configured".into()))?;

            for record in &records {
                let entity = lookup
                    .resolve_entity(&record.entity_type, &record.identifier)
                    .map_err(|err| match err {
                        LookupError::NotFound => DiError::DanglingEntityReference {
                            entity_type: record.entity_type.clone(),
                            identifier: record.identifier.clone(),
                            path: record.path.to_string(),
                        },
                        LookupError::Failed(reason) => DiError::Persistence(reason),
                    })?;

                let target = property_of(object, &schema, record.path.property())?;
                target
                    .set_at(record.path.segments(), Value::Entity(entity))
                    .map_err(|err| match err {
                        DiError::InvalidPropertyPath { reason, .. } => {
                            DiError::InvalidPropertyPath { path: record.path.to_string(), reason }
                        }
                        other => other,
                    })?;
            }
        }

        let collaborators = object.entity_references().collaborators().to_vec();
        for record in &collaborators {
            let bound =
                self.bound_for(schema.type_name(), &record.property, &record.identity, InjectionStrategy::Lazy)?;
            *property_of(object, &schema, &record.property)? = Value::Service {
                identity: record.identity.clone(),
                bound,
            };
        }

        object.entity_references_mut().clear();
        if !records.is_empty() {
            tracing::debug!(type_name = schema.type_name(), count = records.len(), "restored entity references");
            let observers = &self.inner().observers;
            if observers.has_observers() {
                observers.entities_restored(schema.type_name(), records.len());
            }
        }

        self.inject_settings(&*object, &schema)?;
        self.bind_collaborators(&*object, &schema)?;
        object.initialize(LifecycleCause::Recreated)
    }
}
