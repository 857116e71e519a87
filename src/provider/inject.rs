//! Dependency injector.

use serde_json::Value as Json;

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::lazy::Bound;
use crate::lifetime::Lifetime;
use crate::schema::{InjectionStrategy, TypeSchema};
use crate::traits::{Component, Injectable, ResolverCore};

use super::Container;

impl Container {
    /// Populates every declared slot of `object`.
    ///
    /// Settings slots are injected first, then collaborators in declaration
    /// order. A collaborator is bound to the cached instance when one exists,
    /// otherwise to a lazy proxy (lazy slots with a non-prototype target) or to
    /// a freshly resolved instance (eager slots and prototype targets).
    pub fn inject_dependencies<T: Component>(&self, object: &T) -> DiResult<()> {
        let schema = self.schema_of::<T>();
        self.inject_into(object, &schema)
    }

    pub(crate) fn inject_into(&self, object: &dyn Injectable, schema: &TypeSchema) -> DiResult<()> {
        self.inject_settings(object, schema)?;
        self.bind_collaborators(object, schema)
    }

    /// Hands each settings slot its configuration value; a missing path yields `null`.
    pub(crate) fn inject_settings(&self, object: &dyn Injectable, schema: &TypeSchema) -> DiResult<()> {
        for (slot, path) in schema.settings_slots() {
            match self.settings().get(path) {
                Some(value) => object.inject_settings(slot, value)?,
                None => object.inject_settings(slot, &Json::Null)?,
            }
        }
        Ok(())
    }

    /// Binds every collaborator slot; also used to rebind after restore.
    pub(crate) fn bind_collaborators(&self, object: &dyn Injectable, schema: &TypeSchema) -> DiResult<()> {
        for (name, identity, strategy) in schema.service_slots() {
            let cell = object.slot(name).ok_or_else(|| DiError::UnknownSlot {
                type_name: schema.type_name(),
                slot: name.to_string(),
            })?;
            let bound = self.bound_for(schema.type_name(), name, identity, strategy)?;
            cell.bind(bound);
        }
        Ok(())
    }

    pub(crate) fn bound_for(
        &self,
        owner: &str,
        slot: &str,
        identity: &ServiceId,
        strategy: InjectionStrategy,
    ) -> DiResult<Bound> {
        if let Some(instance) = self.instance_any(identity) {
            return Ok(Bound::Resolved(instance));
        }

        // a shared proxy would hand one prototype to every owner
        let lazy = strategy == InjectionStrategy::Lazy
            && self.lifetime_of(identity) != Some(Lifetime::Prototype);
        if !lazy {
            return self.resolve_any(identity).map(Bound::Resolved);
        }

        Ok(Bound::Pending(self.lazy_dependency(owner, slot, identity)))
    }
}
