//! Construction recipes and the type catalog.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::lifetime::Lifetime;
use crate::provider::{Container, ResolverContext};
use crate::schema::TypeSchema;

// Type-erased Arc for storage
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type FactoryFn = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<AnyArc> + Send + Sync>;

/// Monomorphized entry into the construction pipeline for one component type.
pub(crate) type ComponentFn =
    Arc<dyn Fn(&Container, &ServiceId, &Registration) -> DiResult<AnyArc> + Send + Sync>;

/// How an identity is turned into an instance.
#[derive(Clone)]
pub(crate) enum Recipe {
    /// A [`Component`](crate::Component) built by the pipeline and injected.
    Component {
        schema: Arc<TypeSchema>,
        arguments: Vec<(String, serde_json::Value)>,
        build: ComponentFn,
    },
    /// A factory closure; its output is not injected.
    Factory(FactoryFn),
    /// A pre-built singleton.
    Instance(AnyArc),
    /// Another identity providing the implementation.
    Alias(ServiceId),
}

/// Service registration with lifetime and recipe
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) lifetime: Lifetime,
    /// Concrete type behind the identity, for diagnostics and proxy type hints
    pub(crate) type_name: &'static str,
    pub(crate) type_id: Option<TypeId>,
    pub(crate) recipe: Recipe,
}

impl Registration {
    pub(crate) fn schema(&self) -> Option<&Arc<TypeSchema>> {
        match &self.recipe {
            Recipe::Component { schema, .. } => Some(schema),
            _ => None,
        }
    }

    /// Configured argument for `parameter`, if the registration carries one.
    pub(crate) fn argument(&self, parameter: &str) -> Option<&serde_json::Value> {
        match &self.recipe {
            Recipe::Component { arguments, .. } => arguments
                .iter()
                .find(|(name, _)| name == parameter)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

/// Type catalog: identity to recipe, plus a reverse index from component types.
#[derive(Clone, Default)]
pub(crate) struct Catalog {
    entries: HashMap<ServiceId, Registration>,
    by_type: HashMap<TypeId, ServiceId>,
}

impl Catalog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the registration for `id`.
    pub(crate) fn insert(&mut self, id: ServiceId, registration: Registration) {
        if let Some(type_id) = registration.type_id {
            if matches!(registration.recipe, Recipe::Component { .. }) {
                self.by_type.entry(type_id).or_insert_with(|| id.clone());
            }
        }
        self.entries.insert(id, registration);
    }

    pub(crate) fn get_mut(&mut self, id: &ServiceId) -> Option<&mut Registration> {
        self.entries.get_mut(id)
    }

    pub(crate) fn contains(&self, id: &ServiceId) -> bool {
        self.entries.contains_key(id)
    }

    /// Follows aliases to the identity that owns the recipe.
    ///
    /// Alias loops are reported as unresolvable.
    pub(crate) fn resolve<'a>(&'a self, id: &ServiceId) -> DiResult<(&'a ServiceId, &'a Registration)> {
        let mut current = id;
        for _ in 0..=self.entries.len() {
            let (key, registration) = self
                .entries
                .get_key_value(current)
                .ok_or_else(|| DiError::UnresolvableService(id.clone()))?;
            match &registration.recipe {
                Recipe::Alias(target) => current = target,
                _ => return Ok((key, registration)),
            }
        }
        Err(DiError::UnresolvableService(id.clone()))
    }

    /// Canonical identity for `id`, or `id` itself when unknown.
    pub(crate) fn canonical<'a>(&'a self, id: &'a ServiceId) -> &'a ServiceId {
        self.resolve(id).map(|(key, _)| key).unwrap_or(id)
    }

    /// First identity registered for the component type `type_id`.
    pub(crate) fn identity_of(&self, type_id: TypeId) -> Option<&ServiceId> {
        self.by_type.get(&type_id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (&ServiceId, &Registration)> {
        self.entries.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(value: u32) -> Registration {
        Registration {
            lifetime: Lifetime::Singleton,
            type_name: "u32",
            type_id: Some(TypeId::of::<u32>()),
            recipe: Recipe::Instance(Arc::new(value)),
        }
    }

    fn alias(target: &str) -> Registration {
        Registration {
            lifetime: Lifetime::Singleton,
            type_name: "u32",
            type_id: None,
            recipe: Recipe::Alias(ServiceId::new(target)),
        }
    }

    #[test]
    fn aliases_resolve_to_implementation() {
        let mut catalog = Catalog::new();
        catalog.insert(ServiceId::new("Impl"), instance(1));
        catalog.insert(ServiceId::new("Iface"), alias("Impl"));
        catalog.insert(ServiceId::new("Outer"), alias("Iface"));

        let (key, _) = catalog.resolve(&ServiceId::new("Outer")).unwrap();
        assert_eq!(key.as_str(), "Impl");
        assert_eq!(catalog.canonical(&ServiceId::new("Unknown")).as_str(), "Unknown");
    }

    #[test]
    fn alias_loops_are_unresolvable() {
        let mut catalog = Catalog::new();
        catalog.insert(ServiceId::new("A"), alias("B"));
        catalog.insert(ServiceId::new("B"), alias("A"));
        assert!(matches!(
            catalog.resolve(&ServiceId::new("A")),
            Err(DiError::UnresolvableService(id)) if id.as_str() == "A"
        ));
    }
}
