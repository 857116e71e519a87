//! Service collection module for dependency injection.
//!
//! This module contains the ServiceCollection type used to register
//! construction recipes before building a [`Container`].

use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::config::Settings;
use crate::entity::PersistenceLookup;
use crate::error::DiResult;
use crate::key::ServiceId;
use crate::lifetime::Lifetime;
use crate::observer::{DiObserver, Observers};
use crate::provider::{Container, ResolverContext};
use crate::registration::{AnyArc, Catalog, Recipe, Registration};
use crate::traits::Component;

pub mod module_system;
pub use module_system::*;

/// Registration builder for the container.
///
/// # Examples
///
/// ```
/// use weft_di::{ServiceCollection, ServiceId, Resolver};
///
/// let mut services = ServiceCollection::new();
/// services
///     .add_instance("Acme.Greeting", "hello".to_string())
///     .bind("Greeting", "Acme.Greeting");
///
/// let container = services.build();
/// let a = container.get_required::<String>(&ServiceId::new("Greeting"));
/// let b = container.get_required::<String>(&ServiceId::new("Acme.Greeting"));
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
#[derive(Default)]
pub struct ServiceCollection {
    catalog: Catalog,
    settings: Settings,
    persistence: Option<Arc<dyn PersistenceLookup>>,
    observers: Observers,
}

impl ServiceCollection {
    /// Creates a new empty service collection.
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Component Registrations -----

    /// Registers the component `T` under `id`.
    ///
    /// The lifetime comes from `T`'s schema unless overridden on the returned
    /// builder. Registering the same identity again replaces the recipe.
    ///
    /// # Examples
    ///
    /// ```
    /// use weft_di::{BoundArguments, Component, DiResult, Injectable, ServiceCollection, ServiceId, SlotCell, TypeSchema, Resolver};
    ///
    /// struct Mailer {
    ///     host: String,
    /// }
    ///
    /// impl Injectable for Mailer {
    ///     fn slot(&self, _name: &str) -> Option<&dyn SlotCell> {
    ///         None
    ///     }
    /// }
    ///
    /// impl Component for Mailer {
    ///     fn schema() -> TypeSchema {
    ///         TypeSchema::new::<Self>().singleton().parameter("host")
    ///     }
    ///
    ///     fn construct(args: &BoundArguments) -> DiResult<Self> {
    ///         Ok(Self { host: args.value("host")? })
    ///     }
    /// }
    ///
    /// let mut services = ServiceCollection::new();
    /// services.register::<Mailer>("Acme.Mailer").argument("host", "smtp.local");
    ///
    /// let container = services.build();
    /// let mailer = container.get_required::<Mailer>(&ServiceId::new("Acme.Mailer"));
    /// assert_eq!(mailer.host, "smtp.local");
    /// ```
    pub fn register<T: Component>(&mut self, id: impl Into<ServiceId>) -> ComponentRegistration<'_> {
        let id = id.into();
        let schema = Arc::new(T::schema());
        let build: crate::registration::ComponentFn = Arc::new(|container: &Container, id: &ServiceId, registration: &Registration| {
            container
                .build_registered::<T>(id, registration)
                .map(|instance| instance as AnyArc)
        });

        let registration = Registration {
            lifetime: schema.lifetime(),
            type_name: schema.type_name(),
            type_id: Some(TypeId::of::<T>()),
            recipe: Recipe::Component {
                schema,
                arguments: Vec::new(),
                build,
            },
        };
        self.catalog.insert(id.clone(), registration);
        ComponentRegistration { catalog: &mut self.catalog, id }
    }

    /// Registers `T` under the identity derived from its type name.
    pub fn register_type<T: Component>(&mut self) -> ComponentRegistration<'_> {
        self.register::<T>(ServiceId::of::<T>())
    }

    // ----- Instances and Factories -----

    /// Registers a pre-built singleton.
    pub fn add_instance<T: Any + Send + Sync>(&mut self, id: impl Into<ServiceId>, value: T) -> &mut Self {
        self.add_instance_arc(id, Arc::new(value))
    }

    /// Registers an already shared singleton.
    pub fn add_instance_arc<T: Any + Send + Sync>(&mut self, id: impl Into<ServiceId>, value: Arc<T>) -> &mut Self {
        self.catalog.insert(
            id.into(),
            Registration {
                lifetime: Lifetime::Singleton,
                type_name: std::any::type_name::<T>(),
                type_id: Some(TypeId::of::<T>()),
                recipe: Recipe::Instance(value),
            },
        );
        self
    }

    /// Registers a factory; singleton factories run at most once.
    ///
    /// Factory output is not property-injected.
    pub fn add_factory<T, F>(&mut self, id: impl Into<ServiceId>, lifetime: Lifetime, factory: F) -> &mut Self
    where
        T: Any + Send + Sync,
        F: for<'a> Fn(&ResolverContext<'a>) -> DiResult<T> + Send + Sync + 'static,
    {
        let ctor = move |ctx: &ResolverContext| -> DiResult<AnyArc> {
            factory(ctx).map(|value| Arc::new(value) as AnyArc)
        };
        self.catalog.insert(
            id.into(),
            Registration {
                lifetime,
                type_name: std::any::type_name::<T>(),
                type_id: Some(TypeId::of::<T>()),
                recipe: Recipe::Factory(Arc::new(ctor)),
            },
        );
        self
    }

    /// Makes `interface` resolve through `implementation`'s recipe and cache entry.
    pub fn bind(&mut self, interface: impl Into<ServiceId>, implementation: impl Into<ServiceId>) -> &mut Self {
        let implementation = implementation.into();
        self.catalog.insert(
            interface.into(),
            Registration {
                lifetime: Lifetime::Singleton,
                type_name: "",
                type_id: None,
                recipe: Recipe::Alias(implementation),
            },
        );
        self
    }

    // ----- Environment -----

    /// Merges `settings` over any settings added before.
    pub fn with_settings(&mut self, settings: Settings) -> &mut Self {
        self.settings = std::mem::take(&mut self.settings).merge(settings);
        self
    }

    /// Sets the lookup used to restore entity references.
    pub fn with_persistence(&mut self, lookup: Arc<dyn PersistenceLookup>) -> &mut Self {
        self.persistence = Some(lookup);
        self
    }

    /// Adds a diagnostic observer.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    pub fn is_registered(&self, id: &ServiceId) -> bool {
        self.catalog.contains(id)
    }

    /// Number of registered identities, aliases included.
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the container.
    pub fn build(self) -> Container {
        tracing::debug!(registrations = self.catalog.len(), "building container");
        Container::new(self.catalog, self.settings, self.persistence, self.observers)
    }
}

/// Fluent options for a component registration.
pub struct ComponentRegistration<'a> {
    catalog: &'a mut Catalog,
    id: ServiceId,
}

impl ComponentRegistration<'_> {
    fn registration(&mut self) -> Option<&mut Registration> {
        self.catalog.get_mut(&self.id)
    }

    /// Overrides the lifetime declared by the schema.
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        if let Some(registration) = self.registration() {
            registration.lifetime = lifetime;
        }
        self
    }

    pub fn singleton(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    pub fn prototype(self) -> Self {
        self.lifetime(Lifetime::Prototype)
    }

    /// Configures a constructor argument used when the caller leaves `parameter` empty.
    pub fn argument(mut self, parameter: &str, value: impl Into<serde_json::Value>) -> Self {
        if let Some(Registration { recipe: Recipe::Component { arguments, .. }, .. }) = self.registration() {
            let value = value.into();
            match arguments.iter_mut().find(|(name, _)| name == parameter) {
                Some((_, existing)) => *existing = value,
                None => arguments.push((parameter.to_string(), value)),
            }
        }
        self
    }

    /// Also makes `alias` resolve to this registration.
    pub fn alias(self, alias: impl Into<ServiceId>) -> Self {
        self.catalog.insert(
            alias.into(),
            Registration {
                lifetime: Lifetime::Singleton,
                type_name: "",
                type_id: None,
                recipe: Recipe::Alias(self.id.clone()),
            },
        );
        self
    }

    pub fn id(&self) -> &ServiceId {
        &self.id
    }
}
