//! Construction pipeline.
//!
//! Uninitialized -> Registered (singletons only) -> Injected -> Ready.
//! A singleton is published to its own thread at `Registered`, before
//! injection, so circular graphs resolving back to it see the partial instance.

use std::any::TypeId;
use std::sync::Arc;

use crate::arguments::{Argument, Arguments, BoundArguments};
use crate::error::{DiError, DiResult};
use crate::internal::with_circular_guard;
use crate::key::ServiceId;
use crate::lifetime::Lifetime;
use crate::registration::{AnyArc, Registration};
use crate::schema::TypeSchema;
use crate::traits::{Component, LifecycleCause, ResolverCore};

use super::Container;

/// Everything the pipeline needs to know about one construction.
struct Plan<'a> {
    identity: ServiceId,
    lifetime: Lifetime,
    schema: Arc<TypeSchema>,
    registration: Option<&'a Registration>,
}

/// Where a constructor parameter gets its value from.
enum Source<'a> {
    Given(Argument),
    Configured(&'a serde_json::Value),
    Autowired(&'a ServiceId),
    Empty,
}

impl Container {
    /// Creates an instance of `T` through the construction pipeline.
    ///
    /// Arguments bind positionally to the parameters of `T`'s schema. Missing
    /// positions fall back to arguments configured on the registration, then to
    /// autowired services. For singleton-scoped types the cached instance is
    /// returned when one exists.
    ///
    /// # Errors
    ///
    /// [`DiError::MissingConstructorArgument`] when a required parameter has no
    /// value; nothing is constructed in that case.
    ///
    /// # Examples
    ///
    /// ```
    /// use weft_di::{Arguments, BoundArguments, Component, DiResult, Injectable, ServiceCollection, SlotCell, TypeSchema};
    ///
    /// struct Invoice {
    ///     number: String,
    /// }
    ///
    /// impl Injectable for Invoice {
    ///     fn slot(&self, _name: &str) -> Option<&dyn SlotCell> {
    ///         None
    ///     }
    /// }
    ///
    /// impl Component for Invoice {
    ///     fn schema() -> TypeSchema {
    ///         TypeSchema::new::<Self>().parameter("number")
    ///     }
    ///
    ///     fn construct(args: &BoundArguments) -> DiResult<Self> {
    ///         Ok(Self { number: args.value("number")? })
    ///     }
    /// }
    ///
    /// let container = ServiceCollection::new().build();
    /// let invoice = container.construct::<Invoice>(Arguments::new().value("INV-7")).unwrap();
    /// assert_eq!(invoice.number, "INV-7");
    /// assert!(container.construct::<Invoice>(Arguments::new()).is_err());
    /// ```
    pub fn construct<T: Component>(&self, args: Arguments) -> DiResult<Arc<T>> {
        let plan = self.plan_for::<T>();
        let label = plan.identity.clone();
        with_circular_guard(label.as_str(), || self.run_pipeline::<T>(&plan, args))
    }

    /// Pipeline entry used by component recipes; the caller already holds the cycle guard.
    pub(crate) fn build_registered<T: Component>(
        &self,
        id: &ServiceId,
        registration: &Registration,
    ) -> DiResult<Arc<T>> {
        let schema = match registration.schema() {
            Some(schema) => schema.clone(),
            None => self.schema_of::<T>(),
        };
        let plan = Plan {
            identity: id.clone(),
            lifetime: registration.lifetime,
            schema,
            registration: Some(registration),
        };
        self.run_pipeline::<T>(&plan, Arguments::new())
    }

    fn plan_for<T: Component>(&self) -> Plan<'_> {
        let catalog = &self.inner().catalog;
        let registered = catalog
            .identity_of(TypeId::of::<T>())
            .and_then(|id| catalog.resolve(id).ok());

        match registered {
            Some((id, registration)) => Plan {
                identity: id.clone(),
                lifetime: registration.lifetime,
                schema: self.schema_of::<T>(),
                registration: Some(registration),
            },
            None => {
                let schema = self.schema_of::<T>();
                Plan {
                    identity: ServiceId::of::<T>(),
                    lifetime: schema.lifetime(),
                    schema,
                    registration: None,
                }
            }
        }
    }

    fn run_pipeline<T: Component>(&self, plan: &Plan<'_>, args: Arguments) -> DiResult<Arc<T>> {
        if !plan.lifetime.is_singleton() {
            let instance = self.instantiate::<T>(plan, args)?;
            self.inject_into(&*instance, &plan.schema)?;
            instance.initialize(LifecycleCause::Created)?;
            self.constructed(plan);
            return Ok(instance);
        }

        let _creation = self.creation_lock();
        if let Some(existing) = self.instance_any(&plan.identity) {
            return existing
                .downcast::<T>()
                .map_err(|_| DiError::TypeMismatch { expected: std::any::type_name::<T>() });
        }

        let instance = self.instantiate::<T>(plan, args)?;
        let erased: AnyArc = instance.clone();
        self.begin_construction(&plan.identity, erased.clone());

        let ready = self
            .inject_into(&*instance, &plan.schema)
            .and_then(|()| instance.initialize(LifecycleCause::Created));
        self.end_construction(&plan.identity);
        // a failed singleton is discarded, never cached
        ready?;

        self.store_singleton(&plan.identity, erased);
        tracing::debug!(service = %plan.identity, type_name = plan.schema.type_name(), "singleton created");
        self.constructed(plan);
        Ok(instance)
    }

    fn instantiate<T: Component>(&self, plan: &Plan<'_>, args: Arguments) -> DiResult<Arc<T>> {
        let bound = self.bind_arguments(plan, args)?;
        T::construct(&bound).map(Arc::new)
    }

    /// Binds positional arguments to parameter names.
    ///
    /// Sources are decided for every parameter before any service is resolved,
    /// so a missing argument fails without side effects.
    fn bind_arguments(&self, plan: &Plan<'_>, mut args: Arguments) -> DiResult<BoundArguments> {
        let parameters = plan.schema.parameters();
        let mut sources = Vec::with_capacity(parameters.len());

        for (position, parameter) in parameters.iter().enumerate() {
            let source = if let Some(argument) = args.take(position) {
                Source::Given(argument)
            } else if let Some(value) = plan.registration.and_then(|r| r.argument(parameter.name)) {
                Source::Configured(value)
            } else if let Some(id) = &parameter.autowire {
                Source::Autowired(id)
            } else if parameter.required {
                return Err(DiError::MissingConstructorArgument {
                    type_name: plan.schema.type_name(),
                    parameter: parameter.name,
                });
            } else {
                Source::Empty
            };
            sources.push((parameter.name, source));
        }

        let mut entries = Vec::with_capacity(sources.len());
        for (name, source) in sources {
            let argument = match source {
                Source::Given(argument) => Some(argument),
                Source::Configured(value) => Some(Argument::Value(value.clone())),
                Source::Autowired(id) => Some(Argument::Object(self.resolve_any(id)?)),
                Source::Empty => None,
            };
            entries.push((name, argument));
        }

        Ok(BoundArguments::new(plan.schema.type_name(), entries))
    }

    fn constructed(&self, plan: &Plan<'_>) {
        let observers = &self.inner().observers;
        if observers.has_observers() {
            observers.constructed(plan.schema.type_name(), plan.lifetime);
        }
    }
}
