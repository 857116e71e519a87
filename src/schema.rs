//! Per-type schemas consulted by the injector and the entity tracker.
//!
//! A [`TypeSchema`] is built once per type (through [`Component::schema`]) and
//! replaces runtime reflection: it lists the constructor parameters, the
//! serializable properties, and the dependency slots of a managed type.
//!
//! [`Component::schema`]: crate::Component::schema

use crate::key::ServiceId;
use crate::lifetime::Lifetime;

/// Constructor parameter declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: &'static str,
    pub required: bool,
    /// Identity to resolve from the registry when the caller omits this argument.
    pub autowire: Option<ServiceId>,
}

impl Parameter {
    /// A parameter that must be supplied.
    pub fn required(name: &'static str) -> Self {
        Self { name, required: true, autowire: None }
    }

    /// A parameter that may be left empty.
    pub fn optional(name: &'static str) -> Self {
        Self { name, required: false, autowire: None }
    }

    /// A required parameter resolved from the registry when omitted.
    pub fn service(name: &'static str, identity: impl Into<ServiceId>) -> Self {
        Self { name, required: true, autowire: Some(identity.into()) }
    }
}

/// Shape of a property value, used for diagnostics and traversal hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Scalar,
    Container,
    Reference,
}

/// Serializable property declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    pub name: &'static str,
    pub kind: PropertyKind,
    pub transient: bool,
}

/// How a collaborator slot is bound when the target is not available yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InjectionStrategy {
    /// Resolve through the registry immediately, constructing if needed.
    Eager,
    /// Bind a lazy proxy when no instance exists yet.
    #[default]
    Lazy,
}

/// What a dependency slot is filled with.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotBinding {
    /// A collaborator resolved through the registry.
    Service {
        identity: ServiceId,
        strategy: InjectionStrategy,
    },
    /// A configuration value handed to the settings entry point.
    Settings { path: String },
}

/// Declared dependency slot of a managed type.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencySlot {
    pub name: &'static str,
    pub binding: SlotBinding,
}

impl DependencySlot {
    /// Identity of the collaborator, or `None` for settings slots.
    pub fn identity(&self) -> Option<&ServiceId> {
        match &self.binding {
            SlotBinding::Service { identity, .. } => Some(identity),
            SlotBinding::Settings { .. } => None,
        }
    }
}

/// Explicit schema of a managed type.
///
/// # Examples
///
/// ```rust
/// use weft_di::{TypeSchema, Lifetime, PropertyKind};
///
/// struct Checkout;
///
/// let schema = TypeSchema::new::<Checkout>()
///     .with_lifetime(Lifetime::Prototype)
///     .parameter("currency")
///     .property("customer", PropertyKind::Reference)
///     .transient_property("scratch", PropertyKind::Scalar)
///     .inject("logger", "Acme.Logger")
///     .inject_settings("limits", "Acme.Checkout.limits");
///
/// assert_eq!(schema.parameters().len(), 1);
/// assert!(schema.is_transient("scratch"));
/// assert!(!schema.is_transient("customer"));
/// assert_eq!(schema.slots().len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct TypeSchema {
    type_name: &'static str,
    lifetime: Lifetime,
    parameters: Vec<Parameter>,
    properties: Vec<PropertySchema>,
    slots: Vec<DependencySlot>,
}

impl TypeSchema {
    /// Starts an empty prototype-scoped schema for `T`.
    pub fn new<T: 'static>() -> Self {
        Self::named(std::any::type_name::<T>())
    }

    /// Starts an empty schema under an explicit type name.
    pub fn named(type_name: &'static str) -> Self {
        Self {
            type_name,
            lifetime: Lifetime::Prototype,
            parameters: Vec::new(),
            properties: Vec::new(),
            slots: Vec::new(),
        }
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Shorthand for `with_lifetime(Lifetime::Singleton)`.
    pub fn singleton(self) -> Self {
        self.with_lifetime(Lifetime::Singleton)
    }

    /// Declares a required positional constructor parameter.
    pub fn parameter(self, name: &'static str) -> Self {
        self.with_parameter(Parameter::required(name))
    }

    pub fn optional_parameter(self, name: &'static str) -> Self {
        self.with_parameter(Parameter::optional(name))
    }

    /// Declares a parameter autowired from `identity` when omitted.
    pub fn service_parameter(self, name: &'static str, identity: impl Into<ServiceId>) -> Self {
        self.with_parameter(Parameter::service(name, identity))
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn property(mut self, name: &'static str, kind: PropertyKind) -> Self {
        self.properties.push(PropertySchema { name, kind, transient: false });
        self
    }

    /// Declares a property that is never serialized.
    pub fn transient_property(mut self, name: &'static str, kind: PropertyKind) -> Self {
        self.properties.push(PropertySchema { name, kind, transient: true });
        self
    }

    /// Declares a lazily injected collaborator slot.
    pub fn inject(self, name: &'static str, identity: impl Into<ServiceId>) -> Self {
        self.inject_with(name, identity, InjectionStrategy::Lazy)
    }

    /// Declares a collaborator slot resolved eagerly during injection.
    pub fn inject_eager(self, name: &'static str, identity: impl Into<ServiceId>) -> Self {
        self.inject_with(name, identity, InjectionStrategy::Eager)
    }

    pub fn inject_with(
        mut self,
        name: &'static str,
        identity: impl Into<ServiceId>,
        strategy: InjectionStrategy,
    ) -> Self {
        self.slots.push(DependencySlot {
            name,
            binding: SlotBinding::Service { identity: identity.into(), strategy },
        });
        self
    }

    /// Declares a slot filled from the settings tree at `path`.
    pub fn inject_settings(mut self, name: &'static str, path: impl Into<String>) -> Self {
        self.slots.push(DependencySlot {
            name,
            binding: SlotBinding::Settings { path: path.into() },
        });
        self
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn properties(&self) -> &[PropertySchema] {
        &self.properties
    }

    pub fn slots(&self) -> &[DependencySlot] {
        &self.slots
    }

    /// Settings slots in declaration order.
    pub fn settings_slots(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.slots.iter().filter_map(|slot| match &slot.binding {
            SlotBinding::Settings { path } => Some((slot.name, path.as_str())),
            SlotBinding::Service { .. } => None,
        })
    }

    /// Collaborator slots in declaration order.
    pub fn service_slots(&self) -> impl Iterator<Item = (&'static str, &ServiceId, InjectionStrategy)> {
        self.slots.iter().filter_map(|slot| match &slot.binding {
            SlotBinding::Service { identity, strategy } => Some((slot.name, identity, *strategy)),
            SlotBinding::Settings { .. } => None,
        })
    }

    /// Transient classifier: `true` when `property` must not be serialized.
    ///
    /// Settings slots count as transient; they are re-injected on restore.
    pub fn is_transient(&self, property: &str) -> bool {
        if let Some(p) = self.properties.iter().find(|p| p.name == property) {
            return p.transient;
        }
        self.slots
            .iter()
            .any(|s| s.name == property && matches!(s.binding, SlotBinding::Settings { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_keep_declaration_order() {
        let schema = TypeSchema::named("Order")
            .inject("a", "A")
            .inject_settings("cfg", "Acme.Order")
            .inject_eager("b", "B");

        let names: Vec<_> = schema.service_slots().map(|(n, _, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        let settings: Vec<_> = schema.settings_slots().collect();
        assert_eq!(settings, vec![("cfg", "Acme.Order")]);
        assert!(schema.is_transient("cfg"));
    }

    #[test]
    fn lazy_is_the_default_strategy() {
        let schema = TypeSchema::named("X").inject("dep", "Dep");
        let (_, _, strategy) = schema.service_slots().next().unwrap();
        assert_eq!(strategy, InjectionStrategy::Lazy);
        assert_eq!(schema.lifetime(), Lifetime::Prototype);
    }
}
