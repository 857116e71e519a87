//! Service module system for modular registration.

use crate::{DiError, DiResult, ServiceCollection};

/// A group of registrations applied to a [`ServiceCollection`] in one step.
///
/// # Example
///
/// ```rust
/// use weft_di::{DiResult, Lifetime, ServiceCollection, ServiceCollectionExt, ServiceId, ServiceModule, Resolver};
///
/// struct Clock;
///
/// struct TimeModule;
///
/// impl ServiceModule for TimeModule {
///     fn register_services(self, services: &mut ServiceCollection) -> DiResult<()> {
///         services
///             .add_factory("Acme.Clock", Lifetime::Singleton, |_| Ok(Clock))
///             .bind("Clock", "Acme.Clock");
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let container = ServiceCollection::new().add_module(TimeModule)?.build();
/// assert!(container.get::<Clock>(&ServiceId::new("Clock")).is_ok());
/// # Ok(())
/// # }
/// ```
pub trait ServiceModule {
    /// Name reported in logs and in [`DiError::Module`]; defaults to the type name.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Adds this module's registrations to `services`.
    fn register_services(self, services: &mut ServiceCollection) -> DiResult<()>;
}

/// Runs `module`, tagging a failure with the module's name.
fn apply<M: ServiceModule>(services: &mut ServiceCollection, module: M) -> DiResult<()> {
    let name = module.name();
    let before = services.len();
    module
        .register_services(services)
        .map_err(|source| DiError::Module { module: name, source: Box::new(source) })?;
    tracing::debug!(module = name, added = services.len().saturating_sub(before), "applied service module");
    Ok(())
}

/// Chaining form of module registration that consumes the collection.
///
/// # Errors
///
/// A failing module is reported as [`DiError::Module`] wrapping its own error.
pub trait ServiceCollectionExt {
    fn add_module<M: ServiceModule>(self, module: M) -> DiResult<Self>
    where
        Self: Sized;
}

impl ServiceCollectionExt for ServiceCollection {
    fn add_module<M: ServiceModule>(mut self, module: M) -> DiResult<Self> {
        apply(&mut self, module)?;
        Ok(self)
    }
}

/// In-place form of module registration.
pub trait ServiceCollectionModuleExt {
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self>;
}

impl ServiceCollectionModuleExt for ServiceCollection {
    fn add_module_mut<M: ServiceModule>(&mut self, module: M) -> DiResult<&mut Self> {
        apply(self, module)?;
        Ok(self)
    }
}
