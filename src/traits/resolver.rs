//! Resolver traits for service resolution.

use std::any::Any;
use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::registration::AnyArc;

/// Core resolver trait for object-safe service resolution.
///
/// This is the Object Registry contract in type-erased form. Most callers use
/// the typed [`Resolver`] methods layered on top of it.
pub trait ResolverCore: Send + Sync {
    /// Returns the instance for `id`, constructing and caching singletons on first call.
    ///
    /// # Errors
    ///
    /// [`DiError::UnresolvableService`] when no recipe is known for `id`, or any
    /// error raised while constructing it.
    fn resolve_any(&self, id: &ServiceId) -> DiResult<AnyArc>;

    /// Returns a previously cached singleton without creating one.
    fn instance_any(&self, id: &ServiceId) -> Option<AnyArc>;
}

fn downcast<T: Any + Send + Sync>(instance: AnyArc) -> DiResult<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| DiError::TypeMismatch { expected: std::any::type_name::<T>() })
}

/// Typed resolution helpers.
///
/// # Examples
///
/// ```
/// use weft_di::{ServiceCollection, ServiceId, Lifetime, Resolver};
///
/// let mut services = ServiceCollection::new();
/// services.add_instance("Acme.Port", 8080u16);
///
/// let container = services.build();
/// let port = container.get::<u16>(&ServiceId::new("Acme.Port")).unwrap();
/// assert_eq!(*port, 8080);
/// assert!(container.get_instance::<u16>(&ServiceId::new("Acme.Port")).is_some());
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves `id` and downcasts it to `T`.
    fn get<T: Any + Send + Sync>(&self, id: &ServiceId) -> DiResult<Arc<T>> {
        downcast(self.resolve_any(id)?)
    }

    /// Resolves `id`, panicking on failure.
    ///
    /// # Panics
    ///
    /// Panics if the service cannot be resolved or has a different type.
    fn get_required<T: Any + Send + Sync>(&self, id: &ServiceId) -> Arc<T> {
        match self.get::<T>(id) {
            Ok(instance) => instance,
            Err(err) => panic!("Failed to resolve {}: {}", id, err),
        }
    }

    /// Returns the cached singleton for `id` if it exists and has type `T`.
    fn get_instance<T: Any + Send + Sync>(&self, id: &ServiceId) -> Option<Arc<T>> {
        self.instance_any(id).and_then(|i| i.downcast::<T>().ok())
    }

    /// Resolves the identity derived from `T`'s type name.
    fn get_by_type<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.get::<T>(&ServiceId::of::<T>())
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
