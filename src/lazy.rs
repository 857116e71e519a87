//! Lazy dependency proxies and injectable slot cells.
//!
//! A [`LazyDependency`] stands in for a collaborator that could not be resolved
//! while its holder was being injected, usually because the collaborator is
//! itself under construction. Holders store it as [`Bound::Pending`] and only
//! force it at the point of actual use, so circular graphs terminate.

use std::any::Any;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::RwLock;

use crate::error::{DiError, DiResult};
use crate::internal::with_circular_guard;
use crate::key::ServiceId;
use crate::registration::AnyArc;

/// Stable key of a lazy proxy, derived from the owning type and slot name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProxyHash(u64);

impl ProxyHash {
    /// Hash identifying the `(owner, slot)` pair.
    ///
    /// ```rust
    /// use weft_di::ProxyHash;
    ///
    /// assert_eq!(ProxyHash::for_slot("Cart", "pricing"), ProxyHash::for_slot("Cart", "pricing"));
    /// assert_ne!(ProxyHash::for_slot("Cart", "pricing"), ProxyHash::for_slot("Cart", "tax"));
    /// ```
    pub fn for_slot(owner: &str, slot: &str) -> Self {
        // SipHash with fixed keys, stable for the process lifetime
        let mut hasher = DefaultHasher::new();
        owner.hash(&mut hasher);
        slot.hash(&mut hasher);
        Self(hasher.finish())
    }

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProxyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

type ResolverFn = Box<dyn Fn() -> DiResult<AnyArc> + Send + Sync>;

/// Forwarding stand-in resolved to the real instance on first use.
///
/// Once resolved, every holder of the same proxy observes the same instance.
/// Resolver failures surface from [`force`](Self::force), never at creation.
pub struct LazyDependency {
    hash: ProxyHash,
    target: ServiceId,
    type_hint: String,
    resolver: ResolverFn,
    instance: OnceCell<AnyArc>,
}

impl LazyDependency {
    /// Creates an unresolved proxy for `target`.
    pub fn new<F>(hash: ProxyHash, target: ServiceId, type_hint: impl Into<String>, resolver: F) -> Self
    where
        F: Fn() -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        Self {
            hash,
            target,
            type_hint: type_hint.into(),
            resolver: Box::new(resolver),
            instance: OnceCell::new(),
        }
    }

    pub fn hash(&self) -> ProxyHash {
        self.hash
    }

    /// Identity the proxy resolves to.
    pub fn target(&self) -> &ServiceId {
        &self.target
    }

    /// Concrete type expected behind the target identity, for diagnostics.
    pub fn type_hint(&self) -> &str {
        &self.type_hint
    }

    pub fn is_resolved(&self) -> bool {
        self.instance.get().is_some()
    }

    /// Returns the resolved instance without forcing.
    pub fn peek(&self) -> Option<AnyArc> {
        self.instance.get().cloned()
    }

    /// Resolves the target on first call and returns the cached instance afterwards.
    ///
    /// Forcing the same proxy again from inside its own resolver fails with
    /// [`DiError::CircularResolution`]. The resolver runs outside the cell so a
    /// thread waiting on singleton creation never holds it; racing threads keep
    /// whichever instance was stored first.
    pub fn force(&self) -> DiResult<AnyArc> {
        if let Some(instance) = self.instance.get() {
            return Ok(instance.clone());
        }

        let label = format!("lazy {} [{}]", self.target, self.hash);
        let instance = with_circular_guard(&label, || (self.resolver)())?;
        Ok(self.instance.get_or_init(|| instance).clone())
    }
}

impl fmt::Debug for LazyDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyDependency")
            .field("hash", &self.hash)
            .field("target", &self.target)
            .field("type_hint", &self.type_hint)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

/// A collaborator reference: either the real instance or a pending lazy proxy.
#[derive(Clone)]
pub enum Bound {
    Resolved(AnyArc),
    Pending(Arc<LazyDependency>),
}

impl Bound {
    /// Returns the real instance, resolving a pending proxy if necessary.
    pub fn force(&self) -> DiResult<AnyArc> {
        match self {
            Bound::Resolved(instance) => Ok(instance.clone()),
            Bound::Pending(proxy) => proxy.force(),
        }
    }

    /// Forces and downcasts to `T`.
    pub fn downcast<T: Any + Send + Sync>(&self) -> DiResult<Arc<T>> {
        self.force()?
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch { expected: std::any::type_name::<T>() })
    }

    /// `true` unless this is a proxy that has not been resolved yet.
    pub fn is_resolved(&self) -> bool {
        match self {
            Bound::Resolved(_) => true,
            Bound::Pending(proxy) => proxy.is_resolved(),
        }
    }

    /// `true` when the holder still points at the proxy wrapper.
    pub fn is_proxy(&self) -> bool {
        matches!(self, Bound::Pending(_))
    }

    /// The instance if already available, without forcing.
    pub fn peek(&self) -> Option<AnyArc> {
        match self {
            Bound::Resolved(instance) => Some(instance.clone()),
            Bound::Pending(proxy) => proxy.peek(),
        }
    }
}

impl fmt::Debug for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Resolved(_) => f.write_str("Resolved(..)"),
            Bound::Pending(proxy) => f.debug_tuple("Pending").field(proxy).finish(),
        }
    }
}

/// Object-safe view of a dependency slot, used by the injector.
pub trait SlotCell: Send + Sync {
    /// Replaces the slot's binding.
    fn bind(&self, bound: Bound);
    /// Current binding, if any.
    fn bound(&self) -> Option<Bound>;
    /// Drops the binding, leaving the slot empty.
    fn clear(&self);
}

/// Typed dependency slot filled by the injector.
///
/// Reading the slot forces a pending proxy and rebinds the slot to the real
/// instance, so later reads skip the proxy entirely.
///
/// # Examples
///
/// ```rust
/// use weft_di::{Inject, Bound, SlotCell};
/// use std::sync::Arc;
///
/// let slot: Inject<String> = Inject::new();
/// assert!(!slot.is_bound());
///
/// slot.bind(Bound::Resolved(Arc::new("ready".to_string())));
/// assert_eq!(slot.get().unwrap().as_str(), "ready");
/// ```
pub struct Inject<T> {
    bound: RwLock<Option<Bound>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Inject<T> {
    pub fn new() -> Self {
        Self {
            bound: RwLock::new(None),
            _marker: PhantomData,
        }
    }

    /// Returns the collaborator, forcing a pending proxy on first use.
    pub fn get(&self) -> DiResult<Arc<T>> {
        let bound = self
            .bound
            .read()
            .clone()
            .ok_or(DiError::NotInjected { expected: std::any::type_name::<T>() })?;

        let instance = match bound {
            Bound::Resolved(instance) => instance,
            Bound::Pending(proxy) => {
                let instance = proxy.force()?;
                let mut slot = self.bound.write();
                // only replace the proxy we forced; a concurrent rebind wins
                if matches!(&*slot, Some(Bound::Pending(p)) if Arc::ptr_eq(p, &proxy)) {
                    *slot = Some(Bound::Resolved(instance.clone()));
                }
                instance
            }
        };

        instance
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch { expected: std::any::type_name::<T>() })
    }

    pub fn is_bound(&self) -> bool {
        self.bound.read().is_some()
    }

    /// `true` once the slot holds a usable instance without forcing.
    pub fn is_resolved(&self) -> bool {
        self.bound.read().as_ref().is_some_and(Bound::is_resolved)
    }

    /// `true` while the slot holds the proxy wrapper.
    pub fn is_proxy(&self) -> bool {
        self.bound.read().as_ref().is_some_and(Bound::is_proxy)
    }

    /// Returns the collaborator only if it is already available.
    pub fn peek(&self) -> Option<Arc<T>> {
        self.bound
            .read()
            .as_ref()
            .and_then(Bound::peek)
            .and_then(|instance| instance.downcast::<T>().ok())
    }
}

impl<T: Any + Send + Sync> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Any + Send + Sync> SlotCell for Inject<T> {
    fn bind(&self, bound: Bound) {
        *self.bound.write() = Some(bound);
    }

    fn bound(&self) -> Option<Bound> {
        self.bound.read().clone()
    }

    fn clear(&self) {
        *self.bound.write() = None;
    }
}

impl<T> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("type", &std::any::type_name::<T>())
            .field("bound", &*self.bound.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_proxy(calls: Arc<AtomicUsize>) -> Arc<LazyDependency> {
        Arc::new(LazyDependency::new(
            ProxyHash::for_slot("Owner", "dep"),
            ServiceId::new("Dep"),
            "u32",
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(7u32) as AnyArc)
            },
        ))
    }

    #[test]
    fn resolver_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let proxy = counting_proxy(calls.clone());
        assert!(!proxy.is_resolved());

        let a = proxy.force().unwrap();
        let b = proxy.force().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_is_deferred_to_first_use() {
        let proxy = LazyDependency::new(
            ProxyHash::for_slot("Owner", "missing"),
            ServiceId::new("Missing"),
            "",
            || Err(DiError::UnresolvableService(ServiceId::new("Missing"))),
        );
        assert!(matches!(proxy.force(), Err(DiError::UnresolvableService(_))));
        assert!(!proxy.is_resolved());
    }

    #[test]
    fn slot_replaces_proxy_after_first_read() {
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Inject<u32> = Inject::new();
        slot.bind(Bound::Pending(counting_proxy(calls.clone())));
        assert!(slot.is_proxy());
        assert!(slot.peek().is_none());

        assert_eq!(*slot.get().unwrap(), 7);
        assert!(!slot.is_proxy());
        assert_eq!(*slot.peek().unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn wrong_type_is_reported() {
        let slot: Inject<String> = Inject::new();
        slot.bind(Bound::Resolved(Arc::new(1u8)));
        assert!(matches!(slot.get(), Err(DiError::TypeMismatch { .. })));
        assert!(matches!(Inject::<u8>::new().get(), Err(DiError::NotInjected { .. })));
    }

    #[test]
    fn forcing_itself_from_the_resolver_is_circular() {
        let proxy = Arc::new_cyclic(|this: &std::sync::Weak<LazyDependency>| {
            let this = this.clone();
            LazyDependency::new(ProxyHash::for_slot("Owner", "self"), ServiceId::new("Loop"), "", move || {
                let proxy = this
                    .upgrade()
                    .ok_or_else(|| DiError::ContainerUnavailable(ServiceId::new("Loop")))?;
                proxy.force()
            })
        });

        match proxy.force() {
            Err(DiError::CircularResolution(path)) => {
                assert_eq!(path.len(), 2);
                assert_eq!(path[0], path[1]);
                assert!(path[0].starts_with("lazy Loop"));
            }
            other => panic!("expected a circular resolution, got {:?}", other.map(|_| ())),
        }
        assert!(!proxy.is_resolved());

        // the guard unwound, so the next attempt reports the same cycle
        assert!(matches!(proxy.force(), Err(DiError::CircularResolution(_))));
    }
}
