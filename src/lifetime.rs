//! Service lifetime definitions.

/// Lifetimes controlling instance caching behavior.
///
/// # Examples
///
/// ```rust
/// use weft_di::{ServiceCollection, ServiceId, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Clock;
/// struct Ticket;
///
/// let mut services = ServiceCollection::new();
/// services.add_factory("Clock", Lifetime::Singleton, |_| Ok(Clock));
/// services.add_factory("Ticket", Lifetime::Prototype, |_| Ok(Ticket));
///
/// let container = services.build();
/// let a = container.get_required::<Clock>(&ServiceId::new("Clock"));
/// let b = container.get_required::<Clock>(&ServiceId::new("Clock"));
/// assert!(Arc::ptr_eq(&a, &b));
///
/// let x = container.get_required::<Ticket>(&ServiceId::new("Ticket"));
/// let y = container.get_required::<Ticket>(&ServiceId::new("Ticket"));
/// assert!(!Arc::ptr_eq(&x, &y));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// At most one instance per container, created on first request.
    ///
    /// Singletons are cached for the container's lifetime and are never
    /// serialized with their holders; they are re-injected after restore.
    Singleton,
    /// A new instance for every construction request, never cached.
    ///
    /// Prototype instances are owned by whoever requested them.
    #[default]
    Prototype,
}

impl Lifetime {
    /// Returns `true` for [`Lifetime::Singleton`].
    #[inline]
    pub fn is_singleton(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}
