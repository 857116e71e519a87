//! Diagnostic observers for container events.
//!
//! Observers are notified synchronously while the container resolves services,
//! hands out lazy proxies, and detaches or restores entity references. When no
//! observer is registered the notification paths are skipped entirely.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::key::ServiceId;
use crate::lazy::ProxyHash;
use crate::lifetime::Lifetime;

/// Observer trait for container events.
///
/// Only [`resolving`](Self::resolving) and [`resolved`](Self::resolved) are
/// required. Keep implementations lightweight: they run inline with resolution.
///
/// # Examples
///
/// ```
/// use weft_di::{DiObserver, ServiceCollection, ServiceId};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// struct Audit;
///
/// impl DiObserver for Audit {
///     fn resolving(&self, id: &ServiceId) {
///         println!("-> {}", id);
///     }
///
///     fn resolved(&self, id: &ServiceId, duration: Duration) {
///         println!("<- {} in {:?}", id, duration);
///     }
/// }
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(Audit));
/// let container = services.build();
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before an identity is resolved through the registry.
    fn resolving(&self, id: &ServiceId);

    /// Called after resolution finished, successfully or not.
    fn resolved(&self, id: &ServiceId, duration: Duration);

    /// Called when the construction pipeline finished an instance.
    fn constructed(&self, _type_name: &str, _lifetime: Lifetime) {}

    /// Called when a new lazy proxy is registered.
    fn lazy_created(&self, _hash: ProxyHash, _target: &ServiceId) {}

    /// Called when a lazy proxy resolved its target.
    fn lazy_resolved(&self, _hash: ProxyHash, _target: &ServiceId) {}

    /// Called after preparation detached `count` entity references.
    fn entities_detached(&self, _type_name: &str, _count: usize) {}

    /// Called after restoration reattached `count` entity references.
    fn entities_restored(&self, _type_name: &str, _count: usize) {}
}

/// Container for registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self { observers: Vec::new() }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    #[inline]
    pub(crate) fn resolving(&self, id: &ServiceId) {
        for observer in &self.observers {
            observer.resolving(id);
        }
    }

    #[inline]
    pub(crate) fn resolved(&self, id: &ServiceId, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(id, duration);
        }
    }

    pub(crate) fn constructed(&self, type_name: &str, lifetime: Lifetime) {
        for observer in &self.observers {
            observer.constructed(type_name, lifetime);
        }
    }

    pub(crate) fn lazy_created(&self, hash: ProxyHash, target: &ServiceId) {
        for observer in &self.observers {
            observer.lazy_created(hash, target);
        }
    }

    pub(crate) fn lazy_resolved(&self, hash: ProxyHash, target: &ServiceId) {
        for observer in &self.observers {
            observer.lazy_resolved(hash, target);
        }
    }

    pub(crate) fn entities_detached(&self, type_name: &str, count: usize) {
        for observer in &self.observers {
            observer.entities_detached(type_name, count);
        }
    }

    pub(crate) fn entities_restored(&self, type_name: &str, count: usize) {
        for observer in &self.observers {
            observer.entities_restored(type_name, count);
        }
    }
}

/// Built-in observer that forwards every event to `tracing`.
///
/// Resolution events are emitted at `trace`, everything else at `debug`.
///
/// # Examples
///
/// ```
/// use weft_di::{ServiceCollection, LoggingObserver};
/// use std::sync::Arc;
///
/// let mut services = ServiceCollection::new();
/// services.add_observer(Arc::new(LoggingObserver::new()));
/// let container = services.build();
/// ```
#[derive(Debug, Clone, Default)]
pub struct LoggingObserver {
    _private: (),
}

impl LoggingObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiObserver for LoggingObserver {
    fn resolving(&self, id: &ServiceId) {
        tracing::trace!(service = %id, "resolving");
    }

    fn resolved(&self, id: &ServiceId, duration: Duration) {
        tracing::trace!(service = %id, elapsed_us = duration.as_micros() as u64, "resolved");
    }

    fn constructed(&self, type_name: &str, lifetime: Lifetime) {
        tracing::debug!(type_name, ?lifetime, "constructed");
    }

    fn lazy_created(&self, hash: ProxyHash, target: &ServiceId) {
        tracing::debug!(proxy = %hash, service = %target, "lazy dependency created");
    }

    fn lazy_resolved(&self, hash: ProxyHash, target: &ServiceId) {
        tracing::debug!(proxy = %hash, service = %target, "lazy dependency resolved");
    }

    fn entities_detached(&self, type_name: &str, count: usize) {
        tracing::debug!(type_name, count, "entity references detached");
    }

    fn entities_restored(&self, type_name: &str, count: usize) {
        tracing::debug!(type_name, count, "entity references restored");
    }
}

/// Counting observer for tests and post-run analysis.
#[derive(Debug, Default)]
pub struct MetricsObserver {
    resolutions: AtomicU64,
    total_resolution_ns: AtomicU64,
    constructions: AtomicU64,
    proxies_created: AtomicU64,
    proxies_resolved: AtomicU64,
    entities_detached: AtomicU64,
    entities_restored: AtomicU64,
}

impl MetricsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolution_count(&self) -> u64 {
        self.resolutions.load(Ordering::Relaxed)
    }

    /// Average resolution time, `None` before the first resolution.
    pub fn average_resolution_time(&self) -> Option<Duration> {
        let count = self.resolution_count();
        if count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.total_resolution_ns.load(Ordering::Relaxed) / count))
    }

    pub fn construction_count(&self) -> u64 {
        self.constructions.load(Ordering::Relaxed)
    }

    pub fn proxies_created(&self) -> u64 {
        self.proxies_created.load(Ordering::Relaxed)
    }

    pub fn proxies_resolved(&self) -> u64 {
        self.proxies_resolved.load(Ordering::Relaxed)
    }

    pub fn entities_detached(&self) -> u64 {
        self.entities_detached.load(Ordering::Relaxed)
    }

    pub fn entities_restored(&self) -> u64 {
        self.entities_restored.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        for counter in [
            &self.resolutions,
            &self.total_resolution_ns,
            &self.constructions,
            &self.proxies_created,
            &self.proxies_resolved,
            &self.entities_detached,
            &self.entities_restored,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl DiObserver for MetricsObserver {
    fn resolving(&self, _id: &ServiceId) {}

    fn resolved(&self, _id: &ServiceId, duration: Duration) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
        self.total_resolution_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn constructed(&self, _type_name: &str, _lifetime: Lifetime) {
        self.constructions.fetch_add(1, Ordering::Relaxed);
    }

    fn lazy_created(&self, _hash: ProxyHash, _target: &ServiceId) {
        self.proxies_created.fetch_add(1, Ordering::Relaxed);
    }

    fn lazy_resolved(&self, _hash: ProxyHash, _target: &ServiceId) {
        self.proxies_resolved.fetch_add(1, Ordering::Relaxed);
    }

    fn entities_detached(&self, _type_name: &str, count: usize) {
        self.entities_detached.fetch_add(count as u64, Ordering::Relaxed);
    }

    fn entities_restored(&self, _type_name: &str, count: usize) {
        self.entities_restored.fetch_add(count as u64, Ordering::Relaxed);
    }
}
