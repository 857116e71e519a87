//! The built container: object registry, injector, and construction pipeline.
//!
//! A [`Container`] is produced by [`ServiceCollection::build`] and owns all
//! process-wide state: the singleton cache, the table of lazy proxies, the
//! settings tree, and the optional persistence lookup used on restore.
//!
//! [`ServiceCollection::build`]: crate::ServiceCollection::build

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};
use std::time::Instant;

use parking_lot::{Mutex, ReentrantMutex, RwLock};

use crate::config::Settings;
use crate::entity::PersistenceLookup;
use crate::error::{DiError, DiResult};
use crate::internal::with_circular_guard;
use crate::key::ServiceId;
use crate::lazy::{LazyDependency, ProxyHash};
use crate::lifetime::Lifetime;
use crate::observer::Observers;
use crate::registration::{AnyArc, Catalog, Recipe, Registration};
use crate::schema::TypeSchema;
use crate::traits::{Component, ResolverCore};

mod construct;
pub mod context;
mod inject;

pub use context::ResolverContext;

/// Dependency injection container.
///
/// Cloning is cheap and every clone shares the same registry. Lazy proxies
/// handed out by the container only hold a weak reference to it; forcing one
/// after every clone was dropped fails with [`DiError::ContainerUnavailable`].
///
/// # Thread Safety
///
/// Singleton creation is serialized by one container-wide reentrant lock.
/// A singleton is visible to re-entrant lookups on the constructing thread as
/// soon as it is instantiated, and to other threads only once it is ready.
///
/// # Examples
///
/// ```
/// use weft_di::{ServiceCollection, ServiceId, Lifetime, Resolver};
/// use std::sync::Arc;
///
/// struct Database { url: String }
/// struct Repository { db: Arc<Database> }
///
/// let mut services = ServiceCollection::new();
/// services.add_instance("Database", Database { url: "postgres://localhost".into() });
/// services.add_factory("Repository", Lifetime::Prototype, |ctx| {
///     Ok(Repository { db: ctx.get(&ServiceId::new("Database"))? })
/// });
///
/// let container = services.build();
/// let repo = container.get_required::<Repository>(&ServiceId::new("Repository"));
/// assert_eq!(repo.db.url, "postgres://localhost");
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

pub(crate) struct ContainerInner {
    pub(crate) catalog: Catalog,
    pub(crate) settings: Settings,
    pub(crate) persistence: Option<Arc<dyn PersistenceLookup>>,
    pub(crate) observers: Observers,
    singletons: RwLock<HashMap<ServiceId, AnyArc>>,
    // partially constructed singletons, visible only to the owning thread
    constructing: Mutex<HashMap<ServiceId, (ThreadId, AnyArc)>>,
    creation: ReentrantMutex<()>,
    proxies: RwLock<HashMap<ProxyHash, Arc<LazyDependency>>>,
    schemas: RwLock<HashMap<TypeId, Arc<TypeSchema>>>,
}

impl Container {
    pub(crate) fn new(
        catalog: Catalog,
        settings: Settings,
        persistence: Option<Arc<dyn PersistenceLookup>>,
        observers: Observers,
    ) -> Self {
        let singletons = catalog
            .iter()
            .filter_map(|(id, registration)| match &registration.recipe {
                Recipe::Instance(instance) => Some((id.clone(), instance.clone())),
                _ => None,
            })
            .collect();

        Self {
            inner: Arc::new(ContainerInner {
                catalog,
                settings,
                persistence,
                observers,
                singletons: RwLock::new(singletons),
                constructing: Mutex::new(HashMap::new()),
                creation: ReentrantMutex::new(()),
                proxies: RwLock::new(HashMap::new()),
                schemas: RwLock::new(HashMap::new()),
            }),
        }
    }

    #[inline]
    pub(crate) fn inner(&self) -> &ContainerInner {
        &self.inner
    }

    fn downgrade(&self) -> Weak<ContainerInner> {
        Arc::downgrade(&self.inner)
    }

    /// Settings tree used for settings-style injection.
    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    /// Registers `instance` as the singleton for `id`, replacing any cached one.
    ///
    /// ```
    /// use weft_di::{ServiceCollection, ServiceId, Resolver};
    /// use std::sync::Arc;
    ///
    /// let container = ServiceCollection::new().build();
    /// let id = ServiceId::new("Acme.Region");
    /// assert!(container.get_instance::<String>(&id).is_none());
    ///
    /// container.set_instance(id.clone(), Arc::new("eu-west".to_string()));
    /// assert_eq!(container.get::<String>(&id).unwrap().as_str(), "eu-west");
    /// ```
    pub fn set_instance<T: Any + Send + Sync>(&self, id: impl Into<ServiceId>, instance: Arc<T>) {
        let id = id.into();
        let canonical = self.inner.catalog.canonical(&id).clone();
        self.inner.singletons.write().insert(canonical, instance);
    }

    /// Returns the proxy for `hash`, creating it with `resolver` if none exists yet.
    ///
    /// Repeated requests for the same hash return the same proxy.
    pub fn create_lazy_dependency<F>(
        &self,
        hash: ProxyHash,
        target: ServiceId,
        type_hint: impl Into<String>,
        resolver: F,
    ) -> Arc<LazyDependency>
    where
        F: Fn() -> DiResult<AnyArc> + Send + Sync + 'static,
    {
        if let Some(existing) = self.inner.proxies.read().get(&hash) {
            return existing.clone();
        }

        let mut created = false;
        let proxy = self
            .inner
            .proxies
            .write()
            .entry(hash)
            .or_insert_with(|| {
                created = true;
                Arc::new(LazyDependency::new(hash, target.clone(), type_hint, resolver))
            })
            .clone();

        if created && self.inner.observers.has_observers() {
            self.inner.observers.lazy_created(hash, &target);
        }
        proxy
    }

    /// Retrieves an existing proxy for `hash` if it targets `target`.
    pub fn get_lazy_dependency_by_hash(&self, hash: ProxyHash, target: &ServiceId) -> Option<Arc<LazyDependency>> {
        self.inner
            .proxies
            .read()
            .get(&hash)
            .filter(|proxy| proxy.target() == target)
            .cloned()
    }

    /// Proxy for the `(owner, slot)` pair whose resolver goes through this registry.
    pub(crate) fn lazy_dependency(&self, owner: &str, slot: &str, target: &ServiceId) -> Arc<LazyDependency> {
        let hash = ProxyHash::for_slot(owner, slot);
        if let Some(proxy) = self.get_lazy_dependency_by_hash(hash, target) {
            return proxy;
        }

        let weak = self.downgrade();
        let id = target.clone();
        self.create_lazy_dependency(hash, target.clone(), self.type_hint(target), move || {
            let inner = weak
                .upgrade()
                .ok_or_else(|| DiError::ContainerUnavailable(id.clone()))?;
            let container = Container { inner };
            match container.resolve_any(&id) {
                Ok(instance) => {
                    if container.inner.observers.has_observers() {
                        container.inner.observers.lazy_resolved(hash, &id);
                    }
                    Ok(instance)
                }
                Err(err) => {
                    tracing::warn!(service = %id, proxy = %hash, error = %err, "lazy dependency failed to resolve");
                    Err(err)
                }
            }
        })
    }

    fn type_hint(&self, id: &ServiceId) -> String {
        self.inner
            .catalog
            .resolve(id)
            .map(|(_, registration)| registration.type_name.to_string())
            .unwrap_or_default()
    }

    /// Returns `true` when a recipe (or alias) is registered for `id`.
    pub fn is_registered(&self, id: &ServiceId) -> bool {
        self.inner.catalog.contains(id)
    }

    /// Lifetime of the recipe behind `id`, following aliases.
    pub fn lifetime_of(&self, id: &ServiceId) -> Option<Lifetime> {
        self.inner
            .catalog
            .resolve(id)
            .ok()
            .map(|(_, registration)| registration.lifetime)
    }

    /// Number of ready singletons in the cache.
    pub fn singleton_count(&self) -> usize {
        self.inner.singletons.read().len()
    }

    /// Number of lazy proxies created so far.
    pub fn lazy_dependency_count(&self) -> usize {
        self.inner.proxies.read().len()
    }

    /// Schema for `T`, taken from its registration or built once and cached.
    pub(crate) fn schema_of<T: Component>(&self) -> Arc<TypeSchema> {
        let type_id = TypeId::of::<T>();
        let registered = self
            .inner
            .catalog
            .identity_of(type_id)
            .and_then(|id| self.inner.catalog.resolve(id).ok())
            .and_then(|(_, registration)| registration.schema().cloned());
        if let Some(schema) = registered {
            return schema;
        }

        if let Some(schema) = self.inner.schemas.read().get(&type_id) {
            return schema.clone();
        }
        self.inner
            .schemas
            .write()
            .entry(type_id)
            .or_insert_with(|| Arc::new(T::schema()))
            .clone()
    }

    fn resolve_uncached(&self, id: &ServiceId) -> DiResult<AnyArc> {
        let (canonical, registration) = self.inner.catalog.resolve(id)?;

        let observed = self.inner.observers.has_observers();
        let start = observed.then(Instant::now);
        if observed {
            self.inner.observers.resolving(id);
        }

        let result = match registration.lifetime {
            Lifetime::Singleton => self.resolve_singleton(canonical, registration),
            Lifetime::Prototype => self.create(canonical, registration),
        };

        if let Some(start) = start {
            self.inner.observers.resolved(id, start.elapsed());
        }
        result
    }

    fn resolve_singleton(&self, id: &ServiceId, registration: &Registration) -> DiResult<AnyArc> {
        if let Some(instance) = self.inner.singletons.read().get(id) {
            return Ok(instance.clone());
        }

        let _creation = self.inner.creation.lock();
        // another thread may have finished it while we waited
        if let Some(instance) = self.instance_any(id) {
            return Ok(instance);
        }

        let instance = self.create(id, registration)?;
        // components cache themselves; factories are cached here
        let cached = self
            .inner
            .singletons
            .write()
            .entry(id.clone())
            .or_insert(instance)
            .clone();
        Ok(cached)
    }

    fn create(&self, id: &ServiceId, registration: &Registration) -> DiResult<AnyArc> {
        match &registration.recipe {
            Recipe::Component { build, .. } => build(self, id, registration),
            Recipe::Factory(factory) => {
                let ctx = ResolverContext::new(self);
                factory(&ctx)
            }
            Recipe::Instance(instance) => Ok(instance.clone()),
            Recipe::Alias(_) => Err(DiError::UnresolvableService(id.clone())),
        }
    }

    /// Publishes a partially constructed singleton to the current thread.
    pub(crate) fn begin_construction(&self, id: &ServiceId, instance: AnyArc) {
        self.inner
            .constructing
            .lock()
            .insert(id.clone(), (thread::current().id(), instance));
    }

    pub(crate) fn end_construction(&self, id: &ServiceId) -> Option<AnyArc> {
        self.inner.constructing.lock().remove(id).map(|(_, instance)| instance)
    }

    pub(crate) fn store_singleton(&self, id: &ServiceId, instance: AnyArc) {
        self.inner.singletons.write().insert(id.clone(), instance);
    }

    pub(crate) fn creation_lock(&self) -> parking_lot::ReentrantMutexGuard<'_, ()> {
        self.inner.creation.lock()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut entries: Vec<_> = self.inner.catalog.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        let singletons = self.inner.singletons.read();
        let mut s = String::new();
        s.push_str("=== Container Debug ===\n");
        s.push_str("Registrations:\n");
        for (id, registration) in entries {
            let recipe = match &registration.recipe {
                Recipe::Component { .. } => "component".to_string(),
                Recipe::Factory(_) => "factory".to_string(),
                Recipe::Instance(_) => "instance".to_string(),
                Recipe::Alias(target) => format!("alias of {}", target),
            };
            let cached = if singletons.contains_key(id) { " [cached]" } else { "" };
            s.push_str(&format!(
                "  {}: {:?} {} ({}){}\n",
                id, registration.lifetime, recipe, registration.type_name, cached
            ));
        }
        s.push_str(&format!("Lazy dependencies: {}\n", self.lazy_dependency_count()));
        s
    }
}

impl ResolverCore for Container {
    fn resolve_any(&self, id: &ServiceId) -> DiResult<AnyArc> {
        // partially constructed singletons short-circuit before the cycle guard
        if let Some(instance) = self.instance_any(id) {
            return Ok(instance);
        }
        let canonical = self.inner.catalog.canonical(id);
        with_circular_guard(canonical.as_str(), || self.resolve_uncached(id))
    }

    fn instance_any(&self, id: &ServiceId) -> Option<AnyArc> {
        let canonical = self.inner.catalog.canonical(id);
        if let Some(instance) = self.inner.singletons.read().get(canonical) {
            return Some(instance.clone());
        }

        let current = thread::current().id();
        self.inner
            .constructing
            .lock()
            .get(canonical)
            .filter(|(owner, _)| *owner == current)
            .map(|(_, instance)| instance.clone())
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.inner.catalog.len())
            .field("singletons", &self.singleton_count())
            .field("lazy_dependencies", &self.lazy_dependency_count())
            .finish()
    }
}
