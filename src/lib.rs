//! # weft-di
//!
//! Dependency injection runtime with singleton and prototype lifetimes, lazy
//! proxies for circular graphs, and serialization-safe entity references.
//!
//! ## Features
//!
//! - **Explicit schemas**: every managed type declares its constructor
//!   parameters, properties, and dependency slots once, no reflection
//! - **Circular graphs**: singletons are visible to their own construction, and
//!   lazy slots bind a [`LazyDependency`] that resolves on first use
//! - **Entity references**: [`Container::prepare_for_serialization`] detaches
//!   persisted entities into a side table and
//!   [`Container::restore_after_deserialization`] fetches them back
//! - **Thread-safe**: one reentrant creation lock; partially built singletons
//!   never leak to other threads
//!
//! ## Quick Start
//!
//! ```rust
//! use weft_di::{
//!     BoundArguments, Component, DiResult, Inject, Injectable, Resolver, ServiceCollection,
//!     ServiceId, SlotCell, TypeSchema,
//! };
//!
//! struct Orders {
//!     billing: Inject<Billing>,
//! }
//!
//! struct Billing {
//!     orders: Inject<Orders>,
//! }
//!
//! impl Injectable for Orders {
//!     fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
//!         (name == "billing").then_some(&self.billing as &dyn SlotCell)
//!     }
//! }
//!
//! impl Component for Orders {
//!     fn schema() -> TypeSchema {
//!         TypeSchema::new::<Self>().singleton().inject("billing", "Billing")
//!     }
//!
//!     fn construct(_: &BoundArguments) -> DiResult<Self> {
//!         Ok(Self { billing: Inject::new() })
//!     }
//! }
//!
//! impl Injectable for Billing {
//!     fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
//!         (name == "orders").then_some(&self.orders as &dyn SlotCell)
//!     }
//! }
//!
//! impl Component for Billing {
//!     fn schema() -> TypeSchema {
//!         TypeSchema::new::<Self>().singleton().inject("orders", "Orders")
//!     }
//!
//!     fn construct(_: &BoundArguments) -> DiResult<Self> {
//!         Ok(Self { orders: Inject::new() })
//!     }
//! }
//!
//! let mut services = ServiceCollection::new();
//! services.register::<Orders>("Orders");
//! services.register::<Billing>("Billing");
//!
//! let container = services.build();
//! let orders = container.get::<Orders>(&ServiceId::new("Orders")).unwrap();
//! let billing = orders.billing.get().unwrap();
//! assert!(std::sync::Arc::ptr_eq(&billing.orders.get().unwrap(), &orders));
//! ```
//!
//! ## Lifetimes
//!
//! - **Singleton**: created once per container and shared
//! - **Prototype**: created fresh for every request and owned by the requester

// Module declarations
pub mod arguments;
pub mod collection;
pub mod config;
pub mod entity;
pub mod error;
pub mod key;
pub mod lazy;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod schema;
pub mod traits;

// Internal modules
mod internal;
mod registration;

// Re-exports
pub use arguments::{Argument, Arguments, BoundArguments};
pub use collection::{
    ComponentRegistration, ServiceCollection, ServiceCollectionExt, ServiceCollectionModuleExt, ServiceModule,
};
pub use config::Settings;
pub use entity::{
    CollaboratorRecord, Entity, EntityRef, EntityReferenceRecord, EntityReferences, LookupError, PathSegment, PersistenceLookup,
    PropertyPath, Value, ENTITY_REFERENCES_PROPERTY,
};
pub use error::{DiError, DiResult};
pub use key::ServiceId;
pub use lazy::{Bound, Inject, LazyDependency, ProxyHash, SlotCell};
pub use lifetime::Lifetime;
pub use observer::{DiObserver, LoggingObserver, MetricsObserver};
pub use provider::{Container, ResolverContext};
pub use schema::{
    DependencySlot, InjectionStrategy, Parameter, PropertyKind, PropertySchema, SlotBinding, TypeSchema,
};
pub use traits::{Component, Injectable, LifecycleCause, Persistable, Resolver, ResolverCore};
