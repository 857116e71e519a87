mod common;

use std::sync::Arc;

use common::{register_collaborators, Clock};
use weft_di::{
    BoundArguments, Component, DiError, DiResult, Inject, Injectable, Resolver, ServiceCollection, ServiceId,
    SlotCell, TypeSchema,
};

// ===== Lazy singleton pair =====

struct Orders {
    billing: Inject<Billing>,
}

struct Billing {
    orders: Inject<Orders>,
}

impl Injectable for Orders {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        (name == "billing").then_some(&self.billing as &dyn SlotCell)
    }
}

impl Component for Orders {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().singleton().inject("billing", "Billing")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { billing: Inject::new() })
    }
}

impl Injectable for Billing {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        (name == "orders").then_some(&self.orders as &dyn SlotCell)
    }
}

impl Component for Billing {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().singleton().inject("orders", "Orders")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { orders: Inject::new() })
    }
}

// ===== Eager singleton pair =====

struct Alpha {
    beta: Inject<Beta>,
}

struct Beta {
    alpha: Inject<Alpha>,
}

impl Injectable for Alpha {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        (name == "beta").then_some(&self.beta as &dyn SlotCell)
    }
}

impl Component for Alpha {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().singleton().inject_eager("beta", "Beta")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { beta: Inject::new() })
    }
}

impl Injectable for Beta {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        (name == "alpha").then_some(&self.alpha as &dyn SlotCell)
    }
}

impl Component for Beta {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().singleton().inject_eager("alpha", "Alpha")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { alpha: Inject::new() })
    }
}

// ===== Prototype pair =====

struct Ping {
    pong: Inject<Pong>,
}

struct Pong {
    ping: Inject<Ping>,
}

impl Injectable for Ping {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        (name == "pong").then_some(&self.pong as &dyn SlotCell)
    }
}

impl Component for Ping {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().inject("pong", "Pong")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { pong: Inject::new() })
    }
}

impl Injectable for Pong {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        (name == "ping").then_some(&self.ping as &dyn SlotCell)
    }
}

impl Component for Pong {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().inject("ping", "Ping")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { ping: Inject::new() })
    }
}

// ===== Holder of a single lazy slot =====

struct Holder {
    target: Inject<Clock>,
}

impl Injectable for Holder {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        (name == "target").then_some(&self.target as &dyn SlotCell)
    }
}

struct MissingHolder(Holder);

impl Injectable for MissingHolder {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        self.0.slot(name)
    }
}

impl Component for MissingHolder {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().singleton().inject("target", "Nowhere")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self(Holder { target: Inject::new() }))
    }
}

impl Component for Holder {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().singleton().inject("target", "Clock")
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { target: Inject::new() })
    }
}

fn id(name: &str) -> ServiceId {
    ServiceId::new(name)
}

#[test]
fn lazy_singleton_cycle_resolves_to_shared_instances() {
    let mut services = ServiceCollection::new();
    services.register::<Orders>("Orders");
    services.register::<Billing>("Billing");
    let container = services.build();

    let orders = container.get::<Orders>(&id("Orders")).unwrap();
    assert!(orders.billing.is_proxy());
    assert!(!orders.billing.is_resolved());
    assert_eq!(container.lazy_dependency_count(), 1);

    let billing = orders.billing.get().unwrap();
    assert!(orders.billing.is_resolved());
    assert!(Arc::ptr_eq(&billing.orders.get().unwrap(), &orders));
    assert!(Arc::ptr_eq(&billing, &container.get::<Billing>(&id("Billing")).unwrap()));
}

#[test]
fn eager_singleton_cycle_sees_partial_instance() {
    let mut services = ServiceCollection::new();
    services.register::<Alpha>("Alpha");
    services.register::<Beta>("Beta");
    let container = services.build();

    let alpha = container.get::<Alpha>(&id("Alpha")).unwrap();
    let beta = alpha.beta.peek().unwrap();
    assert!(Arc::ptr_eq(&beta.alpha.peek().unwrap(), &alpha));
    assert_eq!(container.lazy_dependency_count(), 0);
    assert_eq!(container.singleton_count(), 2);
}

#[test]
fn prototype_cycle_is_reported_with_its_path() {
    let mut services = ServiceCollection::new();
    services.register::<Ping>("Ping");
    services.register::<Pong>("Pong");
    let container = services.build();

    match container.get::<Ping>(&id("Ping")) {
        Err(DiError::CircularResolution(path)) => assert_eq!(path, vec!["Ping", "Pong", "Ping"]),
        other => panic!("expected circular resolution, got {:?}", other.map(|_| ())),
    }
    // the resolution stack is unwound after the failure
    assert!(matches!(
        container.get::<Ping>(&id("Ping")),
        Err(DiError::CircularResolution(_))
    ));
}

#[test]
fn lazy_failure_surfaces_on_first_use() {
    let mut services = ServiceCollection::new();
    services.register::<MissingHolder>("Holder");
    let container = services.build();

    let holder = container.get::<MissingHolder>(&id("Holder")).unwrap();
    assert!(holder.0.target.is_proxy());
    match holder.0.target.get() {
        Err(DiError::UnresolvableService(missing)) => assert_eq!(missing.as_str(), "Nowhere"),
        other => panic!("expected unresolvable, got {:?}", other.map(|_| ())),
    }
    assert!(holder.0.target.get().is_err());
}

#[test]
fn forcing_after_container_drop_is_unavailable() {
    let mut services = ServiceCollection::new();
    register_collaborators(&mut services);
    services.register::<Holder>("Holder");
    let container = services.build();

    let holder = container.get::<Holder>(&id("Holder")).unwrap();
    assert!(holder.target.is_proxy());
    drop(container);

    match holder.target.get() {
        Err(DiError::ContainerUnavailable(target)) => assert_eq!(target.as_str(), "Clock"),
        other => panic!("expected container unavailable, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn resolved_proxy_outlives_the_container() {
    let mut services = ServiceCollection::new();
    register_collaborators(&mut services);
    services.register::<Holder>("Holder");
    let container = services.build();

    let holder = container.get::<Holder>(&id("Holder")).unwrap();
    let clock = holder.target.get().unwrap();
    drop(container);

    assert!(Arc::ptr_eq(&holder.target.get().unwrap(), &clock));
}
