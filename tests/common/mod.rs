//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use weft_di::{
    BoundArguments, Component, DiResult, Entity, EntityRef, EntityReferences, Inject, Injectable,
    LifecycleCause, LookupError, Persistable, PersistenceLookup, PropertyKind, SlotCell, TypeSchema, Value,
};

// ===== Entities =====

#[derive(Debug)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub saved: bool,
    pub proxy: bool,
}

impl Customer {
    pub fn persisted(id: &str) -> Arc<Self> {
        Arc::new(Self { id: id.to_string(), name: format!("Customer {}", id), saved: true, proxy: false })
    }

    pub fn unsaved(id: &str) -> Arc<Self> {
        Arc::new(Self { id: id.to_string(), name: "draft".to_string(), saved: false, proxy: false })
    }

    pub fn unloaded(id: &str) -> Arc<Self> {
        Arc::new(Self { id: id.to_string(), name: String::new(), saved: false, proxy: true })
    }
}

impl Entity for Customer {
    fn entity_type(&self) -> &str {
        "Customer"
    }

    fn identifier(&self) -> String {
        self.id.clone()
    }

    fn is_new(&self) -> bool {
        !self.saved
    }

    fn is_unresolved_proxy(&self) -> bool {
        self.proxy
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// In-memory persistence lookup.
#[derive(Default)]
pub struct StubLookup {
    entities: HashMap<(String, String), EntityRef>,
    pub calls: AtomicUsize,
}

impl StubLookup {
    pub fn with_customers(ids: &[&str]) -> Arc<Self> {
        let mut lookup = Self::default();
        for id in ids {
            lookup
                .entities
                .insert(("Customer".to_string(), id.to_string()), Customer::persisted(id));
        }
        Arc::new(lookup)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PersistenceLookup for StubLookup {
    fn resolve_entity(&self, entity_type: &str, identifier: &str) -> Result<EntityRef, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if identifier == "E-500" {
            return Err(LookupError::Failed("database offline".to_string()));
        }
        self.entities
            .get(&(entity_type.to_string(), identifier.to_string()))
            .cloned()
            .ok_or(LookupError::NotFound)
    }
}

// ===== Collaborators =====

/// Singleton collaborator.
pub struct Clock {
    pub zone: String,
}

impl Injectable for Clock {
    fn slot(&self, _name: &str) -> Option<&dyn SlotCell> {
        None
    }
}

impl Component for Clock {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>().singleton().optional_parameter("zone")
    }

    fn construct(args: &BoundArguments) -> DiResult<Self> {
        Ok(Self { zone: args.optional_value("zone")?.unwrap_or_else(|| "UTC".to_string()) })
    }
}

/// Prototype collaborator.
pub struct Ticket {
    pub serial: usize,
}

static NEXT_TICKET: AtomicUsize = AtomicUsize::new(0);

impl Injectable for Ticket {
    fn slot(&self, _name: &str) -> Option<&dyn SlotCell> {
        None
    }
}

impl Component for Ticket {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>()
    }

    fn construct(_: &BoundArguments) -> DiResult<Self> {
        Ok(Self { serial: NEXT_TICKET.fetch_add(1, Ordering::SeqCst) })
    }
}

// ===== Persistable object =====

/// Prototype object with every kind of property the tracker handles.
pub struct Cart {
    pub currency: String,
    pub customer: Value,
    pub items: Value,
    pub by_key: Value,
    pub note: Value,
    pub scratch: Value,
    pub helper: Value,
    pub clock: Inject<Clock>,
    pub ticket: Inject<Ticket>,
    pub limits: Mutex<Option<serde_json::Value>>,
    pub lifecycle: Mutex<Vec<LifecycleCause>>,
    references: EntityReferences,
}

impl Cart {
    pub fn lifecycle(&self) -> Vec<LifecycleCause> {
        self.lifecycle.lock().clone()
    }

    pub fn customer_id(&self) -> Option<String> {
        self.customer.as_entity().map(|e| e.identifier())
    }
}

impl Injectable for Cart {
    fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
        match name {
            "clock" => Some(&self.clock),
            "ticket" => Some(&self.ticket),
            _ => None,
        }
    }

    fn inject_settings(&self, slot: &str, value: &serde_json::Value) -> DiResult<()> {
        if slot == "limits" {
            *self.limits.lock() = Some(value.clone());
        }
        Ok(())
    }

    fn initialize(&self, cause: LifecycleCause) -> DiResult<()> {
        self.lifecycle.lock().push(cause);
        Ok(())
    }
}

impl Component for Cart {
    fn schema() -> TypeSchema {
        TypeSchema::new::<Self>()
            .optional_parameter("currency")
            .property("customer", PropertyKind::Reference)
            .property("items", PropertyKind::Container)
            .property("byKey", PropertyKind::Container)
            .property("note", PropertyKind::Scalar)
            .transient_property("scratch", PropertyKind::Reference)
            .property("helper", PropertyKind::Reference)
            .inject("clock", "Clock")
            .inject("ticket", "Ticket")
            .inject_settings("limits", "Shop.limits")
    }

    fn construct(args: &BoundArguments) -> DiResult<Self> {
        Ok(Self {
            currency: args.optional_value("currency")?.unwrap_or_else(|| "EUR".to_string()),
            customer: Value::Null,
            items: Value::Seq(Vec::new()),
            by_key: Value::map(Vec::<(String, Value)>::new()),
            note: Value::Null,
            scratch: Value::Null,
            helper: Value::Null,
            clock: Inject::new(),
            ticket: Inject::new(),
            limits: Mutex::new(None),
            lifecycle: Mutex::new(Vec::new()),
            references: EntityReferences::new(),
        })
    }
}

impl Persistable for Cart {
    fn property(&self, name: &str) -> Option<&Value> {
        match name {
            "customer" => Some(&self.customer),
            "items" => Some(&self.items),
            "byKey" => Some(&self.by_key),
            "note" => Some(&self.note),
            "scratch" => Some(&self.scratch),
            "helper" => Some(&self.helper),
            _ => None,
        }
    }

    fn property_mut(&mut self, name: &str) -> Option<&mut Value> {
        match name {
            "customer" => Some(&mut self.customer),
            "items" => Some(&mut self.items),
            "byKey" => Some(&mut self.by_key),
            "note" => Some(&mut self.note),
            "scratch" => Some(&mut self.scratch),
            "helper" => Some(&mut self.helper),
            _ => None,
        }
    }

    fn entity_references(&self) -> &EntityReferences {
        &self.references
    }

    fn entity_references_mut(&mut self) -> &mut EntityReferences {
        &mut self.references
    }
}

/// Registers `Clock` (singleton) and `Ticket` (prototype).
pub fn register_collaborators(services: &mut weft_di::ServiceCollection) {
    services.register::<Clock>("Clock");
    services.register::<Ticket>("Ticket");
}

/// Builds a `Cart` through the container and takes sole ownership of it.
pub fn new_cart(container: &weft_di::Container) -> Cart {
    let cart = container
        .construct::<Cart>(weft_di::Arguments::new())
        .expect("cart should construct");
    Arc::try_unwrap(cart).ok().expect("prototype carts are not retained")
}
