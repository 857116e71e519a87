//! Property access used by the entity reference tracker.

use crate::entity::{EntityReferences, Value};
use crate::traits::Injectable;

/// A managed object whose properties can cross a serialization boundary.
///
/// Every non-transient property declared in the type's schema must be
/// reachable through [`property`](Self::property) and
/// [`property_mut`](Self::property_mut).
///
/// # Examples
///
/// ```rust
/// use weft_di::{EntityReferences, Injectable, Persistable, SlotCell, Value};
///
/// #[derive(Default)]
/// struct Basket {
///     owner: Value,
///     references: EntityReferences,
/// }
///
/// impl Injectable for Basket {
///     fn slot(&self, _name: &str) -> Option<&dyn SlotCell> {
///         None
///     }
/// }
///
/// impl Persistable for Basket {
///     fn property(&self, name: &str) -> Option<&Value> {
///         (name == "owner").then_some(&self.owner)
///     }
///
///     fn property_mut(&mut self, name: &str) -> Option<&mut Value> {
///         (name == "owner").then_some(&mut self.owner)
///     }
///
///     fn entity_references(&self) -> &EntityReferences {
///         &self.references
///     }
///
///     fn entity_references_mut(&mut self) -> &mut EntityReferences {
///         &mut self.references
///     }
/// }
/// ```
pub trait Persistable: Injectable {
    fn property(&self, name: &str) -> Option<&Value>;

    fn property_mut(&mut self, name: &str) -> Option<&mut Value>;

    /// Side table filled during preparation and drained on restore.
    fn entity_references(&self) -> &EntityReferences;

    fn entity_references_mut(&mut self) -> &mut EntityReferences;
}
