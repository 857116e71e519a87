//! Traits implemented by managed types.

use crate::arguments::BoundArguments;
use crate::error::DiResult;
use crate::lazy::SlotCell;
use crate::schema::TypeSchema;

/// Why a post-construction hook is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleCause {
    /// The object was just constructed and injected.
    Created,
    /// The object was restored after deserialization.
    Recreated,
}

/// Runtime view of a managed object used by the injector.
///
/// Implementations map slot names declared in the schema onto their
/// [`Inject`](crate::Inject) fields. Everything else has a no-op default.
///
/// # Examples
///
/// ```rust
/// use weft_di::{Injectable, Inject, SlotCell};
///
/// struct Mailer;
///
/// struct Newsletter {
///     mailer: Inject<Mailer>,
/// }
///
/// impl Injectable for Newsletter {
///     fn slot(&self, name: &str) -> Option<&dyn SlotCell> {
///         match name {
///             "mailer" => Some(&self.mailer),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Injectable: Send + Sync + 'static {
    /// Returns the slot cell registered under `name`.
    fn slot(&self, name: &str) -> Option<&dyn SlotCell>;

    /// Settings entry point, called once per settings slot before collaborators are bound.
    fn inject_settings(&self, _slot: &str, _value: &serde_json::Value) -> DiResult<()> {
        Ok(())
    }

    /// Post-construction hook, run after injection and after restore.
    fn initialize(&self, _cause: LifecycleCause) -> DiResult<()> {
        Ok(())
    }
}

/// A type the construction pipeline can build.
///
/// # Examples
///
/// ```rust
/// use weft_di::{Component, Injectable, SlotCell, TypeSchema, BoundArguments, DiResult};
///
/// struct Greeter {
///     greeting: String,
/// }
///
/// impl Injectable for Greeter {
///     fn slot(&self, _name: &str) -> Option<&dyn SlotCell> {
///         None
///     }
/// }
///
/// impl Component for Greeter {
///     fn schema() -> TypeSchema {
///         TypeSchema::new::<Self>().parameter("greeting")
///     }
///
///     fn construct(args: &BoundArguments) -> DiResult<Self> {
///         Ok(Self { greeting: args.value("greeting")? })
///     }
/// }
/// ```
pub trait Component: Injectable + Sized {
    /// Schema of this type. Built once and cached by the container.
    fn schema() -> TypeSchema;

    /// Creates the raw instance from bound constructor arguments.
    fn construct(args: &BoundArguments) -> DiResult<Self>;
}
