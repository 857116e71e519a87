//! Constructor arguments for the construction pipeline.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::{DiError, DiResult};
use crate::registration::AnyArc;

/// A single constructor argument.
#[derive(Clone)]
pub enum Argument {
    /// Plain data, decoded on demand by the constructor.
    Value(serde_json::Value),
    /// An already constructed object.
    Object(AnyArc),
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Argument::Object(_) => f.write_str("Object(..)"),
        }
    }
}

/// Positional constructor arguments supplied by the caller.
///
/// Positions map onto the parameters declared in the type's schema. A skipped
/// position is treated the same as a missing one.
///
/// # Examples
///
/// ```rust
/// use weft_di::Arguments;
/// use serde_json::json;
///
/// let args = Arguments::new()
///     .value(json!("EUR"))
///     .skip()
///     .value(3);
/// assert_eq!(args.len(), 3);
/// assert!(args.get(1).is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    items: Vec<Option<Argument>>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a data argument.
    pub fn value(mut self, value: impl Into<serde_json::Value>) -> Self {
        self.items.push(Some(Argument::Value(value.into())));
        self
    }

    /// Appends an object argument.
    pub fn object<T: Any + Send + Sync>(mut self, object: Arc<T>) -> Self {
        self.items.push(Some(Argument::Object(object)));
        self
    }

    /// Leaves the next position empty.
    pub fn skip(mut self) -> Self {
        self.items.push(None);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Argument> {
        self.items.get(position).and_then(Option::as_ref)
    }

    pub(crate) fn take(&mut self, position: usize) -> Option<Argument> {
        self.items.get_mut(position).and_then(Option::take)
    }
}

/// Arguments bound to parameter names, handed to [`Component::construct`].
///
/// [`Component::construct`]: crate::Component::construct
pub struct BoundArguments {
    type_name: &'static str,
    entries: Vec<(&'static str, Option<Argument>)>,
}

impl BoundArguments {
    pub(crate) fn new(type_name: &'static str, entries: Vec<(&'static str, Option<Argument>)>) -> Self {
        Self { type_name, entries }
    }

    fn lookup(&self, name: &'static str) -> Option<&Argument> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .and_then(|(_, a)| a.as_ref())
    }

    /// Returns `true` when a value was bound to `name`.
    pub fn is_present(&self, name: &'static str) -> bool {
        self.lookup(name).is_some()
    }

    /// Decodes the data argument bound to `name`.
    pub fn value<D: DeserializeOwned>(&self, name: &'static str) -> DiResult<D> {
        self.optional_value(name)?.ok_or(DiError::MissingConstructorArgument {
            type_name: self.type_name,
            parameter: name,
        })
    }

    /// Decodes the data argument bound to `name`, if any.
    pub fn optional_value<D: DeserializeOwned>(&self, name: &'static str) -> DiResult<Option<D>> {
        match self.lookup(name) {
            None => Ok(None),
            Some(Argument::Value(v)) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| self.invalid(name, e.to_string())),
            Some(Argument::Object(_)) => Err(self.invalid(name, "expected a value, found an object".into())),
        }
    }

    /// Returns the object argument bound to `name`.
    pub fn object<T: Any + Send + Sync>(&self, name: &'static str) -> DiResult<Arc<T>> {
        match self.lookup(name) {
            None => Err(DiError::MissingConstructorArgument {
                type_name: self.type_name,
                parameter: name,
            }),
            Some(Argument::Object(o)) => o
                .clone()
                .downcast::<T>()
                .map_err(|_| DiError::TypeMismatch { expected: std::any::type_name::<T>() }),
            Some(Argument::Value(_)) => Err(self.invalid(name, "expected an object, found a value".into())),
        }
    }

    fn invalid(&self, parameter: &'static str, reason: String) -> DiError {
        DiError::InvalidArgument {
            type_name: self.type_name,
            parameter,
            reason,
        }
    }
}
