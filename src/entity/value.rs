//! Property values seen by the entity reference tracker.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::{DiError, DiResult};
use crate::key::ServiceId;
use crate::lazy::Bound;
use crate::registration::AnyArc;

use super::path::PathSegment;
use super::{Entity, EntityRef};

/// How far past the end of a sequence `set_at` will pad with `Null`.
const MAX_INDEX_GAP: usize = 1 << 16;

/// Value held by a persistable property.
///
/// Plain data lives in [`Value::Scalar`]; containers nest arbitrarily. Only
/// [`Value::Entity`] elements are ever detached by the tracker.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Scalar(serde_json::Value),
    Seq(Vec<Value>),
    Map(IndexMap<String, Value>),
    Set(Vec<Value>),
    Entity(EntityRef),
    /// A collaborator held by value rather than through a slot.
    Service {
        identity: ServiceId,
        bound: Bound,
    },
    /// Any other object, serialized as-is by the caller.
    Object(AnyArc),
}

impl Value {
    pub fn scalar(value: impl Into<serde_json::Value>) -> Self {
        Value::Scalar(value.into())
    }

    pub fn entity<E: Entity>(entity: Arc<E>) -> Self {
        Value::Entity(entity)
    }

    pub fn object<T: Any + Send + Sync>(object: Arc<T>) -> Self {
        Value::Object(object)
    }

    /// Builds a mapping from `(key, value)` pairs, keeping their order.
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Self {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn seq(items: impl IntoIterator<Item = Value>) -> Self {
        Value::Seq(items.into_iter().collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_container(&self) -> bool {
        matches!(self, Value::Seq(_) | Value::Map(_) | Value::Set(_))
    }

    pub fn as_scalar(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&EntityRef> {
        match self {
            Value::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    /// Downcasts an entity element to its concrete type.
    pub fn entity_as<E: Entity>(&self) -> Option<&E> {
        self.as_entity().and_then(|e| e.as_any().downcast_ref::<E>())
    }

    /// Walks `segments` below this value.
    pub fn get_at(&self, segments: &[PathSegment]) -> Option<&Value> {
        segments.iter().try_fold(self, |node, segment| match (node, segment) {
            (Value::Map(map), PathSegment::Key(key)) => map.get(key),
            (Value::Seq(items) | Value::Set(items), PathSegment::Index(i)) => items.get(*i),
            _ => None,
        })
    }

    /// Writes `value` at `segments`, rebuilding missing intermediate containers.
    ///
    /// Keys create mappings, indexes create sequences padded with `Null`.
    ///
    /// ```
    /// use weft_di::{Value, PathSegment};
    ///
    /// let mut root = Value::Null;
    /// root.set_at(&[PathSegment::Key("a".into()), PathSegment::Index(2)], Value::scalar(7)).unwrap();
    ///
    /// let slot = root.get_at(&[PathSegment::Key("a".into()), PathSegment::Index(2)]).unwrap();
    /// assert_eq!(slot.as_scalar(), Some(&serde_json::json!(7)));
    /// assert!(root.get_at(&[PathSegment::Key("a".into()), PathSegment::Index(0)]).unwrap().is_null());
    /// ```
    ///
    /// # Errors
    ///
    /// [`DiError::InvalidPropertyPath`] for an index that lies too far beyond
    /// the end of its sequence. `value` is not written in that case.
    pub fn set_at(&mut self, segments: &[PathSegment], value: Value) -> DiResult<()> {
        let Some((head, rest)) = segments.split_first() else {
            *self = value;
            return Ok(());
        };

        match head {
            PathSegment::Key(key) => {
                if !matches!(self, Value::Map(_)) {
                    *self = Value::Map(IndexMap::new());
                }
                if let Value::Map(map) = self {
                    map.entry(key.clone()).or_default().set_at(rest, value)?;
                }
            }
            PathSegment::Index(index) => {
                let len = match self {
                    Value::Seq(items) | Value::Set(items) => items.len(),
                    _ => 0,
                };
                if index.saturating_sub(len) > MAX_INDEX_GAP {
                    return Err(DiError::InvalidPropertyPath {
                        path: segments.iter().map(ToString::to_string).collect::<Vec<_>>().join("."),
                        reason: format!("index {} is out of range for a sequence of {} elements", index, len),
                    });
                }
                if !matches!(self, Value::Seq(_) | Value::Set(_)) {
                    *self = Value::Seq(Vec::new());
                }
                if let Value::Seq(items) | Value::Set(items) = self {
                    if items.len() <= *index {
                        items.resize_with(index + 1, Value::default);
                    }
                    items[*index].set_at(rest, value)?;
                }
            }
        }
        Ok(())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Scalar(value)
    }
}

impl From<EntityRef> for Value {
    fn from(entity: EntityRef) -> Self {
        Value::Entity(entity)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("Null"),
            Value::Scalar(value) => write!(f, "Scalar({})", value),
            Value::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Set(items) => f.debug_tuple("Set").field(items).finish(),
            Value::Entity(entity) => {
                write!(f, "Entity({}#{})", entity.entity_type(), entity.identifier())
            }
            Value::Service { identity, bound } => f
                .debug_struct("Service")
                .field("identity", identity)
                .field("bound", bound)
                .finish(),
            Value::Object(_) => f.write_str("Object(..)"),
        }
    }
}
