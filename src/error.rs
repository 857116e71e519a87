//! Error types for the dependency injection runtime.

use thiserror::Error;

use crate::key::ServiceId;

/// Errors raised while constructing, injecting, or restoring managed objects.
///
/// None of these are retried internally: they propagate to the immediate caller,
/// which owns any recovery.
///
/// # Examples
///
/// ```rust
/// use weft_di::{DiError, ServiceCollection, ServiceId, Resolver};
///
/// let container = ServiceCollection::new().build();
/// match container.get::<String>(&ServiceId::new("Missing")) {
///     Err(DiError::UnresolvableService(id)) => assert_eq!(id.as_str(), "Missing"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No construction recipe is known for the identity.
    #[error("Service not resolvable: {0}")]
    UnresolvableService(ServiceId),

    /// A required constructor parameter received no value.
    #[error("Missing constructor argument `{parameter}` for {type_name}")]
    MissingConstructorArgument {
        type_name: &'static str,
        parameter: &'static str,
    },

    /// A recorded entity reference could not be resolved on restore.
    #[error("Dangling entity reference at `{path}`: {entity_type}#{identifier}")]
    DanglingEntityReference {
        entity_type: String,
        identifier: String,
        path: String,
    },

    /// Resolution re-entered a service or lazy proxy that is still being resolved.
    #[error("Circular resolution: {}", .0.join(" -> "))]
    CircularResolution(Vec<String>),

    /// The resolved instance is not of the requested type.
    #[error("Type mismatch: expected {expected}")]
    TypeMismatch { expected: &'static str },

    /// A slot was read before the injector bound it.
    #[error("Slot not injected: {expected}")]
    NotInjected { expected: &'static str },

    /// The schema names a slot or property the object does not expose.
    #[error("Unknown slot `{slot}` on {type_name}")]
    UnknownSlot {
        type_name: &'static str,
        slot: String,
    },

    /// An argument was present but could not be decoded.
    #[error("Invalid argument `{parameter}` for {type_name}: {reason}")]
    InvalidArgument {
        type_name: &'static str,
        parameter: &'static str,
        reason: String,
    },

    /// A recorded path cannot be written back into the object.
    #[error("Invalid property path `{path}`: {reason}")]
    InvalidPropertyPath { path: String, reason: String },

    /// The persistence lookup failed for a reason other than a missing entity.
    #[error("Persistence lookup failed: {0}")]
    Persistence(String),

    /// A lazy proxy was forced after its container was dropped.
    #[error("Container unavailable while resolving {0}")]
    ContainerUnavailable(ServiceId),

    /// A service module failed to register its services.
    #[error("Module {module} failed: {source}")]
    Module {
        module: &'static str,
        #[source]
        source: Box<DiError>,
    },

    /// A settings source could not be read or parsed.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for container operations.
///
/// ```rust
/// use weft_di::{DiResult, DiError, ServiceId};
///
/// fn lookup(found: bool) -> DiResult<u32> {
///     if found { Ok(7) } else { Err(DiError::UnresolvableService(ServiceId::new("Port"))) }
/// }
///
/// assert_eq!(lookup(true).unwrap(), 7);
/// assert!(lookup(false).is_err());
/// ```
pub type DiResult<T> = Result<T, DiError>;
