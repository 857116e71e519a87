//! Service identity types for the container.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Logical name used to request a dependency.
///
/// Identities are case-sensitive and compared by their full string. They usually
/// name an interface or a concrete type; the concrete implementation behind an
/// identity is decided by the [`ServiceCollection`](crate::ServiceCollection)
/// that built the container.
///
/// Cloning is cheap: the name is shared behind an `Arc<str>`.
///
/// # Examples
///
/// ```rust
/// use weft_di::ServiceId;
///
/// let logger = ServiceId::new("Acme.Log.Logger");
/// assert_eq!(logger.as_str(), "Acme.Log.Logger");
/// assert_ne!(logger, ServiceId::new("acme.log.logger"));
///
/// struct Mailer;
/// let by_type = ServiceId::of::<Mailer>();
/// assert!(by_type.as_str().ends_with("Mailer"));
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(Arc<str>);

impl ServiceId {
    /// Creates an identity from any string-like name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Identity derived from the Rust type name of `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Arc::from(std::any::type_name::<T>()))
    }

    /// Returns the identity as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceId({})", self.0)
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl AsRef<str> for ServiceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identities_are_case_sensitive() {
        let mut set = HashSet::new();
        set.insert(ServiceId::new("Cache"));
        set.insert(ServiceId::new("cache"));
        set.insert(ServiceId::from("Cache".to_string()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn type_identity_uses_type_name() {
        struct Mailer;
        assert_eq!(ServiceId::of::<Mailer>().as_str(), std::any::type_name::<Mailer>());
        assert_eq!(format!("{}", ServiceId::new("A.B")), "A.B");
    }

    #[test]
    fn serializes_as_a_plain_string() {
        let id = ServiceId::new("Acme.Clock");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"Acme.Clock\"");
        let back: ServiceId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
