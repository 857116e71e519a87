//! Resolver context for factory functions.

use std::sync::Arc;

use crate::arguments::Arguments;
use crate::config::Settings;
use crate::error::DiResult;
use crate::key::ServiceId;
use crate::registration::AnyArc;
use crate::traits::{Component, ResolverCore};

use super::Container;

/// Context passed to factory functions for resolving dependencies.
///
/// # Examples
///
/// ```
/// use weft_di::{ServiceCollection, ServiceId, Lifetime, Resolver, Settings};
/// use serde_json::json;
///
/// struct Pool { size: u32 }
///
/// let mut services = ServiceCollection::new();
/// services.with_settings(Settings::from_value(json!({"Acme": {"pool": 8}})));
/// services.add_factory("Pool", Lifetime::Singleton, |ctx| {
///     let size = ctx.settings().get_as::<u32>("Acme.pool")?.unwrap_or(1);
///     Ok(Pool { size })
/// });
///
/// let container = services.build();
/// assert_eq!(container.get_required::<Pool>(&ServiceId::new("Pool")).size, 8);
/// ```
pub struct ResolverContext<'a> {
    container: &'a Container,
}

impl<'a> ResolverContext<'a> {
    pub(crate) fn new(container: &'a Container) -> Self {
        Self { container }
    }

    pub fn settings(&self) -> &Settings {
        self.container.settings()
    }

    /// Runs the construction pipeline for `T`.
    pub fn construct<T: Component>(&self, args: Arguments) -> DiResult<Arc<T>> {
        self.container.construct::<T>(args)
    }
}

impl ResolverCore for ResolverContext<'_> {
    fn resolve_any(&self, id: &ServiceId) -> DiResult<AnyArc> {
        self.container.resolve_any(id)
    }

    fn instance_any(&self, id: &ServiceId) -> Option<AnyArc> {
        self.container.instance_any(id)
    }
}
