//! Core traits for the dependency injection runtime.

mod component;
mod persistable;
mod resolver;

pub use component::{Component, Injectable, LifecycleCause};
pub use persistable::Persistable;
pub use resolver::{Resolver, ResolverCore};
