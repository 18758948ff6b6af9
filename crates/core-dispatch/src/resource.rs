//! Resources and placeholder resolution.
//!
//! A request is assembled on a side that does not hold the mutable state it
//! operates on. Instead of the object, the sender puts an
//! [`Argument::NeedsResource`] marker in the vector; [`resolve`] swaps each
//! marker for the first resource of the matching kind held by the executing
//! side, position by position.

use crate::error::ResolveError;
use pulsar_proto::{Argument, ResourceKind, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A live object that can satisfy a placeholder
pub trait Resource: Any + Send + Sync {
    /// Kind tag matched against placeholders
    fn kind(&self) -> ResourceKind;

    /// Upcast for typed access after resolution
    fn as_any(&self) -> &dyn Any;
}

/// Ordered set of resources available to the executing side
#[derive(Clone, Default)]
pub struct ResourceSet {
    entries: Vec<Arc<dyn Resource>>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append
    pub fn with(mut self, resource: Arc<dyn Resource>) -> Self {
        self.entries.push(resource);
        self
    }

    pub fn push(&mut self, resource: Arc<dyn Resource>) {
        self.entries.push(resource);
    }

    /// First resource of the given kind, in insertion order
    pub fn first_of(&self, kind: ResourceKind) -> Option<&Arc<dyn Resource>> {
        self.entries.iter().find(|r| r.kind() == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for ResourceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|r| r.kind()))
            .finish()
    }
}

/// An argument after placeholder resolution
#[derive(Clone)]
pub enum Resolved {
    Value(Value),
    Resource(Arc<dyn Resource>),
}

impl fmt::Debug for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolved::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Resolved::Resource(r) => f.debug_tuple("Resource").field(&r.kind()).finish(),
        }
    }
}

/// Replace every placeholder in `args` by the first matching resource.
///
/// Plain values pass through unchanged and keep their position. A placeholder
/// with no resource of its kind is an error; nothing is silently nulled.
pub fn resolve(args: Vec<Argument>, resources: &ResourceSet) -> Result<Vec<Resolved>, ResolveError> {
    args.into_iter()
        .enumerate()
        .map(|(position, arg)| match arg {
            Argument::Value(value) => Ok(Resolved::Value(value)),
            Argument::NeedsResource(kind) => resources
                .first_of(kind)
                .cloned()
                .map(Resolved::Resource)
                .ok_or(ResolveError::Unresolved { position, kind }),
        })
        .collect()
}
