//! Typed access to a resolved argument vector

use crate::error::CommandError;
use crate::resource::{Resolved, Resource};
use pulsar_proto::{Person, Value};

/// Resolved arguments handed to an operation body
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    items: Vec<Resolved>,
}

impl Arguments {
    pub fn new(items: Vec<Resolved>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn get(&self, index: usize) -> Result<&Resolved, CommandError> {
        self.items
            .get(index)
            .ok_or(CommandError::MissingArgument { index })
    }

    /// The plain value at `index`
    pub fn value(&self, index: usize) -> Result<&Value, CommandError> {
        match self.get(index)? {
            Resolved::Value(v) => Ok(v),
            Resolved::Resource(r) => Err(CommandError::WrongType {
                index,
                expected: "value",
                found: format!("{} resource", r.kind()),
            }),
        }
    }

    pub fn int(&self, index: usize) -> Result<i64, CommandError> {
        match self.value(index)? {
            Value::Int(v) => Ok(*v),
            other => Err(Self::mismatch(index, "int", other)),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str, CommandError> {
        match self.value(index)? {
            Value::Text(v) => Ok(v),
            other => Err(Self::mismatch(index, "text", other)),
        }
    }

    pub fn person(&self, index: usize) -> Result<&Person, CommandError> {
        match self.value(index)? {
            Value::Person(v) => Ok(v),
            other => Err(Self::mismatch(index, "person", other)),
        }
    }

    /// The resolved resource at `index`, downcast to its concrete type
    pub fn resource<T: Resource>(&self, index: usize) -> Result<&T, CommandError> {
        match self.get(index)? {
            Resolved::Resource(r) => {
                r.as_any()
                    .downcast_ref::<T>()
                    .ok_or_else(|| CommandError::WrongType {
                        index,
                        expected: std::any::type_name::<T>(),
                        found: format!("{} resource", r.kind()),
                    })
            }
            Resolved::Value(v) => Err(Self::mismatch(index, std::any::type_name::<T>(), v)),
        }
    }

    fn mismatch(index: usize, expected: &'static str, found: &Value) -> CommandError {
        CommandError::WrongType {
            index,
            expected,
            found: found.type_name().to_string(),
        }
    }
}
