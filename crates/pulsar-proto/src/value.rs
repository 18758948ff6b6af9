//! Argument values and resource placeholders.

use crate::model::Person;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a live, non-serializable object that only the receiving side owns.
///
/// A placeholder carries one of these tags instead of the object itself; the
/// receiver swaps it for the first resource of the same kind it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// The shared people collection
    Collection,
    /// The persistence handle behind the collection
    Database,
    /// The command registry (only ever resolved locally)
    Registry,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Collection => "collection",
            ResourceKind::Database => "database",
            ResourceKind::Registry => "registry",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A wire-transmissible argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Person(Person),
}

impl Value {
    /// Short name of the variant, used in type-mismatch diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Person(_) => "person",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Person> for Value {
    fn from(v: Person) -> Self {
        Value::Person(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// One element of an argument vector.
///
/// Either a plain value, or a placeholder standing in for a resource the
/// sending side does not possess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Argument {
    Value(Value),
    NeedsResource(ResourceKind),
}

impl Argument {
    /// Wrap a plain value
    pub fn value(v: impl Into<Value>) -> Self {
        Argument::Value(v.into())
    }

    /// Build a placeholder for a resource of the given kind
    pub fn placeholder(kind: ResourceKind) -> Self {
        Argument::NeedsResource(kind)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Argument::NeedsResource(_))
    }

    /// The resource kind this argument waits for, if it is a placeholder
    pub fn expected_kind(&self) -> Option<ResourceKind> {
        match self {
            Argument::NeedsResource(kind) => Some(*kind),
            Argument::Value(_) => None,
        }
    }
}

impl From<Value> for Argument {
    fn from(v: Value) -> Self {
        Argument::Value(v)
    }
}
