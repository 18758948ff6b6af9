//! Error types for command dispatch

use pulsar_proto::{ResourceKind, ResultEnvelope, StatusCode};
use thiserror::Error;

/// Registry mutation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Command '{0}' already exists, use reassign to replace it")]
    AlreadyExists(String),

    #[error("Command '{0}' does not exist")]
    NotFound(String),
}

/// Raw tokens could not be turned into an argument vector
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Not enough arguments: expected {expected}, got {got}")]
    MissingArguments { expected: usize, got: usize },

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ValidationError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn into_envelope(self) -> ResultEnvelope {
        ResultEnvelope::with_message(StatusCode::ValidationFailed, self.to_string())
    }
}

/// A placeholder could not be matched against the resource set
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No {kind} resource available for the placeholder at position {position}")]
    Unresolved { position: usize, kind: ResourceKind },
}

/// Failures inside an operation body that are not domain outcomes.
///
/// All of them are reported as `InternalError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Argument {index} is missing")]
    MissingArgument { index: usize },

    #[error("Argument {index}: expected {expected}, found {found}")]
    WrongType {
        index: usize,
        expected: &'static str,
        found: String,
    },

    #[error("{0}")]
    Failed(String),
}

impl CommandError {
    pub fn into_envelope(self) -> ResultEnvelope {
        ResultEnvelope::with_message(StatusCode::InternalError, self.to_string())
    }
}
