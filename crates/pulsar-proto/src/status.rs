//! Status codes and result envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of outcomes for an exchange or an operation.
///
/// `Ok` is the only success tag. Each tag maps to exactly one fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// Operation executed successfully
    Ok,
    /// Argument validation failed (client side only, never transmitted)
    ValidationFailed,
    /// Operation executed but the addressed element does not exist
    ElementNotFound,
    /// Operation refused, e.g. a failed precondition
    OperationRejected,
    /// No reply arrived within the retry budget
    Timeout,
    /// The request could not be sent
    Unreachable,
    /// Received bytes could not be decoded
    Malformed,
    /// Received bytes reference a type or version unknown to the receiver
    SchemaMismatch,
    /// Anything unexpected inside guarded execution
    InternalError,
}

impl StatusCode {
    pub const ALL: [StatusCode; 9] = [
        StatusCode::Ok,
        StatusCode::ValidationFailed,
        StatusCode::ElementNotFound,
        StatusCode::OperationRejected,
        StatusCode::Timeout,
        StatusCode::Unreachable,
        StatusCode::Malformed,
        StatusCode::SchemaMismatch,
        StatusCode::InternalError,
    ];

    /// Fixed human-readable message for this status
    pub fn message(&self) -> &'static str {
        match self {
            StatusCode::Ok => "Command completed successfully",
            StatusCode::ValidationFailed => "Invalid command arguments",
            StatusCode::ElementNotFound => "Element not found",
            StatusCode::OperationRejected => "Operation rejected",
            StatusCode::Timeout => "Server did not respond in time",
            StatusCode::Unreachable => "Server is unreachable",
            StatusCode::Malformed => "Received data was corrupted",
            StatusCode::SchemaMismatch => "Received data references an unknown type",
            StatusCode::InternalError => "Internal error while executing the command",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StatusCode::Ok)
    }

    /// True for the statuses that mean the exchange itself did not complete
    pub fn is_transport_failure(&self) -> bool {
        matches!(self, StatusCode::Timeout | StatusCode::Unreachable)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatusCode::Ok => "OK",
            StatusCode::ValidationFailed => "VALIDATION_FAILED",
            StatusCode::ElementNotFound => "ELEMENT_NOT_FOUND",
            StatusCode::OperationRejected => "OPERATION_REJECTED",
            StatusCode::Timeout => "TIMEOUT",
            StatusCode::Unreachable => "UNREACHABLE",
            StatusCode::Malformed => "MALFORMED",
            StatusCode::SchemaMismatch => "SCHEMA_MISMATCH",
            StatusCode::InternalError => "INTERNAL_ERROR",
        };
        f.write_str(name)
    }
}

/// The `(value, status)` pair returned by every operation body and every
/// transport failure path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub value: Option<String>,
    pub status: StatusCode,
}

impl ResultEnvelope {
    pub fn new(value: Option<String>, status: StatusCode) -> Self {
        Self { value, status }
    }

    /// Successful result carrying a value
    pub fn ok(value: impl Into<String>) -> Self {
        Self::new(Some(value.into()), StatusCode::Ok)
    }

    /// Successful result with nothing to report beyond the status
    pub fn ok_empty() -> Self {
        Self::new(None, StatusCode::Ok)
    }

    /// Result with the status's fixed message only
    pub fn from_status(status: StatusCode) -> Self {
        Self::new(None, status)
    }

    /// Result with a more specific message than the status's fixed one
    pub fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self::new(Some(message.into()), status)
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Text to show the user: the value if present, otherwise the fixed message
    pub fn text(&self) -> &str {
        self.value.as_deref().unwrap_or_else(|| self.status.message())
    }
}

impl From<StatusCode> for ResultEnvelope {
    fn from(status: StatusCode) -> Self {
        Self::from_status(status)
    }
}
