//! Error types for the frame codec

use crate::codec::{FrameKind, HEADER_LEN};
use crate::status::StatusCode;
use thiserror::Error;

/// Errors raised while building a frame
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Encoded frame is {size} bytes, exceeding the {limit}-byte datagram limit")]
    TooLarge { size: u64, limit: usize },

    #[error("Failed to serialize frame body: {0}")]
    Serialize(String),
}

/// Errors raised while reading a frame.
///
/// Every variant maps onto exactly one of `Malformed`, `SchemaMismatch` or
/// `InternalError` via [`DecodeError::status`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Datagram too short: {len} bytes, a frame header needs {}", HEADER_LEN)]
    Truncated { len: usize },

    #[error("Invalid frame magic: {found:?}")]
    InvalidMagic { found: [u8; 4] },

    #[error("Corrupted frame body: {0}")]
    Corrupted(String),

    #[error("Unsupported protocol version: expected {expected}, found {found}")]
    VersionMismatch { expected: u8, found: u8 },

    #[error("Unknown frame kind: {0}")]
    UnknownKind(u8),

    #[error("Frame body references an unknown type: {0}")]
    UnknownType(String),

    #[error("Expected a {expected} frame, received a {found} frame")]
    WrongKind { expected: FrameKind, found: FrameKind },
}

impl DecodeError {
    /// Status reported to the peer or caller for this failure
    pub fn status(&self) -> StatusCode {
        match self {
            DecodeError::Truncated { .. }
            | DecodeError::InvalidMagic { .. }
            | DecodeError::Corrupted(_) => StatusCode::Malformed,
            DecodeError::VersionMismatch { .. }
            | DecodeError::UnknownKind(_)
            | DecodeError::UnknownType(_) => StatusCode::SchemaMismatch,
            DecodeError::WrongKind { .. } => StatusCode::InternalError,
        }
    }
}

impl From<bincode::Error> for DecodeError {
    fn from(err: bincode::Error) -> Self {
        match *err {
            // serde reports out-of-range enum tags as a custom "variant index" message
            bincode::ErrorKind::Custom(ref msg) if msg.contains("variant") => {
                DecodeError::UnknownType(msg.clone())
            }
            other => DecodeError::Corrupted(other.to_string()),
        }
    }
}
