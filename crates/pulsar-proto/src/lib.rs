//! Wire protocol definitions for Pulsar.
//!
//! This crate holds everything that crosses the datagram channel between a
//! client and a Star server:
//!
//! - **Values and arguments**: the closed set of transmissible argument values,
//!   plus the resource placeholders a sender uses for objects it does not own
//! - **Result envelopes**: the `(value, status)` pair every operation and every
//!   transport failure produces
//! - **Frame codec**: one self-contained frame per datagram, bounded in size
//!
//! # Frame layout
//!
//! ```text
//! ┌───────────┬─────────┬──────┬──────────────┬────────────────────┐
//! │ "PLSR"    │ version │ kind │ request id   │ bincode body       │
//! │ 4 bytes   │ u8      │ u8   │ u64 LE       │ ≤ 65_493 bytes     │
//! └───────────┴─────────┴──────┴──────────────┴────────────────────┘
//! ```

pub mod codec;
pub mod error;
pub mod model;
pub mod status;
pub mod value;

pub use codec::{
    decode_request, decode_response, encode_request, encode_response, peek_request_id, FrameKind,
    Request, Response, FRAME_MAGIC, HEADER_LEN, MAX_DATAGRAM_SIZE, PROTOCOL_VERSION,
    RECV_BUFFER_SIZE,
};
pub use error::{DecodeError, EncodeError};
pub use model::{Color, Coordinates, Country, Location, Person};
pub use status::{ResultEnvelope, StatusCode};
pub use value::{Argument, ResourceKind, Value};
