//! Frame codec: one request or one response per datagram.
//!
//! Only the command alias and its argument vector travel on the wire. The
//! operation body never does; both sides hold the same registry keyed by alias.

use crate::error::{DecodeError, EncodeError};
use crate::status::ResultEnvelope;
use crate::value::Argument;
use bincode::Options;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Magic bytes opening every frame
pub const FRAME_MAGIC: &[u8; 4] = b"PLSR";

/// Current protocol version
pub const PROTOCOL_VERSION: u8 = 1;

/// Magic + version + kind + request id
pub const HEADER_LEN: usize = 4 + 1 + 1 + 8;

/// Largest frame that fits a single IPv4 UDP datagram
pub const MAX_DATAGRAM_SIZE: usize = 65_507;

/// Receive buffer size (the 16-bit UDP length ceiling)
pub const RECV_BUFFER_SIZE: usize = 65_535;

/// Discriminates the two frame bodies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Request = 1,
    Response = 2,
}

impl FrameKind {
    fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        match byte {
            1 => Ok(FrameKind::Request),
            2 => Ok(FrameKind::Response),
            other => Err(DecodeError::UnknownKind(other)),
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Request => f.write_str("request"),
            FrameKind::Response => f.write_str("response"),
        }
    }
}

/// A decoded request frame
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Correlation id chosen by the client, echoed in the response
    pub id: u64,
    pub alias: String,
    pub args: Vec<Argument>,
}

/// A decoded response frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Id of the request this answers; `0` when the request was unreadable
    pub id: u64,
    pub envelope: ResultEnvelope,
}

#[derive(Serialize)]
struct RequestBodyRef<'a> {
    alias: &'a str,
    args: &'a [Argument],
}

#[derive(Deserialize)]
struct RequestBody {
    alias: String,
    args: Vec<Argument>,
}

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_DATAGRAM_SIZE as u64)
        .reject_trailing_bytes()
}

fn encode_frame<T: Serialize>(kind: FrameKind, id: u64, body: &T) -> Result<Vec<u8>, EncodeError> {
    let body_size = match wire_options().serialized_size(body) {
        Ok(size) => size,
        Err(e) => match *e {
            bincode::ErrorKind::SizeLimit => {
                return Err(EncodeError::TooLarge {
                    size: MAX_DATAGRAM_SIZE as u64 + 1,
                    limit: MAX_DATAGRAM_SIZE,
                })
            }
            other => return Err(EncodeError::Serialize(other.to_string())),
        },
    };

    let size = HEADER_LEN as u64 + body_size;
    if size > MAX_DATAGRAM_SIZE as u64 {
        return Err(EncodeError::TooLarge {
            size,
            limit: MAX_DATAGRAM_SIZE,
        });
    }

    let mut frame = Vec::with_capacity(size as usize);
    frame.extend_from_slice(FRAME_MAGIC);
    frame.push(PROTOCOL_VERSION);
    frame.push(kind as u8);
    frame.extend_from_slice(&id.to_le_bytes());
    wire_options()
        .serialize_into(&mut frame, body)
        .map_err(|e| EncodeError::Serialize(e.to_string()))?;

    Ok(frame)
}

/// Validate the header and return `(kind, id, body)`
fn split_frame(bytes: &[u8]) -> Result<(FrameKind, u64, &[u8]), DecodeError> {
    if bytes.len() < HEADER_LEN {
        return Err(DecodeError::Truncated { len: bytes.len() });
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&bytes[0..4]);
    if &magic != FRAME_MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }

    let version = bytes[4];
    if version != PROTOCOL_VERSION {
        return Err(DecodeError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            found: version,
        });
    }

    let kind = FrameKind::from_byte(bytes[5])?;

    let mut id_bytes = [0u8; 8];
    id_bytes.copy_from_slice(&bytes[6..HEADER_LEN]);

    Ok((kind, u64::from_le_bytes(id_bytes), &bytes[HEADER_LEN..]))
}

fn expect_kind(expected: FrameKind, found: FrameKind) -> Result<(), DecodeError> {
    if expected != found {
        return Err(DecodeError::WrongKind { expected, found });
    }
    Ok(())
}

/// Encode a request: the alias, then the argument vector
pub fn encode_request(id: u64, alias: &str, args: &[Argument]) -> Result<Vec<u8>, EncodeError> {
    encode_frame(FrameKind::Request, id, &RequestBodyRef { alias, args })
}

/// Encode a response envelope
pub fn encode_response(id: u64, envelope: &ResultEnvelope) -> Result<Vec<u8>, EncodeError> {
    encode_frame(FrameKind::Response, id, envelope)
}

/// Decode a request frame
pub fn decode_request(bytes: &[u8]) -> Result<Request, DecodeError> {
    let (kind, id, body) = split_frame(bytes)?;
    expect_kind(FrameKind::Request, kind)?;

    let body: RequestBody = wire_options().deserialize(body)?;
    Ok(Request {
        id,
        alias: body.alias,
        args: body.args,
    })
}

/// Decode a response frame
pub fn decode_response(bytes: &[u8]) -> Result<Response, DecodeError> {
    let (kind, id, body) = split_frame(bytes)?;
    expect_kind(FrameKind::Response, kind)?;

    let envelope: ResultEnvelope = wire_options().deserialize(body)?;
    Ok(Response { id, envelope })
}

/// Best-effort read of the request id from a frame whose body may be unreadable.
///
/// Returns `0` (uncorrelated) when the header itself cannot be trusted.
pub fn peek_request_id(bytes: &[u8]) -> u64 {
    match split_frame(bytes) {
        Ok((_, id, _)) => id,
        Err(_) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Color, Coordinates, Country, Person};
    use crate::status::StatusCode;
    use crate::value::{ResourceKind, Value};
    use chrono::NaiveDate;

    fn sample_person() -> Person {
        Person {
            id: 3,
            name: "Ada".to_string(),
            coordinates: Coordinates::new(1.5, -2.0),
            creation_date: NaiveDate::from_ymd_opt(2023, 5, 17).unwrap(),
            height: Some(172),
            passport_id: Some("AB123456".to_string()),
            eye_color: Color::Orange,
            nationality: Country::Germany,
            location: None,
        }
    }

    #[test]
    fn test_request_round_trip() {
        let args = vec![
            Argument::value(999i64),
            Argument::value("needle"),
            Argument::value(sample_person()),
            Argument::Value(Value::Null),
            Argument::placeholder(ResourceKind::Collection),
            Argument::placeholder(ResourceKind::Database),
        ];

        let bytes = encode_request(41, "update", &args).unwrap();
        let request = decode_request(&bytes).unwrap();

        assert_eq!(request.id, 41);
        assert_eq!(request.alias, "update");
        assert_eq!(request.args, args);
    }

    #[test]
    fn test_response_round_trip() {
        let envelope = ResultEnvelope::ok("350");
        let bytes = encode_response(7, &envelope).unwrap();
        let response = decode_response(&bytes).unwrap();

        assert_eq!(response.id, 7);
        assert_eq!(response.envelope, envelope);
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_request(0x0102, "info", &[]).unwrap();
        assert_eq!(&bytes[0..4], FRAME_MAGIC);
        assert_eq!(bytes[4], PROTOCOL_VERSION);
        assert_eq!(bytes[5], FrameKind::Request as u8);
        assert_eq!(peek_request_id(&bytes), 0x0102);
    }

    #[test]
    fn test_oversized_request_fails_at_encode() {
        let huge = "x".repeat(MAX_DATAGRAM_SIZE);
        let result = encode_request(1, "filter_contains_name", &[Argument::value(huge)]);
        assert!(matches!(result, Err(EncodeError::TooLarge { .. })));
    }

    #[test]
    fn test_just_under_limit_encodes() {
        let text = "y".repeat(MAX_DATAGRAM_SIZE - HEADER_LEN - 64);
        let bytes = encode_request(1, "a", &[Argument::value(text)]).unwrap();
        assert!(bytes.len() <= MAX_DATAGRAM_SIZE);
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = decode_request(b"definitely not a frame").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidMagic { .. }));
        assert_eq!(err.status(), StatusCode::Malformed);

        let err = decode_request(b"PL").unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { len: 2 }));
        assert_eq!(err.status(), StatusCode::Malformed);
    }

    #[test]
    fn test_truncated_body_is_malformed() {
        let bytes = encode_request(5, "show", &[Argument::value("abcdef")]).unwrap();
        let err = decode_request(&bytes[..bytes.len() - 3]).unwrap_err();
        assert_eq!(err.status(), StatusCode::Malformed);
    }

    #[test]
    fn test_trailing_bytes_are_malformed() {
        let mut bytes = encode_response(5, &ResultEnvelope::ok_empty()).unwrap();
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let err = decode_response(&bytes).unwrap_err();
        assert_eq!(err.status(), StatusCode::Malformed);
    }

    #[test]
    fn test_version_skew_is_schema_mismatch() {
        let mut bytes = encode_request(1, "info", &[]).unwrap();
        bytes[4] = PROTOCOL_VERSION + 1;
        let err = decode_request(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::VersionMismatch { .. }));
        assert_eq!(err.status(), StatusCode::SchemaMismatch);
    }

    #[test]
    fn test_unknown_frame_kind_is_schema_mismatch() {
        let mut bytes = encode_request(1, "info", &[]).unwrap();
        bytes[5] = 9;
        let err = decode_request(&bytes).unwrap_err();
        assert_eq!(err, DecodeError::UnknownKind(9));
        assert_eq!(err.status(), StatusCode::SchemaMismatch);
    }

    #[test]
    fn test_unknown_status_variant_is_schema_mismatch() {
        let mut bytes = encode_response(1, &ResultEnvelope::from_status(StatusCode::Ok)).unwrap();
        // Body is: Option tag (0 = None), then the varint status index.
        let last = bytes.len() - 1;
        bytes[last] = 120;
        let err = decode_response(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownType(_)), "got {:?}", err);
        assert_eq!(err.status(), StatusCode::SchemaMismatch);
    }

    #[test]
    fn test_wrong_frame_kind_is_internal_error() {
        let bytes = encode_response(1, &ResultEnvelope::ok_empty()).unwrap();
        let err = decode_request(&bytes).unwrap_err();
        assert!(matches!(err, DecodeError::WrongKind { .. }));
        assert_eq!(err.status(), StatusCode::InternalError);
    }

    #[test]
    fn test_peek_id_of_unreadable_body() {
        let mut bytes = encode_request(77, "info", &[]).unwrap();
        bytes.truncate(HEADER_LEN + 1);
        assert!(decode_request(&bytes).is_err());
        assert_eq!(peek_request_id(&bytes), 77);
        assert_eq!(peek_request_id(b"junk"), 0);
    }
}
