//! Length-prefixed frame codec for IPC messages.
//!
//! Wire format:
//! ```text
//! [payload_len:4][payload:N]
//! ```
//! `payload_len` is big-endian; the payload is a `bincode`-encoded
//! [`Request`](super::Request) or [`Response`](super::Response).

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Size of the length prefix in bytes.
pub const FRAME_HEADER_LEN: usize = 4;

/// Largest payload either side will accept.
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum CodecError {
    /// The byte slice is shorter than one complete frame.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The length prefix exceeds the negotiated maximum.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// The payload is not a valid encoding of the expected message type.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes `msg` into a single frame including the length prefix.
///
/// # Errors
///
/// [`CodecError::FrameTooLarge`] if the encoded payload exceeds
/// [`MAX_FRAME_LEN`], [`CodecError::MalformedPayload`] if serialization fails.
///
/// # Examples
///
/// ```rust
/// use dms_core::protocol::{decode_frame, encode_frame, Request};
///
/// let bytes = encode_frame(&Request::GetAllDisplayIds).unwrap();
/// let (decoded, consumed): (Request, usize) = decode_frame(&bytes).unwrap();
/// assert_eq!(decoded, Request::GetAllDisplayIds);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>, CodecError> {
    let payload =
        bincode::serialize(msg).map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
    if payload.len() > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decodes one frame from the start of `bytes`.
///
/// Returns the message and the number of bytes consumed so the caller can
/// advance its read cursor.
///
/// # Errors
///
/// [`CodecError::InsufficientData`] when `bytes` does not yet hold a whole
/// frame; the caller should read more and retry.
pub fn decode_frame<T: DeserializeOwned>(bytes: &[u8]) -> Result<(T, usize), CodecError> {
    let len = peek_frame_len(bytes)?;
    let total = FRAME_HEADER_LEN + len;
    if bytes.len() < total {
        return Err(CodecError::InsufficientData {
            needed: total,
            available: bytes.len(),
        });
    }
    let msg = bincode::deserialize(&bytes[FRAME_HEADER_LEN..total])
        .map_err(|e| CodecError::MalformedPayload(e.to_string()))?;
    Ok((msg, total))
}

fn peek_frame_len(bytes: &[u8]) -> Result<usize, CodecError> {
    if bytes.len() < FRAME_HEADER_LEN {
        return Err(CodecError::InsufficientData {
            needed: FRAME_HEADER_LEN,
            available: bytes.len(),
        });
    }
    let mut prefix = [0u8; FRAME_HEADER_LEN];
    prefix.copy_from_slice(&bytes[..FRAME_HEADER_LEN]);
    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    Ok(len)
}

// ── Streaming reassembly ──────────────────────────────────────────────────────

/// Accumulates bytes from a stream and yields complete frames.
///
/// A single socket read may return half a frame or several frames at once;
/// push whatever arrived and drain with [`FrameBuffer::next_frame`] until it
/// returns `Ok(None)`.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops the next complete frame, or `Ok(None)` if more bytes are needed.
    ///
    /// # Errors
    ///
    /// Oversized or malformed frames are unrecoverable for the stream.
    pub fn next_frame<T: DeserializeOwned>(&mut self) -> Result<Option<T>, CodecError> {
        match decode_frame(&self.buf) {
            Ok((msg, consumed)) => {
                self.buf.drain(..consumed);
                Ok(Some(msg))
            }
            Err(CodecError::InsufficientData { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn buffered_len(&self) -> usize {
        self.buf.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::ScreenId;
    use crate::domain::types::Point;
    use crate::error::DmError;
    use crate::protocol::messages::{Request, Response};

    #[test]
    fn test_decode_frame_with_partial_header_needs_more_data() {
        let result: Result<(Request, usize), _> = decode_frame(&[0, 0]);
        assert_eq!(
            result,
            Err(CodecError::InsufficientData {
                needed: 4,
                available: 2
            })
        );
    }

    #[test]
    fn test_decode_frame_rejects_oversized_length_prefix() {
        let bytes = (MAX_FRAME_LEN as u32 + 1).to_be_bytes();
        let result: Result<(Request, usize), _> = decode_frame(&bytes);
        assert!(matches!(result, Err(CodecError::FrameTooLarge { .. })));
    }

    #[test]
    fn test_decode_frame_rejects_garbage_payload() {
        let mut bytes = 4u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0xFF, 0xFF, 0xFF, 0xFF]);
        let result: Result<(Request, usize), _> = decode_frame(&bytes);
        assert!(matches!(result, Err(CodecError::MalformedPayload(_))));
    }

    #[test]
    fn test_frame_buffer_reassembles_split_and_coalesced_frames() {
        // Arrange – two frames delivered as three uneven chunks
        let first = encode_frame(&Request::MakeExpand {
            ids: vec![ScreenId(0), ScreenId(2)],
            points: vec![Point::new(0, 0), Point::new(1920, 0)],
        })
        .unwrap();
        let second = encode_frame(&Request::StopMirror(vec![ScreenId(2)])).unwrap();
        let mut stream = first.clone();
        stream.extend_from_slice(&second);
        let (a, rest) = stream.split_at(3);
        let (b, c) = rest.split_at(first.len());

        let mut buffer = FrameBuffer::new();

        // Act / Assert
        buffer.push(a);
        assert_eq!(buffer.next_frame::<Request>().unwrap(), None);
        buffer.push(b);
        assert!(matches!(
            buffer.next_frame::<Request>().unwrap(),
            Some(Request::MakeExpand { .. })
        ));
        assert_eq!(buffer.next_frame::<Request>().unwrap(), None);
        buffer.push(c);
        assert_eq!(
            buffer.next_frame::<Request>().unwrap(),
            Some(Request::StopMirror(vec![ScreenId(2)]))
        );
        assert_eq!(buffer.buffered_len(), 0);
    }

    #[test]
    fn test_error_results_survive_encoding() {
        let response = Response::Status(Err(DmError::invalid("ids and points differ in length")));
        let bytes = encode_frame(&response).unwrap();
        let (decoded, _): (Response, usize) = decode_frame(&bytes).unwrap();
        assert_eq!(decoded, response);
    }
}
