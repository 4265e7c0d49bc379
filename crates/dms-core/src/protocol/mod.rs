//! IPC protocol: message types and the length-prefixed frame codec.

pub mod codec;
pub mod messages;

pub use codec::{decode_frame, encode_frame, CodecError, FrameBuffer, MAX_FRAME_LEN};
pub use messages::*;
