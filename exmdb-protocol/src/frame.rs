//! Request framing and response headers.
//!
//! Request layout:
//!
//! ```text
//! +---------+---------+-------------------+
//! | length  | call_id | body              |
//! | 4 bytes | 1 byte  | length - 1 bytes  |
//! +---------+---------+-------------------+
//! ```
//!
//! Response layout:
//!
//! ```text
//! +---------+---------+-------------------+
//! | code    | length  | payload           |
//! | 1 byte  | 4 bytes | length bytes      |
//! +---------+---------+-------------------+
//! ```
//!
//! A response may also consist of the code byte alone.

use crate::buffer::{Buffer, WStringEncoding};
use crate::constants::ResponseCode;
use crate::error::ProtocolError;
use crate::request::Request;
use crate::MAX_PAYLOAD_SIZE;
use bytes::Bytes;

/// Size of the request length prefix.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Size of a full response header (code + payload length).
pub const RESPONSE_HEADER_SIZE: usize = 5;

/// Serializes a request into a length-prefixed frame.
pub fn encode_request<R: Request + ?Sized>(
    request: &R,
    wstring: WStringEncoding,
) -> Result<Bytes, ProtocolError> {
    let mut buf = Buffer::with_encoding(wstring);
    buf.put(&0u32).put(&R::CALL_ID.code());
    request.write_body(&mut buf)?;

    let length = (buf.len() - LENGTH_PREFIX_SIZE) as u32;
    buf.data_mut()[..LENGTH_PREFIX_SIZE].copy_from_slice(&length.to_le_bytes());
    Ok(buf.freeze())
}

/// Returns the length declared in a frame's prefix.
pub fn declared_length(frame: &[u8]) -> Option<u32> {
    let prefix: [u8; LENGTH_PREFIX_SIZE] = frame.get(..LENGTH_PREFIX_SIZE)?.try_into().ok()?;
    Some(u32::from_le_bytes(prefix))
}

/// Parsed response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    /// Raw response code.
    pub code: u8,
    /// Payload length following the header.
    pub length: u32,
}

impl ResponseHeader {
    pub fn new(code: ResponseCode, length: u32) -> Self {
        Self {
            code: code.code(),
            length,
        }
    }

    pub fn parse(header: &[u8; RESPONSE_HEADER_SIZE]) -> Self {
        Self {
            code: header[0],
            length: u32::from_le_bytes([header[1], header[2], header[3], header[4]]),
        }
    }

    pub fn encode(&self) -> [u8; RESPONSE_HEADER_SIZE] {
        let length = self.length.to_le_bytes();
        [self.code, length[0], length[1], length[2], length[3]]
    }

    pub fn response_code(&self) -> Option<ResponseCode> {
        ResponseCode::from_code(self.code)
    }

    pub fn is_success(&self) -> bool {
        self.code == ResponseCode::Success.code()
    }

    /// Rejects payload lengths above [`MAX_PAYLOAD_SIZE`].
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.length > MAX_PAYLOAD_SIZE {
            return Err(ProtocolError::FrameTooLarge {
                size: self.length,
                max: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(())
    }
}
