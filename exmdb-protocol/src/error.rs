//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding requests or decoding responses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("reached end of buffer: {needed} bytes requested, {available} available")]
    BufferUnderflow { needed: usize, available: usize },

    #[error("reached end of buffer while reading {0}")]
    MissingTerminator(&'static str),

    #[error("de-serialization of property type {0:#06x} is not supported")]
    UnsupportedPropertyType(u16),

    #[error("{request}: invalid response data ({reason})")]
    InvalidResponse {
        request: &'static str,
        reason: String,
    },

    #[error("could not decode SvrEid: invalid data length {found} (expected {expected})")]
    InvalidSvrEid { found: u16, expected: u16 },

    #[error("invalid string data: {0}")]
    InvalidString(&'static str),

    #[error("value of type {value_type:#06x} does not match tag {tag:#010x}")]
    TypeMismatch { tag: u32, value_type: u16 },

    #[error("too many elements for a 16-bit count: {0}")]
    TooManyElements(usize),

    #[error("frame too large: {size} bytes (max {max})")]
    FrameTooLarge { size: u32, max: u32 },
}

impl ProtocolError {
    pub(crate) fn invalid_response(request: &'static str, reason: impl Into<String>) -> Self {
        ProtocolError::InvalidResponse {
            request,
            reason: reason.into(),
        }
    }

    /// Returns whether the error stems from a short or unterminated buffer.
    pub fn is_underflow(&self) -> bool {
        matches!(
            self,
            ProtocolError::BufferUnderflow { .. } | ProtocolError::MissingTerminator(_)
        )
    }
}
