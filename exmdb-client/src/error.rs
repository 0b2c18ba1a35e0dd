//! Client error types.

use exmdb_protocol::{ProtocolError, ResponseCode};
use std::path::PathBuf;
use thiserror::Error;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection closed unexpectedly ({read}/{expected} bytes received)")]
    ConnectionClosed { read: usize, expected: usize },

    #[error("request timeout")]
    Timeout,

    #[error("connection is unusable after an interrupted or failed request")]
    Poisoned,

    #[error("not connected")]
    NotConnected,

    #[error("call failed with response code {code:#04x} ({name})")]
    Mapi { code: u8, name: &'static str },

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    pub(crate) fn mapi(code: u8) -> Self {
        ClientError::Mapi {
            code,
            name: ResponseCode::name_of(code),
        }
    }

    /// Returns whether the error leaves the connection unusable.
    pub fn is_transmission(&self) -> bool {
        matches!(
            self,
            ClientError::Io(_)
                | ClientError::ConnectionClosed { .. }
                | ClientError::Timeout
                | ClientError::Poisoned
                | ClientError::NotConnected
        )
    }

    /// Returns whether the server rejected the call or its reply failed validation.
    pub fn is_mapi(&self) -> bool {
        matches!(self, ClientError::Mapi { .. } | ClientError::Protocol(_))
    }

    /// Returns the response code carried by a [`ClientError::Mapi`] error.
    pub fn response_code(&self) -> Option<u8> {
        match self {
            ClientError::Mapi { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to parse config file '{}': {1}", .0.display())]
    Parse(PathBuf, String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
