//! # exmdb-client
//!
//! Client library for the exmdb mail store service.
//!
//! This crate provides:
//! - Async TCP connection with length-prefixed framing and timeouts
//! - Client sessions with the connect handshake and scoped acquisition
//! - Configuration from YAML files and environment variables

pub mod client;
pub mod config;
pub mod connection;
pub mod error;
#[cfg(test)]
mod stub;

pub use client::{generate_session_id, with_session, Client, SESSION_ID_LENGTH};
pub use config::{ClientConfig, CONFIG_ENV};
pub use connection::{Connection, RawResponse};
pub use error::{ClientError, ConfigError};
