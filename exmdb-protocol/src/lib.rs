//! # exmdb-protocol
//!
//! Wire protocol implementation for the exmdb mail store service.
//!
//! This crate provides:
//! - Call IDs, response codes and property types with reverse lookup
//! - A cursor-based byte buffer for little-endian values and C strings
//! - Tagged property value (de)serialization
//! - Request types with their paired response decoders
//! - Length-prefixed request framing and response header parsing

pub mod buffer;
pub mod codec;
pub mod constants;
pub mod error;
pub mod frame;
pub mod propval;
pub mod request;
pub mod util;

pub use buffer::{Buffer, WStringEncoding};
pub use codec::Encode;
pub use constants::{CallId, PropType, ResponseCode};
pub use error::ProtocolError;
pub use frame::{ResponseHeader, RESPONSE_HEADER_SIZE};
pub use propval::{Guid, PropValue, SvrEid, TaggedPropval};
pub use request::Request;

/// Default port of the exmdb service.
pub const DEFAULT_PORT: u16 = 5000;

/// Default host of the exmdb service.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Maximum accepted response payload size (256 MiB).
pub const MAX_PAYLOAD_SIZE: u32 = 256 * 1024 * 1024;
