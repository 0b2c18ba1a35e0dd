//! Primitive serializer.
//!
//! Integers are written little-endian in the width of their type, strings as
//! UTF-8 followed by a NUL byte, sequences as the concatenation of their
//! elements. `Option<T>` is the optional wrapper: a presence byte followed by
//! the inner encoding when present.

use crate::buffer::Buffer;
use crate::error::ProtocolError;
use bytes::{BufMut, Bytes};

/// Types with a fixed wire encoding.
pub trait Encode {
    fn encode(&self, buf: &mut Buffer);
}

/// Rejects strings that would be cut short by their own NUL terminator.
pub fn check_c_string(value: &str) -> Result<(), ProtocolError> {
    if value.contains('\0') {
        return Err(ProtocolError::InvalidString("string contains an interior NUL"));
    }
    Ok(())
}

/// Serializes a single value into a fresh byte string.
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Bytes {
    let mut buf = Buffer::new();
    value.encode(&mut buf);
    buf.freeze()
}

macro_rules! impl_encode_int {
    ($($ty:ty => $put:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, buf: &mut Buffer) {
                    buf.data_mut().$put(*self);
                }
            }
        )*
    };
}

impl_encode_int!(
    u8 => put_u8,
    u16 => put_u16_le,
    u32 => put_u32_le,
    u64 => put_u64_le,
    f32 => put_f32_le,
    f64 => put_f64_le,
);

impl Encode for bool {
    fn encode(&self, buf: &mut Buffer) {
        buf.data_mut().put_u8(u8::from(*self));
    }
}

impl Encode for str {
    fn encode(&self, buf: &mut Buffer) {
        let data = buf.data_mut();
        data.put_slice(self.as_bytes());
        data.put_u8(0);
    }
}

impl Encode for String {
    fn encode(&self, buf: &mut Buffer) {
        self.as_str().encode(buf);
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, buf: &mut Buffer) {
        for element in self {
            element.encode(buf);
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, buf: &mut Buffer) {
        self.as_slice().encode(buf);
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, buf: &mut Buffer) {
        match self {
            Some(value) => {
                buf.data_mut().put_u8(1);
                value.encode(buf);
            }
            None => buf.data_mut().put_u8(0),
        }
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, buf: &mut Buffer) {
        (**self).encode(buf);
    }
}
