//! Cursor-based byte buffer.
//!
//! Reads consume from a read position; writes always append. All multi-byte
//! integers are little-endian.

use crate::codec::Encode;
use crate::error::ProtocolError;
use bytes::{BufMut, Bytes, BytesMut};

/// Wire representation of `WSTRING` values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WStringEncoding {
    /// NUL-terminated 8-bit string, identical to `STRING`.
    #[default]
    Narrow,
    /// UTF-16LE terminated by a 16-bit zero unit.
    Utf16,
}

/// Byte buffer with a read cursor.
#[derive(Debug, Clone, Default)]
pub struct Buffer {
    data: BytesMut,
    rpos: usize,
    wstring: WStringEncoding,
}

impl Buffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_encoding(wstring: WStringEncoding) -> Self {
        Self {
            data: BytesMut::new(),
            rpos: 0,
            wstring,
        }
    }

    /// Creates a buffer positioned at the start of `data`.
    pub fn from_slice(data: &[u8], wstring: WStringEncoding) -> Self {
        Self {
            data: BytesMut::from(data),
            rpos: 0,
            wstring,
        }
    }

    pub fn wstring_encoding(&self) -> WStringEncoding {
        self.wstring
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.rpos
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.rpos
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    pub(crate) fn data_mut(&mut self) -> &mut BytesMut {
        &mut self.data
    }

    // =========================================================================
    // Reading
    // =========================================================================

    fn ensure(&self, needed: usize) -> Result<(), ProtocolError> {
        let available = self.remaining();
        if needed > available {
            return Err(ProtocolError::BufferUnderflow { needed, available });
        }
        Ok(())
    }

    /// Consumes `count` bytes.
    pub fn read(&mut self, count: usize) -> Result<&[u8], ProtocolError> {
        self.ensure(count)?;
        let start = self.rpos;
        self.rpos += count;
        Ok(&self.data[start..self.rpos])
    }

    /// Consumes everything up to the end of the buffer.
    pub fn read_rest(&mut self) -> &[u8] {
        let start = self.rpos;
        self.rpos = self.data.len();
        &self.data[start..]
    }

    /// Reads `count` bytes (at most 8) as an unsigned little-endian integer.
    pub fn read_int(&mut self, count: usize) -> Result<u64, ProtocolError> {
        debug_assert!(count <= 8, "integer width {count} exceeds 8 bytes");
        let bytes = self.read(count)?;
        let mut raw = [0u8; 8];
        raw[..count].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut raw = [0u8; N];
        raw.copy_from_slice(self.read(N)?);
        Ok(raw)
    }

    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> Result<u64, ProtocolError> {
        self.read_array().map(u64::from_le_bytes)
    }

    pub fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        self.read_array().map(f32::from_le_bytes)
    }

    pub fn read_f64(&mut self) -> Result<f64, ProtocolError> {
        self.read_array().map(f64::from_le_bytes)
    }

    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a NUL-terminated 8-bit string and advances past the terminator.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        let rest = &self.data[self.rpos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ProtocolError::MissingTerminator("string"))?;
        let value = std::str::from_utf8(&rest[..end])
            .map_err(|_| ProtocolError::InvalidString("string is not valid UTF-8"))?
            .to_owned();
        self.rpos += end + 1;
        Ok(value)
    }

    /// Reads a `WSTRING` according to the buffer's encoding.
    pub fn read_wstring(&mut self) -> Result<String, ProtocolError> {
        match self.wstring {
            WStringEncoding::Narrow => self.read_string(),
            WStringEncoding::Utf16 => self.read_utf16_string(),
        }
    }

    fn read_utf16_string(&mut self) -> Result<String, ProtocolError> {
        let rest = &self.data[self.rpos..];
        let end = rest
            .chunks_exact(2)
            .position(|unit| unit == [0, 0])
            .ok_or(ProtocolError::MissingTerminator("wstring"))?
            * 2;
        let units: Vec<u16> = rest[..end]
            .chunks_exact(2)
            .map(|unit| u16::from_le_bytes([unit[0], unit[1]]))
            .collect();
        let value = String::from_utf16(&units)
            .map_err(|_| ProtocolError::InvalidString("wstring is not valid UTF-16"))?;
        self.rpos += end + 2;
        Ok(value)
    }

    // =========================================================================
    // Writing
    // =========================================================================

    /// Appends raw bytes.
    pub fn write(&mut self, bytes: &[u8]) {
        self.data.put_slice(bytes);
    }

    /// Appends the wire encoding of `value`.
    pub fn put<T: Encode + ?Sized>(&mut self, value: &T) -> &mut Self {
        value.encode(self);
        self
    }

    /// Appends a `WSTRING` according to the buffer's encoding.
    pub fn write_wstring(&mut self, value: &str) {
        match self.wstring {
            WStringEncoding::Narrow => {
                self.data.put_slice(value.as_bytes());
                self.data.put_u8(0);
            }
            WStringEncoding::Utf16 => {
                for unit in value.encode_utf16() {
                    self.data.put_u16_le(unit);
                }
                self.data.put_u16_le(0);
            }
        }
    }
}
