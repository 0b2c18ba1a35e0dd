//! Tagged property values.
//!
//! Wire layout of a tagged value:
//!
//! ```text
//! +--------+-----------------+-------------------------+
//! | tag    | [override type] | value                   |
//! | 4 bytes| 2 bytes, only   | layout depends on type  |
//! |        | if UNSPECIFIED  |                         |
//! +--------+-----------------+-------------------------+
//! ```
//!
//! Array types carry a 16-bit element count followed by the elements.

use crate::buffer::Buffer;
use crate::codec::check_c_string;
use crate::constants::{collapse_mv_instance, prop_type, PropType};
use crate::error::ProtocolError;
use bytes::BufMut;
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Fixed length of a server-local SvrEid payload (flag + folder + message + instance).
pub const SVREID_LOCAL_LENGTH: u16 = 21;

/// 16-byte MAPI GUID, stored in its little-endian wire form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Guid(pub Uuid);

impl Guid {
    pub fn from_wire(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes_le(bytes))
    }

    pub fn to_wire(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Server entry ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SvrEid {
    /// Identifier owned by another store, kept opaque.
    External(Vec<u8>),
    /// Identifier local to the server.
    Local {
        folder_id: u64,
        message_id: u64,
        instance: u32,
    },
}

impl SvrEid {
    pub fn folder_id(&self) -> u64 {
        match self {
            SvrEid::External(_) => 0,
            SvrEid::Local { folder_id, .. } => *folder_id,
        }
    }

    pub fn message_id(&self) -> u64 {
        match self {
            SvrEid::External(_) => 0,
            SvrEid::Local { message_id, .. } => *message_id,
        }
    }

    pub fn instance(&self) -> u32 {
        match self {
            SvrEid::External(_) => 0,
            SvrEid::Local { instance, .. } => *instance,
        }
    }

    pub fn decode(buf: &mut Buffer) -> Result<Self, ProtocolError> {
        let length = buf.read_u16()?;
        let ours = buf.read_u8()?;
        if ours == 0 {
            let data_len = length.checked_sub(1).ok_or(ProtocolError::InvalidSvrEid {
                found: length,
                expected: 1,
            })?;
            return Ok(SvrEid::External(buf.read(usize::from(data_len))?.to_vec()));
        }
        if length != SVREID_LOCAL_LENGTH {
            return Err(ProtocolError::InvalidSvrEid {
                found: length,
                expected: SVREID_LOCAL_LENGTH,
            });
        }
        Ok(SvrEid::Local {
            folder_id: buf.read_u64()?,
            message_id: buf.read_u64()?,
            instance: buf.read_u32()?,
        })
    }

    pub fn encode(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        match self {
            SvrEid::External(data) => {
                let length = u16::try_from(data.len() + 1)
                    .map_err(|_| ProtocolError::TooManyElements(data.len()))?;
                let out = buf.data_mut();
                out.put_u16_le(length);
                out.put_u8(0);
                out.put_slice(data);
            }
            SvrEid::Local {
                folder_id,
                message_id,
                instance,
            } => {
                let out = buf.data_mut();
                out.put_u16_le(SVREID_LOCAL_LENGTH);
                out.put_u8(1);
                out.put_u64_le(*folder_id);
                out.put_u64_le(*message_id);
                out.put_u32_le(*instance);
            }
        }
        Ok(())
    }
}

/// Typed property value, one variant per supported property type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PropValue {
    Short(u16),
    Long(u32),
    Float(f32),
    Double(f64),
    Currency(u64),
    #[serde(rename = "FLOATINGTIME")]
    FloatingTime(f64),
    Error(u32),
    Byte(u8),
    #[serde(rename = "LONGLONG")]
    LongLong(u64),
    String(String),
    #[serde(rename = "WSTRING")]
    WString(String),
    #[serde(rename = "FILETIME")]
    FileTime(u64),
    Guid(Guid),
    #[serde(rename = "SVREID")]
    SvrEid(SvrEid),
    Binary(Vec<u8>),
    ShortArray(Vec<u16>),
    LongArray(Vec<u32>),
    #[serde(rename = "LONGLONG_ARRAY")]
    LongLongArray(Vec<u64>),
    StringArray(Vec<String>),
    #[serde(rename = "WSTRING_ARRAY")]
    WStringArray(Vec<String>),
    GuidArray(Vec<Guid>),
    BinaryArray(Vec<Vec<u8>>),
}

fn read_array<T>(
    buf: &mut Buffer,
    mut read: impl FnMut(&mut Buffer) -> Result<T, ProtocolError>,
) -> Result<Vec<T>, ProtocolError> {
    let count = buf.read_u16()?;
    (0..count).map(|_| read(buf)).collect()
}

fn read_binary(buf: &mut Buffer) -> Result<Vec<u8>, ProtocolError> {
    let length = buf.read_u32()? as usize;
    Ok(buf.read(length)?.to_vec())
}

fn read_guid(buf: &mut Buffer) -> Result<Guid, ProtocolError> {
    let mut raw = [0u8; 16];
    raw.copy_from_slice(buf.read(16)?);
    Ok(Guid::from_wire(raw))
}

fn write_count(buf: &mut Buffer, len: usize) -> Result<(), ProtocolError> {
    let count = u16::try_from(len).map_err(|_| ProtocolError::TooManyElements(len))?;
    buf.data_mut().put_u16_le(count);
    Ok(())
}

fn write_string(buf: &mut Buffer, value: &str) -> Result<(), ProtocolError> {
    check_c_string(value)?;
    buf.put(value);
    Ok(())
}

fn write_wstring(buf: &mut Buffer, value: &str) -> Result<(), ProtocolError> {
    check_c_string(value)?;
    buf.write_wstring(value);
    Ok(())
}

fn write_binary(buf: &mut Buffer, value: &[u8]) -> Result<(), ProtocolError> {
    let length = u32::try_from(value.len()).map_err(|_| ProtocolError::TooManyElements(value.len()))?;
    let out = buf.data_mut();
    out.put_u32_le(length);
    out.put_slice(value);
    Ok(())
}

impl PropValue {
    /// Returns the property type this value is encoded as.
    pub fn prop_type(&self) -> PropType {
        match self {
            PropValue::Short(_) => PropType::Short,
            PropValue::Long(_) => PropType::Long,
            PropValue::Float(_) => PropType::Float,
            PropValue::Double(_) => PropType::Double,
            PropValue::Currency(_) => PropType::Currency,
            PropValue::FloatingTime(_) => PropType::FloatingTime,
            PropValue::Error(_) => PropType::Error,
            PropValue::Byte(_) => PropType::Byte,
            PropValue::LongLong(_) => PropType::LongLong,
            PropValue::String(_) => PropType::String,
            PropValue::WString(_) => PropType::WString,
            PropValue::FileTime(_) => PropType::FileTime,
            PropValue::Guid(_) => PropType::Guid,
            PropValue::SvrEid(_) => PropType::SvrEid,
            PropValue::Binary(_) => PropType::Binary,
            PropValue::ShortArray(_) => PropType::ShortArray,
            PropValue::LongArray(_) => PropType::LongArray,
            PropValue::LongLongArray(_) => PropType::LongLongArray,
            PropValue::StringArray(_) => PropType::StringArray,
            PropValue::WStringArray(_) => PropType::WStringArray,
            PropValue::GuidArray(_) => PropType::GuidArray,
            PropValue::BinaryArray(_) => PropType::BinaryArray,
        }
    }

    /// Decodes a value of the given type code.
    pub fn decode(type_code: u16, buf: &mut Buffer) -> Result<Self, ProtocolError> {
        let prop_type = PropType::from_code(type_code)
            .ok_or(ProtocolError::UnsupportedPropertyType(type_code))?;
        let value = match prop_type {
            PropType::Short => PropValue::Short(buf.read_u16()?),
            PropType::Long => PropValue::Long(buf.read_u32()?),
            PropType::Error => PropValue::Error(buf.read_u32()?),
            PropType::Float => PropValue::Float(buf.read_f32()?),
            PropType::Double => PropValue::Double(buf.read_f64()?),
            PropType::FloatingTime => PropValue::FloatingTime(buf.read_f64()?),
            PropType::Byte => PropValue::Byte(buf.read_u8()?),
            PropType::Currency => PropValue::Currency(buf.read_u64()?),
            PropType::LongLong => PropValue::LongLong(buf.read_u64()?),
            PropType::FileTime => PropValue::FileTime(buf.read_u64()?),
            PropType::String => PropValue::String(buf.read_string()?),
            PropType::WString => PropValue::WString(buf.read_wstring()?),
            PropType::Guid => PropValue::Guid(read_guid(buf)?),
            PropType::SvrEid => PropValue::SvrEid(SvrEid::decode(buf)?),
            PropType::Binary => PropValue::Binary(read_binary(buf)?),
            PropType::ShortArray => PropValue::ShortArray(read_array(buf, Buffer::read_u16)?),
            PropType::LongArray => PropValue::LongArray(read_array(buf, Buffer::read_u32)?),
            PropType::LongLongArray => {
                PropValue::LongLongArray(read_array(buf, Buffer::read_u64)?)
            }
            PropType::StringArray => {
                PropValue::StringArray(read_array(buf, Buffer::read_string)?)
            }
            PropType::WStringArray => {
                PropValue::WStringArray(read_array(buf, Buffer::read_wstring)?)
            }
            PropType::GuidArray => PropValue::GuidArray(read_array(buf, read_guid)?),
            PropType::BinaryArray => PropValue::BinaryArray(read_array(buf, read_binary)?),
            PropType::Unspecified | PropType::Object | PropType::Restriction | PropType::Rule => {
                return Err(ProtocolError::UnsupportedPropertyType(type_code))
            }
        };
        Ok(value)
    }

    /// Encodes the value without tag or type prefix.
    pub fn encode(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        match self {
            PropValue::Short(v) => {
                buf.put(v);
            }
            PropValue::Long(v) | PropValue::Error(v) => {
                buf.put(v);
            }
            PropValue::Float(v) => {
                buf.put(v);
            }
            PropValue::Double(v) | PropValue::FloatingTime(v) => {
                buf.put(v);
            }
            PropValue::Byte(v) => {
                buf.put(v);
            }
            PropValue::Currency(v) | PropValue::LongLong(v) | PropValue::FileTime(v) => {
                buf.put(v);
            }
            PropValue::String(v) => write_string(buf, v)?,
            PropValue::WString(v) => write_wstring(buf, v)?,
            PropValue::Guid(v) => buf.write(&v.to_wire()),
            PropValue::SvrEid(v) => v.encode(buf)?,
            PropValue::Binary(v) => write_binary(buf, v)?,
            PropValue::ShortArray(values) => {
                write_count(buf, values.len())?;
                buf.put(values);
            }
            PropValue::LongArray(values) => {
                write_count(buf, values.len())?;
                buf.put(values);
            }
            PropValue::LongLongArray(values) => {
                write_count(buf, values.len())?;
                buf.put(values);
            }
            PropValue::StringArray(values) => {
                write_count(buf, values.len())?;
                for value in values {
                    write_string(buf, value)?;
                }
            }
            PropValue::WStringArray(values) => {
                write_count(buf, values.len())?;
                for value in values {
                    write_wstring(buf, value)?;
                }
            }
            PropValue::GuidArray(values) => {
                write_count(buf, values.len())?;
                for value in values {
                    buf.write(&value.to_wire());
                }
            }
            PropValue::BinaryArray(values) => {
                write_count(buf, values.len())?;
                for value in values {
                    write_binary(buf, value)?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Short(v) => write!(f, "{v}"),
            PropValue::Long(v) | PropValue::Error(v) => write!(f, "{v}"),
            PropValue::Float(v) => write!(f, "{v}"),
            PropValue::Double(v) | PropValue::FloatingTime(v) => write!(f, "{v}"),
            PropValue::Byte(v) => write!(f, "{v}"),
            PropValue::Currency(v) | PropValue::LongLong(v) => write!(f, "{v}"),
            PropValue::FileTime(v) => match crate::util::filetime_to_datetime(*v) {
                Some(time) => write!(f, "{}", time.format("%Y-%m-%d %H:%M:%S UTC")),
                None => write!(f, "{v}"),
            },
            PropValue::String(v) | PropValue::WString(v) => f.write_str(v),
            PropValue::Guid(v) => write!(f, "{v}"),
            PropValue::SvrEid(SvrEid::External(data)) => write!(f, "<external eid, {} bytes>", data.len()),
            PropValue::SvrEid(SvrEid::Local {
                folder_id,
                message_id,
                instance,
            }) => write!(f, "{folder_id:#x}/{message_id:#x}/{instance}"),
            PropValue::Binary(v) => write!(f, "<{} bytes>", v.len()),
            PropValue::ShortArray(v) => write!(f, "{v:?}"),
            PropValue::LongArray(v) => write!(f, "{v:?}"),
            PropValue::LongLongArray(v) => write!(f, "{v:?}"),
            PropValue::StringArray(v) | PropValue::WStringArray(v) => write!(f, "{v:?}"),
            PropValue::GuidArray(v) => {
                let items: Vec<String> = v.iter().map(Guid::to_string).collect();
                write!(f, "[{}]", items.join(", "))
            }
            PropValue::BinaryArray(v) => write!(f, "<{} blobs>", v.len()),
        }
    }
}

/// A property tag with its decoded value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaggedPropval {
    pub tag: u32,
    #[serde(flatten)]
    pub value: PropValue,
}

impl TaggedPropval {
    pub fn new(tag: u32, value: PropValue) -> Self {
        Self { tag, value }
    }

    /// Type of the carried value.
    ///
    /// For tags in the multi-value instance range this is the collapsed base type;
    /// for `UNSPECIFIED` tags it is the type carried on the wire.
    pub fn prop_type(&self) -> PropType {
        self.value.prop_type()
    }

    /// Decodes a tag and its value.
    ///
    /// A type with the full multi-value instance pattern (`0x3000`) set is
    /// collapsed into its base type before dispatch, so such tags decode a
    /// single base-type value.
    pub fn decode(buf: &mut Buffer) -> Result<Self, ProtocolError> {
        let tag = buf.read_u32()?;
        let mut type_code = collapse_mv_instance(prop_type(tag));
        if type_code == PropType::Unspecified.code() {
            type_code = buf.read_u16()?;
        }
        let value = PropValue::decode(type_code, buf)?;
        Ok(Self { tag, value })
    }

    /// Encodes the tag, the override type when the tag is `UNSPECIFIED`, and the value.
    pub fn encode(&self, buf: &mut Buffer) -> Result<(), ProtocolError> {
        let value_type = self.value.prop_type().code();
        let tag_type = collapse_mv_instance(prop_type(self.tag));
        buf.put(&self.tag);
        if tag_type == PropType::Unspecified.code() {
            buf.put(&value_type);
        } else if tag_type != value_type {
            return Err(ProtocolError::TypeMismatch {
                tag: self.tag,
                value_type,
            });
        }
        self.value.encode(buf)
    }
}

impl fmt::Display for TaggedPropval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x} ({}) = {}", self.tag, self.prop_type(), self.value)
    }
}
