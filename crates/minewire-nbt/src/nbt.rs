use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tracing::warn;

use crate::mutf8;

/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// Nesting limit for compounds and lists, same as the vanilla reader.
pub const MAX_DEPTH: usize = 512;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NbtError {
    #[error("NBT ended early: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("unknown NBT tag type {0}")]
    UnknownTag(u8),
    #[error("negative NBT length {0}")]
    NegativeLength(i32),
    #[error("NBT nested deeper than {MAX_DEPTH}")]
    TooDeep,
    #[error("invalid modified UTF-8 at byte {0}")]
    InvalidString(usize),
}

pub type NbtResult<T> = Result<T, NbtError>;

/// An NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    /// Written with a u16 length prefix, so anything past 65535 bytes of
    /// modified UTF-8 is cut off at a character boundary.
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Look up a compound entry by name.
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        match self {
            NbtValue::Compound(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Write a full named root tag, as used on the wire up to 1.20.1.
    pub fn write_root_named(&self, name: &str, buf: &mut BytesMut) {
        buf.put_u8(self.tag_id());
        write_nbt_string(name, buf);
        self.write_payload(buf);
    }

    /// Write just the payload (no tag type or name).
    pub fn write_payload(&self, buf: &mut BytesMut) {
        match self {
            NbtValue::Byte(v) => buf.put_i8(*v),
            NbtValue::Short(v) => buf.put_i16(*v),
            NbtValue::Int(v) => buf.put_i32(*v),
            NbtValue::Long(v) => buf.put_i64(*v),
            NbtValue::Float(v) => buf.put_f32(*v),
            NbtValue::Double(v) => buf.put_f64(*v),
            NbtValue::ByteArray(v) => {
                buf.put_i32(v.len() as i32);
                for b in v {
                    buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => {
                write_nbt_string(v, buf);
            }
            NbtValue::List(v) => {
                if v.is_empty() {
                    buf.put_u8(TAG_END);
                    buf.put_i32(0);
                } else {
                    buf.put_u8(v[0].tag_id());
                    buf.put_i32(v.len() as i32);
                    for item in v {
                        item.write_payload(buf);
                    }
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    buf.put_u8(value.tag_id());
                    write_nbt_string(name, buf);
                    value.write_payload(buf);
                }
                buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                buf.put_i32(v.len() as i32);
                for i in v {
                    buf.put_i32(*i);
                }
            }
            NbtValue::LongArray(v) => {
                buf.put_i32(v.len() as i32);
                for l in v {
                    buf.put_i64(*l);
                }
            }
        }
    }

    /// Read a named root tag. Returns `None` for a lone `TAG_END`, which the
    /// protocol uses to mean "no NBT".
    pub fn read_root_named(buf: &mut BytesMut) -> NbtResult<Option<(String, NbtValue)>> {
        let tag = read_u8(buf)?;
        if tag == TAG_END {
            return Ok(None);
        }
        let name = read_nbt_string(buf)?;
        let value = read_payload(tag, buf, 0)?;
        Ok(Some((name, value)))
    }
}

const MAX_STRING_BYTES: usize = u16::MAX as usize;

fn write_nbt_string(s: &str, buf: &mut BytesMut) {
    let mut bytes = mutf8::encode(s);
    if bytes.len() > MAX_STRING_BYTES {
        warn!(
            "NBT string of {} bytes truncated to {} bytes",
            bytes.len(),
            MAX_STRING_BYTES
        );
        bytes = mutf8::encode_bounded(s, MAX_STRING_BYTES);
    }
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(&bytes);
}

fn ensure(buf: &BytesMut, needed: usize) -> NbtResult<()> {
    if buf.remaining() < needed {
        return Err(NbtError::UnexpectedEof {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

fn read_u8(buf: &mut BytesMut) -> NbtResult<u8> {
    ensure(buf, 1)?;
    Ok(buf.get_u8())
}

fn read_len(buf: &mut BytesMut, elem_size: usize) -> NbtResult<usize> {
    ensure(buf, 4)?;
    let len = buf.get_i32();
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    let len = len as usize;
    // Refuse lengths the buffer can't back before allocating for them.
    ensure(buf, len.saturating_mul(elem_size))?;
    Ok(len)
}

fn read_nbt_string(buf: &mut BytesMut) -> NbtResult<String> {
    ensure(buf, 2)?;
    let len = buf.get_u16() as usize;
    ensure(buf, len)?;
    let bytes = buf.split_to(len);
    mutf8::decode(&bytes)
}

fn read_payload(tag: u8, buf: &mut BytesMut, depth: usize) -> NbtResult<NbtValue> {
    if depth > MAX_DEPTH {
        return Err(NbtError::TooDeep);
    }
    let value = match tag {
        TAG_BYTE => {
            ensure(buf, 1)?;
            NbtValue::Byte(buf.get_i8())
        }
        TAG_SHORT => {
            ensure(buf, 2)?;
            NbtValue::Short(buf.get_i16())
        }
        TAG_INT => {
            ensure(buf, 4)?;
            NbtValue::Int(buf.get_i32())
        }
        TAG_LONG => {
            ensure(buf, 8)?;
            NbtValue::Long(buf.get_i64())
        }
        TAG_FLOAT => {
            ensure(buf, 4)?;
            NbtValue::Float(buf.get_f32())
        }
        TAG_DOUBLE => {
            ensure(buf, 8)?;
            NbtValue::Double(buf.get_f64())
        }
        TAG_BYTE_ARRAY => {
            let len = read_len(buf, 1)?;
            NbtValue::ByteArray((0..len).map(|_| buf.get_i8()).collect())
        }
        TAG_STRING => NbtValue::String(read_nbt_string(buf)?),
        TAG_LIST => {
            let elem_tag = read_u8(buf)?;
            let len = read_len(buf, 0)?;
            if elem_tag == TAG_END && len > 0 {
                return Err(NbtError::UnknownTag(TAG_END));
            }
            let mut items = Vec::with_capacity(len.min(buf.remaining()));
            for _ in 0..len {
                items.push(read_payload(elem_tag, buf, depth + 1)?);
            }
            NbtValue::List(items)
        }
        TAG_COMPOUND => {
            let mut entries = Vec::new();
            loop {
                let entry_tag = read_u8(buf)?;
                if entry_tag == TAG_END {
                    break;
                }
                let name = read_nbt_string(buf)?;
                entries.push((name, read_payload(entry_tag, buf, depth + 1)?));
            }
            NbtValue::Compound(entries)
        }
        TAG_INT_ARRAY => {
            let len = read_len(buf, 4)?;
            NbtValue::IntArray((0..len).map(|_| buf.get_i32()).collect())
        }
        TAG_LONG_ARRAY => {
            let len = read_len(buf, 8)?;
            NbtValue::LongArray((0..len).map(|_| buf.get_i64()).collect())
        }
        other => return Err(NbtError::UnknownTag(other)),
    };
    Ok(value)
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}

/// Helper macro for building list tags.
#[macro_export]
macro_rules! nbt_list {
    ($($val:expr),* $(,)?) => {
        $crate::NbtValue::List(vec![$($val),*])
    };
}
