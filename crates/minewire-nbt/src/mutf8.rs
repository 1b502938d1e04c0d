//! Java "modified UTF-8", the string encoding used inside NBT.
//!
//! Differs from standard UTF-8 in two ways: NUL is written as the two-byte
//! sequence `C0 80`, and characters outside the BMP are written as a UTF-16
//! surrogate pair with each half encoded as a three-byte sequence.

use crate::NbtError;

/// Encode `s` as modified UTF-8, stopping before the first character that
/// would push the output past `max_len` bytes.
pub fn encode_bounded(s: &str, max_len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len().min(max_len));
    let mut units = [0u16; 2];
    for c in s.chars() {
        let start = out.len();
        for unit in c.encode_utf16(&mut units).iter() {
            push_unit(&mut out, *unit);
        }
        if out.len() > max_len {
            out.truncate(start);
            break;
        }
    }
    out
}

/// Encode `s` as modified UTF-8.
pub fn encode(s: &str) -> Vec<u8> {
    encode_bounded(s, usize::MAX)
}

fn push_unit(out: &mut Vec<u8>, unit: u16) {
    match unit {
        0x0001..=0x007F => out.push(unit as u8),
        0x0000 | 0x0080..=0x07FF => {
            out.push(0xC0 | (unit >> 6) as u8);
            out.push(0x80 | (unit & 0x3F) as u8);
        }
        _ => {
            out.push(0xE0 | (unit >> 12) as u8);
            out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
            out.push(0x80 | (unit & 0x3F) as u8);
        }
    }
}

/// Length in bytes of the modified UTF-8 encoding of `s`.
pub fn encoded_len(s: &str) -> usize {
    let mut units = [0u16; 2];
    s.chars()
        .flat_map(|c| {
            let n = c.encode_utf16(&mut units).len();
            units[..n].to_vec()
        })
        .map(|unit| match unit {
            0x0001..=0x007F => 1,
            0x0000 | 0x0080..=0x07FF => 2,
            _ => 3,
        })
        .sum()
}

/// Decode modified UTF-8, rejecting anything a Java encoder could not have
/// produced: raw NUL bytes, overlong forms, four-byte sequences, truncated
/// sequences and unpaired surrogates.
pub fn decode(bytes: &[u8]) -> Result<String, NbtError> {
    let mut units = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b0 = bytes[i];
        match b0 {
            0x01..=0x7F => {
                units.push(b0 as u16);
                i += 1;
            }
            0xC0..=0xDF => {
                let b1 = continuation(bytes, i + 1)?;
                let unit = ((b0 as u16 & 0x1F) << 6) | b1;
                // Only NUL may use the otherwise-overlong two-byte form.
                if unit < 0x80 && unit != 0 {
                    return Err(NbtError::InvalidString(i));
                }
                units.push(unit);
                i += 2;
            }
            0xE0..=0xEF => {
                let b1 = continuation(bytes, i + 1)?;
                let b2 = continuation(bytes, i + 2)?;
                let unit = ((b0 as u16 & 0x0F) << 12) | (b1 << 6) | b2;
                if unit < 0x800 {
                    return Err(NbtError::InvalidString(i));
                }
                units.push(unit);
                i += 3;
            }
            _ => return Err(NbtError::InvalidString(i)),
        }
    }
    String::from_utf16(&units).map_err(|_| NbtError::InvalidString(bytes.len()))
}

fn continuation(bytes: &[u8], at: usize) -> Result<u16, NbtError> {
    match bytes.get(at) {
        Some(b) if b & 0xC0 == 0x80 => Ok((b & 0x3F) as u16),
        _ => Err(NbtError::InvalidString(at)),
    }
}
