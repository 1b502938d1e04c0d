//! Length-prefixed framing with optional zlib compression and CFB8 encryption.
//!
//! Outbound: `payload = varint(id) ++ body`, then compression (when enabled),
//! then the length prefix, then encryption of the whole frame.
//! Inbound runs the same steps in reverse.

use crate::cipher::Cfb8Cipher;
use crate::codec::{peek_varint, read_varint, varint_len, write_varint, CodecError};
use crate::compression::{compress, decompress};
use crate::error::{ProtocolError, ProtocolResult};
use bytes::{Buf, BytesMut};
use tracing::trace;

/// Frame lengths are at most three VarInt bytes on the wire.
pub const MAX_FRAME_PREFIX_LEN: usize = 3;
/// Largest length a three-byte VarInt can carry.
pub const MAX_FRAME_LENGTH: usize = (1 << 21) - 1;
/// Largest payload a compressed frame may declare.
pub const MAX_UNCOMPRESSED_LENGTH: usize = 8 * 1024 * 1024;

/// Build one frame from a payload (`varint(id) ++ body`), unencrypted.
///
/// `threshold` is `None` when compression is off. Payloads of at least
/// `threshold` bytes are deflated; smaller ones carry a zero data length.
pub fn encode_frame(payload: &[u8], threshold: Option<usize>, level: u32) -> ProtocolResult<BytesMut> {
    let mut frame = BytesMut::with_capacity(payload.len() + 8);
    match threshold {
        Some(threshold) if payload.len() >= threshold => {
            let compressed = compress(payload, level)?;
            let data_length = payload.len() as i32;
            write_varint(&mut frame, (varint_len(data_length) + compressed.len()) as i32);
            write_varint(&mut frame, data_length);
            frame.extend_from_slice(&compressed);
        }
        Some(_) => {
            write_varint(&mut frame, (1 + payload.len()) as i32);
            write_varint(&mut frame, 0);
            frame.extend_from_slice(payload);
        }
        None => {
            write_varint(&mut frame, payload.len() as i32);
            frame.extend_from_slice(payload);
        }
    }
    Ok(frame)
}

/// Outbound half of the frame pipeline.
#[derive(Debug)]
pub struct FrameEncoder {
    threshold: Option<usize>,
    level: u32,
    max_frame_length: usize,
    cipher: Option<Cfb8Cipher>,
}

impl FrameEncoder {
    pub fn new(level: u32, max_frame_length: usize) -> Self {
        Self {
            threshold: None,
            level,
            max_frame_length,
            cipher: None,
        }
    }

    pub fn set_compression(&mut self, threshold: Option<usize>) {
        self.threshold = threshold;
    }

    pub fn compression(&self) -> Option<usize> {
        self.threshold
    }

    pub fn enable_encryption(&mut self, cipher: Cfb8Cipher) -> ProtocolResult<()> {
        if self.cipher.is_some() {
            return Err(ProtocolError::CipherMisuse("encryption already enabled"));
        }
        self.cipher = Some(cipher);
        Ok(())
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn encode(&mut self, payload: &[u8]) -> ProtocolResult<BytesMut> {
        let mut frame = encode_frame(payload, self.threshold, self.level)?;
        let body_len = frame.len() - frame_prefix_len(&frame);
        if body_len > self.max_frame_length {
            return Err(ProtocolError::FrameTooLarge {
                len: body_len,
                max: self.max_frame_length,
            });
        }
        trace!(
            "Encoded frame payload={} wire={} compressed={}",
            payload.len(),
            frame.len(),
            self.threshold.is_some_and(|t| payload.len() >= t)
        );
        if let Some(cipher) = self.cipher.as_mut() {
            cipher.encrypt(&mut frame);
        }
        Ok(frame)
    }
}

fn frame_prefix_len(frame: &[u8]) -> usize {
    frame.iter().position(|b| b & 0x80 == 0).map_or(0, |i| i + 1)
}

/// Inbound half: decrypts on arrival, reassembles, splits and inflates frames.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    threshold: Option<usize>,
    max_frame_length: usize,
    max_uncompressed_length: usize,
    cipher: Option<Cfb8Cipher>,
}

impl FrameDecoder {
    pub fn new(max_frame_length: usize, max_uncompressed_length: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(4096),
            threshold: None,
            max_frame_length,
            max_uncompressed_length,
            cipher: None,
        }
    }

    pub fn set_compression(&mut self, threshold: Option<usize>) {
        self.threshold = threshold;
    }

    pub fn compression(&self) -> Option<usize> {
        self.threshold
    }

    /// Switch to decrypting. Everything still buffered arrived after the
    /// last decoded frame, so it is ciphertext and gets decrypted now.
    pub fn enable_encryption(&mut self, mut cipher: Cfb8Cipher) -> ProtocolResult<()> {
        if self.cipher.is_some() {
            return Err(ProtocolError::CipherMisuse("encryption already enabled"));
        }
        cipher.decrypt(&mut self.buf);
        self.cipher = Some(cipher);
        Ok(())
    }

    pub fn is_encrypted(&self) -> bool {
        self.cipher.is_some()
    }

    /// Bytes received but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn feed(&mut self, data: &[u8]) {
        let start = self.buf.len();
        self.buf.extend_from_slice(data);
        if let Some(cipher) = self.cipher.as_mut() {
            cipher.decrypt(&mut self.buf[start..]);
        }
    }

    /// Next complete payload (`varint(id) ++ body`), or `Ok(None)` until one
    /// is fully buffered.
    pub fn next_frame(&mut self) -> ProtocolResult<Option<BytesMut>> {
        let Some((length, prefix_len)) = peek_varint(&self.buf, MAX_FRAME_PREFIX_LEN)? else {
            return Ok(None);
        };
        let length = length as usize;
        if length > self.max_frame_length {
            return Err(ProtocolError::FrameTooLarge {
                len: length,
                max: self.max_frame_length,
            });
        }
        if length == 0 {
            return Err(CodecError::Invalid("empty frame".into()).into());
        }
        if self.buf.len() - prefix_len < length {
            return Ok(None);
        }

        self.buf.advance(prefix_len);
        let mut frame = self.buf.split_to(length);

        let Some(threshold) = self.threshold else {
            trace!("Decoded frame len={}", length);
            return Ok(Some(frame));
        };

        let data_length = read_varint(&mut frame).map_err(|e| match e {
            CodecError::UnexpectedEof { .. } => {
                ProtocolError::BadCompression("frame ends inside data length".into())
            }
            other => other.into(),
        })?;
        if data_length == 0 {
            trace!("Decoded frame len={} uncompressed", length);
            return Ok(Some(frame));
        }
        if data_length < 0 {
            return Err(CodecError::NegativeLength(data_length).into());
        }
        let data_length = data_length as usize;
        if data_length < threshold {
            return Err(ProtocolError::BadCompression(format!(
                "size {} below threshold {}",
                data_length, threshold
            )));
        }
        if data_length > self.max_uncompressed_length {
            return Err(ProtocolError::BadCompression(format!(
                "size {} above maximum {}",
                data_length, self.max_uncompressed_length
            )));
        }
        let inflated = decompress(&frame, data_length)?;
        trace!("Decoded frame len={} inflated={}", length, data_length);
        Ok(Some(BytesMut::from(inflated.as_slice())))
    }
}
