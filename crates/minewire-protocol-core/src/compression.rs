use crate::error::{ProtocolError, ProtocolResult};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read as _, Write as _};

pub fn compress(data: &[u8], level: u32) -> ProtocolResult<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Inflate `data`, which must expand to exactly `expected_len` bytes.
pub fn decompress(data: &[u8], expected_len: usize) -> ProtocolResult<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len);
    // One extra byte of room so an overlong stream is detected without
    // inflating all of it.
    ZlibDecoder::new(data)
        .take(expected_len as u64 + 1)
        .read_to_end(&mut out)
        .map_err(|e| ProtocolError::BadCompression(e.to_string()))?;
    if out.len() != expected_len {
        return Err(ProtocolError::BadCompression(format!(
            "declared {} bytes, inflated to {}{}",
            expected_len,
            if out.len() > expected_len { "more than " } else { "" },
            out.len().min(expected_len)
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data: Vec<u8> = (0..500u32).map(|i| (i % 13) as u8).collect();
        let packed = compress(&data, 6).unwrap();
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed, data.len()).unwrap(), data);
    }

    #[test]
    fn test_length_mismatch() {
        let data = vec![7u8; 100];
        let packed = compress(&data, 6).unwrap();
        assert!(matches!(
            decompress(&packed, 99),
            Err(ProtocolError::BadCompression(_))
        ));
        assert!(matches!(
            decompress(&packed, 101),
            Err(ProtocolError::BadCompression(_))
        ));
    }

    #[test]
    fn test_garbage_input() {
        assert!(matches!(
            decompress(&[0xde, 0xad, 0xbe, 0xef], 10),
            Err(ProtocolError::BadCompression(_))
        ));
    }
}
