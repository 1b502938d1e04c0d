use crate::error::{ProtocolError, ProtocolResult};
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;

pub const SHARED_SECRET_LEN: usize = 16;

/// AES-128-CFB8 keyed the Minecraft way: key and IV are both the shared secret.
///
/// Works one byte at a time, so the state carries over between calls and the
/// output doesn't depend on how the stream is chunked. Each direction needs
/// its own instance.
pub struct Cfb8Cipher {
    cipher: Aes128,
    iv: [u8; 16],
}

impl Cfb8Cipher {
    pub fn new(shared_secret: &[u8]) -> ProtocolResult<Self> {
        let key: [u8; SHARED_SECRET_LEN] = shared_secret
            .try_into()
            .map_err(|_| ProtocolError::CipherMisuse("shared secret must be 16 bytes"))?;
        Ok(Self {
            cipher: Aes128::new(&key.into()),
            iv: key,
        })
    }

    /// Both directions of one connection.
    pub fn pair(shared_secret: &[u8]) -> ProtocolResult<(Self, Self)> {
        Ok((Self::new(shared_secret)?, Self::new(shared_secret)?))
    }

    fn keystream_byte(&self) -> u8 {
        let mut block = aes::Block::from(self.iv);
        self.cipher.encrypt_block(&mut block);
        block[0]
    }

    fn shift_in(&mut self, ciphertext: u8) {
        self.iv.copy_within(1.., 0);
        self.iv[15] = ciphertext;
    }

    pub fn encrypt(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            *byte ^= self.keystream_byte();
            self.shift_in(*byte);
        }
    }

    pub fn decrypt(&mut self, data: &mut [u8]) {
        for byte in data.iter_mut() {
            let ciphertext = *byte;
            *byte ^= self.keystream_byte();
            self.shift_in(ciphertext);
        }
    }
}

impl std::fmt::Debug for Cfb8Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cfb8Cipher { .. }")
    }
}
