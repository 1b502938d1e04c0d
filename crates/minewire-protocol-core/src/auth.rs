//! Login key exchange helpers: the server's RSA key pair, the client's
//! shared secret, and the hash both sides send to the session service.

use crate::cipher::SHARED_SECRET_LEN;
use crate::error::{ProtocolError, ProtocolResult};
use num_bigint::BigInt;
use rand::RngCore;
use rsa::pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use sha1::{Digest, Sha1};

pub const KEY_BITS: usize = 1024;
pub const VERIFY_TOKEN_LEN: usize = 4;

fn key_exchange(e: impl std::fmt::Display) -> ProtocolError {
    ProtocolError::KeyExchange(e.to_string())
}

/// The server's RSA key, sent to clients in Encryption Request.
pub struct ServerKeyPair {
    private_key: RsaPrivateKey,
    public_key_der: Vec<u8>,
}

impl ServerKeyPair {
    pub fn generate() -> ProtocolResult<Self> {
        let private_key =
            RsaPrivateKey::new(&mut rand::thread_rng(), KEY_BITS).map_err(key_exchange)?;
        let public_key_der = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(key_exchange)?
            .as_bytes()
            .to_vec();
        Ok(Self {
            private_key,
            public_key_der,
        })
    }

    /// X.509 SubjectPublicKeyInfo DER, as carried on the wire.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    pub fn decrypt(&self, data: &[u8]) -> ProtocolResult<Vec<u8>> {
        self.private_key
            .decrypt(Pkcs1v15Encrypt, data)
            .map_err(key_exchange)
    }

    /// Decrypt the client's shared secret and check its length.
    pub fn decrypt_shared_secret(&self, data: &[u8]) -> ProtocolResult<Vec<u8>> {
        let secret = self.decrypt(data)?;
        if secret.len() != SHARED_SECRET_LEN {
            return Err(ProtocolError::CipherMisuse("shared secret must be 16 bytes"));
        }
        Ok(secret)
    }

    /// Decrypt the echoed verify token and compare it with the one sent.
    pub fn check_verify_token(&self, encrypted: &[u8], expected: &[u8]) -> ProtocolResult<()> {
        if self.decrypt(encrypted)? != expected {
            return Err(ProtocolError::KeyExchange("verify token mismatch".into()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for ServerKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerKeyPair")
            .field("public_key_der", &self.public_key_der.len())
            .finish_non_exhaustive()
    }
}

/// Client side: encrypt with the key from Encryption Request.
pub fn encrypt_with_public_key(public_key_der: &[u8], data: &[u8]) -> ProtocolResult<Vec<u8>> {
    let key = RsaPublicKey::from_public_key_der(public_key_der).map_err(key_exchange)?;
    key.encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, data)
        .map_err(key_exchange)
}

pub fn generate_shared_secret() -> [u8; SHARED_SECRET_LEN] {
    let mut secret = [0u8; SHARED_SECRET_LEN];
    rand::thread_rng().fill_bytes(&mut secret);
    secret
}

pub fn generate_verify_token() -> [u8; VERIFY_TOKEN_LEN] {
    let mut token = [0u8; VERIFY_TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut token);
    token
}

/// SHA-1 over server id, shared secret and public key, printed as a signed
/// big-endian number in hex (negative digests get a leading `-`).
pub fn server_hash(server_id: &str, shared_secret: &[u8], public_key_der: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(server_id.as_bytes());
    hasher.update(shared_secret);
    hasher.update(public_key_der);
    let digest = hasher.finalize();
    format!("{:x}", BigInt::from_signed_bytes_be(&digest))
}
