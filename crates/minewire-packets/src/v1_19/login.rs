use crate::login::{MAX_KEY_BYTES, MAX_USERNAME_LEN};
use bytes::BytesMut;
use minewire_protocol_core::*;
use uuid::Uuid;

/// The player's chat-signing key as sent in Login Start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureData {
    pub expires_at: i64,
    pub public_key: Vec<u8>,
    pub signature: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub username: String,
    pub signature: Option<SignatureData>,
}

impl PacketDef for LoginStart {
    const NAME: &'static str = "login_start";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_string(buf, &self.username);
        write_optional(buf, self.signature.as_ref(), |buf, sig| {
            write_i64(buf, sig.expires_at);
            write_byte_array(buf, &sig.public_key);
            write_byte_array(buf, &sig.signature);
        });
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            username: read_string(buf, MAX_USERNAME_LEN)?,
            signature: read_optional(buf, |buf| {
                Ok(SignatureData {
                    expires_at: read_i64(buf)?,
                    public_key: read_byte_array(buf, MAX_KEY_BYTES * 4)?,
                    signature: read_byte_array(buf, MAX_KEY_BYTES * 4)?,
                })
            })?,
        })
    }
}

/// What proves the client holds the server key: the encrypted verify token,
/// or a salted signature made with the player's chat key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyProof {
    VerifyToken(Vec<u8>),
    Signature { salt: i64, signature: Vec<u8> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub proof: KeyProof,
}

impl PacketDef for EncryptionResponse {
    const NAME: &'static str = "encryption_response";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_byte_array(buf, &self.shared_secret);
        match &self.proof {
            KeyProof::VerifyToken(token) => {
                write_bool(buf, true);
                write_byte_array(buf, token);
            }
            KeyProof::Signature { salt, signature } => {
                write_bool(buf, false);
                write_i64(buf, *salt);
                write_byte_array(buf, signature);
            }
        }
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        let shared_secret = read_byte_array(buf, MAX_KEY_BYTES)?;
        let proof = if read_bool(buf)? {
            KeyProof::VerifyToken(read_byte_array(buf, MAX_KEY_BYTES)?)
        } else {
            KeyProof::Signature {
                salt: read_i64(buf)?,
                signature: read_byte_array(buf, MAX_KEY_BYTES)?,
            }
        };
        Ok(Self {
            shared_secret,
            proof,
        })
    }

    fn effect(&self) -> Option<SessionEffect> {
        Some(SessionEffect::AwaitEncryption)
    }
}

/// A game profile property, typically `textures`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub username: String,
    pub properties: Vec<Property>,
}

impl PacketDef for LoginSuccess {
    const NAME: &'static str = "login_success";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_uuid(buf, &self.uuid);
        write_string(buf, &self.username);
        write_array(buf, &self.properties, |buf, property| {
            write_string(buf, &property.name);
            write_string(buf, &property.value);
            write_optional(buf, property.signature.as_ref(), |buf, s| write_string(buf, s));
        });
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            uuid: read_uuid(buf)?,
            username: read_string(buf, MAX_USERNAME_LEN)?,
            properties: read_array(buf, 64, |buf| {
                Ok(Property {
                    name: read_string(buf, DEFAULT_MAX_STRING)?,
                    value: read_string(buf, DEFAULT_MAX_STRING)?,
                    signature: read_optional(buf, |buf| read_string(buf, DEFAULT_MAX_STRING))?,
                })
            })?,
        })
    }

    fn effect(&self) -> Option<SessionEffect> {
        Some(SessionEffect::EnterPlay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_start_without_key() {
        let packet = LoginStart {
            username: "Alex".into(),
            signature: None,
        };
        let mut buf = BytesMut::new();
        PacketDef::encode(&packet, &mut buf);
        assert_eq!(&buf[..], &[4, b'A', b'l', b'e', b'x', 0]);
        assert_eq!(LoginStart::decode(&mut buf).unwrap(), packet);
    }

    #[test]
    fn test_encryption_response_proofs() {
        for proof in [
            KeyProof::VerifyToken(vec![1, 2, 3, 4]),
            KeyProof::Signature {
                salt: -5,
                signature: vec![9; 256],
            },
        ] {
            let packet = EncryptionResponse {
                shared_secret: vec![0xAB; 128],
                proof,
            };
            let mut buf = BytesMut::new();
            PacketDef::encode(&packet, &mut buf);
            assert_eq!(EncryptionResponse::decode(&mut buf).unwrap(), packet);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_login_success_properties() {
        let packet = LoginSuccess {
            uuid: Uuid::from_u128(42),
            username: "Alex".into(),
            properties: vec![Property {
                name: "textures".into(),
                value: "e30=".into(),
                signature: Some("c2ln".into()),
            }],
        };
        let mut buf = BytesMut::new();
        PacketDef::encode(&packet, &mut buf);
        assert_eq!(LoginSuccess::decode(&mut buf).unwrap(), packet);
    }
}
