//! Login packets as laid out in 1.18.x.
//!
//! 1.19 changes Login Start, Encryption Response and Login Success; those
//! live in [`crate::v1_19`]. The rest are shared.

use bytes::BytesMut;
use minewire_protocol_core::*;
use minewire_types::{Chat, Identifier};
use uuid::Uuid;

pub const MAX_USERNAME_LEN: usize = 16;
/// Upper bound for RSA keys and encrypted blobs carried in login packets.
pub const MAX_KEY_BYTES: usize = 1024;
pub const MAX_PLUGIN_DATA: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq)]
pub struct LoginDisconnect {
    pub reason: Chat,
}

impl PacketDef for LoginDisconnect {
    const NAME: &'static str = "login_disconnect";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_chat(buf, &self.reason);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            reason: read_chat(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionRequest {
    /// Empty on vanilla servers.
    pub server_id: String,
    pub public_key: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl PacketDef for EncryptionRequest {
    const NAME: &'static str = "encryption_request";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_string(buf, &self.server_id);
        write_byte_array(buf, &self.public_key);
        write_byte_array(buf, &self.verify_token);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            server_id: read_string(buf, 20)?,
            public_key: read_byte_array(buf, MAX_KEY_BYTES)?,
            verify_token: read_byte_array(buf, MAX_KEY_BYTES)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSuccess {
    pub uuid: Uuid,
    pub username: String,
}

impl PacketDef for LoginSuccess {
    const NAME: &'static str = "login_success";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_uuid(buf, &self.uuid);
        write_string(buf, &self.username);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            uuid: read_uuid(buf)?,
            username: read_string(buf, MAX_USERNAME_LEN)?,
        })
    }

    fn effect(&self) -> Option<SessionEffect> {
        Some(SessionEffect::EnterPlay)
    }
}

/// Every frame after this one uses the compressed layout; a negative
/// threshold turns compression off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCompression {
    pub threshold: i32,
}

impl PacketDef for SetCompression {
    const NAME: &'static str = "set_compression";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_varint(buf, self.threshold);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            threshold: read_varint(buf)?,
        })
    }

    fn effect(&self) -> Option<SessionEffect> {
        Some(SessionEffect::EnableCompression {
            threshold: self.threshold,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginRequest {
    pub message_id: i32,
    pub channel: Identifier,
    pub data: Vec<u8>,
}

impl PacketDef for LoginPluginRequest {
    const NAME: &'static str = "login_plugin_request";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_varint(buf, self.message_id);
        write_identifier(buf, &self.channel);
        buf.extend_from_slice(&self.data);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            message_id: read_varint(buf)?,
            channel: read_identifier(buf)?,
            data: read_remaining(buf, MAX_PLUGIN_DATA)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginStart {
    pub username: String,
}

impl PacketDef for LoginStart {
    const NAME: &'static str = "login_start";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_string(buf, &self.username);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            username: read_string(buf, MAX_USERNAME_LEN)?,
        })
    }
}

/// Shared secret and verify token, both RSA-encrypted with the server key.
/// The session holds all traffic until the secret is installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptionResponse {
    pub shared_secret: Vec<u8>,
    pub verify_token: Vec<u8>,
}

impl PacketDef for EncryptionResponse {
    const NAME: &'static str = "encryption_response";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_byte_array(buf, &self.shared_secret);
        write_byte_array(buf, &self.verify_token);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            shared_secret: read_byte_array(buf, MAX_KEY_BYTES)?,
            verify_token: read_byte_array(buf, MAX_KEY_BYTES)?,
        })
    }

    fn effect(&self) -> Option<SessionEffect> {
        Some(SessionEffect::AwaitEncryption)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPluginResponse {
    pub message_id: i32,
    /// `None` when the client didn't understand the request.
    pub data: Option<Vec<u8>>,
}

impl PacketDef for LoginPluginResponse {
    const NAME: &'static str = "login_plugin_response";
    const STATE: ConnectionState = ConnectionState::Login;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_varint(buf, self.message_id);
        write_bool(buf, self.data.is_some());
        if let Some(data) = &self.data {
            buf.extend_from_slice(data);
        }
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        let message_id = read_varint(buf)?;
        let data = read_optional(buf, |buf| read_remaining(buf, MAX_PLUGIN_DATA))?;
        Ok(Self { message_id, data })
    }
}
