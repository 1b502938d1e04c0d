//! Packets whose layout changed in 1.19 (protocol 759).

mod login;

pub use login::{EncryptionResponse, KeyProof, LoginStart, LoginSuccess, Property, SignatureData};

use bytes::BytesMut;
use minewire_protocol_core::*;
use minewire_types::Chat;

/// Unsigned server message, replacing clientbound chat for system text.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemChat {
    pub content: Chat,
    /// Chat type registry id: 1 system, 2 game info.
    pub kind: i32,
}

impl PacketDef for SystemChat {
    const NAME: &'static str = "system_chat";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_chat(buf, &self.content);
        write_varint(buf, self.kind);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            content: read_chat(buf)?,
            kind: read_varint(buf)?,
        })
    }
}
