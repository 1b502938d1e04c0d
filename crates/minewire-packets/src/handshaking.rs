use bytes::BytesMut;
use minewire_protocol_core::*;

/// First packet of every connection; selects the version and the next state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    /// 1 for Status, 2 for Login.
    pub next_state: i32,
}

impl Handshake {
    pub fn new(
        protocol_version: i32,
        server_address: impl Into<String>,
        server_port: u16,
        next_state: ConnectionState,
    ) -> Self {
        Self {
            protocol_version,
            server_address: server_address.into(),
            server_port,
            next_state: next_state.handshake_id().unwrap_or(0),
        }
    }
}

impl PacketDef for Handshake {
    const NAME: &'static str = "handshake";
    const STATE: ConnectionState = ConnectionState::Handshaking;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_varint(buf, self.protocol_version);
        write_string(buf, &self.server_address);
        write_u16(buf, self.server_port);
        write_varint(buf, self.next_state);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            protocol_version: read_varint(buf)?,
            server_address: read_string(buf, 255)?,
            server_port: read_u16(buf)?,
            next_state: read_varint(buf)?,
        })
    }

    fn effect(&self) -> Option<SessionEffect> {
        Some(SessionEffect::Handshake {
            protocol_version: self.protocol_version,
            next_state: self.next_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handshake_layout() {
        let packet = Handshake::new(757, "localhost", 25565, ConnectionState::Login);
        let mut buf = BytesMut::new();
        PacketDef::encode(&packet, &mut buf);
        assert_eq!(
            &buf[..],
            &[0xF5, 0x05, 9, b'l', b'o', b'c', b'a', b'l', b'h', b'o', b's', b't', 0x63, 0xDD, 0x02]
        );
        assert_eq!(Handshake::decode(&mut buf).unwrap(), packet);
        assert_eq!(
            PacketDef::effect(&packet),
            Some(SessionEffect::Handshake {
                protocol_version: 757,
                next_state: 2
            })
        );
    }

    #[test]
    fn test_address_length_limit() {
        let mut buf = BytesMut::new();
        write_varint(&mut buf, 757);
        write_string(&mut buf, &"a".repeat(256));
        write_u16(&mut buf, 25565);
        write_varint(&mut buf, 1);
        assert!(matches!(
            Handshake::decode(&mut buf),
            Err(CodecError::StringTooLong { .. })
        ));
    }
}
