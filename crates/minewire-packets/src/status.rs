use bytes::BytesMut;
use minewire_protocol_core::*;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusRequest;

impl PacketDef for StatusRequest {
    const NAME: &'static str = "status_request";
    const STATE: ConnectionState = ConnectionState::Status;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, _buf: &mut BytesMut) {}

    fn decode(_buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self)
    }
}

/// Server list entry: version, players, description, favicon.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub response: serde_json::Value,
}

impl PacketDef for StatusResponse {
    const NAME: &'static str = "status_response";
    const STATE: ConnectionState = ConnectionState::Status;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_json(buf, &self.response);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            response: read_json(buf, DEFAULT_MAX_STRING)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingRequest {
    pub payload: i64,
}

impl PacketDef for PingRequest {
    const NAME: &'static str = "ping";
    const STATE: ConnectionState = ConnectionState::Status;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_i64(buf, self.payload);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            payload: read_i64(buf)?,
        })
    }
}

/// Echo of [`PingRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PongResponse {
    pub payload: i64,
}

impl PacketDef for PongResponse {
    const NAME: &'static str = "pong";
    const STATE: ConnectionState = ConnectionState::Status;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_i64(buf, self.payload);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            payload: read_i64(buf)?,
        })
    }
}
