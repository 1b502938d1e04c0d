//! Sans-io connection state machine.
//!
//! The transport hands received bytes to [`ConnectionSession::feed`] and
//! writes whatever [`ConnectionSession::send`] returns. Packets carrying a
//! [`SessionEffect`] reconfigure the session at the packet boundary where
//! they occur.

use crate::cipher::Cfb8Cipher;
use crate::codec::{read_varint, write_varint};
use crate::config::{PipelineConfig, UnknownPacketPolicy};
use crate::error::{CodecError, ProtocolError, ProtocolResult};
use crate::frame::{FrameDecoder, FrameEncoder};
use crate::packet::{Packet, SessionEffect, UnknownPacket};
use crate::registry::{PacketRegistry, VersionTable};
use crate::state::{ConnectionState, Side};
use bytes::{BufMut, BytesMut};
use std::sync::Arc;
use tracing::{debug, trace, warn};

fn compression_from_threshold(threshold: i32) -> Option<usize> {
    (threshold >= 0).then_some(threshold as usize)
}

/// Inbound half: reassembles frames and decodes them against the version table.
pub struct SessionReader {
    side: Side,
    state: ConnectionState,
    registry: Arc<PacketRegistry>,
    table: Arc<VersionTable>,
    decoder: FrameDecoder,
    unknown_packets: UnknownPacketPolicy,
    reject_trailing_bytes: bool,
}

impl SessionReader {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn protocol_version(&self) -> i32 {
        self.table.protocol()
    }

    /// Buffer bytes from the transport without decoding anything.
    pub fn receive(&mut self, data: &[u8]) {
        self.decoder.feed(data);
    }

    /// Decode the next buffered packet. Packets that would reconfigure the
    /// session can't be handled by a lone half.
    pub fn next_packet(&mut self) -> ProtocolResult<Option<Box<dyn Packet>>> {
        let packet = self.decode_next()?;
        if packet.as_ref().is_some_and(|p| p.effect().is_some()) {
            return Err(ProtocolError::InvalidOperation(
                "packet changes session state but the session is split",
            ));
        }
        Ok(packet)
    }

    pub fn feed(&mut self, data: &[u8]) -> ProtocolResult<Vec<Box<dyn Packet>>> {
        self.receive(data);
        let mut packets = Vec::new();
        while let Some(packet) = self.next_packet()? {
            packets.push(packet);
        }
        Ok(packets)
    }

    fn decode_next(&mut self) -> ProtocolResult<Option<Box<dyn Packet>>> {
        loop {
            let Some(mut frame) = self.decoder.next_frame()? else {
                return Ok(None);
            };
            let id = read_varint(&mut frame).map_err(|e| match e {
                CodecError::UnexpectedEof { .. } => {
                    CodecError::Invalid("frame ends inside packet id".into())
                }
                other => other,
            })?;
            let direction = self.side.inbound();

            let Some(descriptor) = self.table.descriptor(self.state, direction, id) else {
                let err = self
                    .registry
                    .missing(self.state, direction, id, self.table.protocol());
                match self.unknown_packets {
                    UnknownPacketPolicy::Fail => return Err(err),
                    UnknownPacketPolicy::Skip => {
                        if matches!(err, ProtocolError::NotInVersion { .. }) {
                            warn!("Skipping packet: {}", err);
                        } else {
                            debug!("Skipping packet: {}", err);
                        }
                        continue;
                    }
                    UnknownPacketPolicy::Passthrough => {
                        debug!("Passing through packet: {}", err);
                        return Ok(Some(Box::new(UnknownPacket {
                            state: self.state,
                            direction,
                            id,
                            body: frame.freeze(),
                        })));
                    }
                }
            };

            let packet = descriptor.decode(&mut frame).map_err(|e| match e {
                CodecError::UnexpectedEof { needed, remaining } => ProtocolError::TruncatedPacket {
                    name: descriptor.name,
                    needed,
                    remaining,
                },
                other => other.into(),
            })?;
            if self.reject_trailing_bytes && !frame.is_empty() {
                return Err(ProtocolError::TrailingBytes {
                    name: descriptor.name,
                    trailing: frame.len(),
                });
            }
            trace!(
                "Received {} (0x{:02X}) in {:?}",
                descriptor.name,
                id,
                self.state
            );
            return Ok(Some(packet));
        }
    }
}

/// Outbound half: resolves ids and produces wire-ready frames.
pub struct SessionWriter {
    side: Side,
    state: ConnectionState,
    table: Arc<VersionTable>,
    encoder: FrameEncoder,
}

impl SessionWriter {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn protocol_version(&self) -> i32 {
        self.table.protocol()
    }

    pub fn send(&mut self, packet: &dyn Packet) -> ProtocolResult<BytesMut> {
        if packet.effect().is_some() {
            return Err(ProtocolError::InvalidOperation(
                "packet changes session state but the session is split",
            ));
        }
        self.encode(packet)
    }

    fn encode(&mut self, packet: &dyn Packet) -> ProtocolResult<BytesMut> {
        let direction = self.side.outbound();
        if packet.direction() != direction {
            return Err(ProtocolError::WrongDirection {
                name: packet.name(),
                direction,
            });
        }
        if packet.state() != self.state {
            return Err(ProtocolError::WrongState {
                name: packet.name(),
                expected: packet.state(),
                current: self.state,
            });
        }
        let id = self
            .table
            .id_for(packet)
            .ok_or(ProtocolError::PacketNotInVersion {
                name: packet.name(),
                version: self.table.protocol(),
            })?;

        let mut payload = BytesMut::with_capacity(64);
        write_varint(&mut payload, id);
        packet.encode(&mut payload);
        trace!(
            "Sending {} (0x{:02X}) len={} in {:?}",
            packet.name(),
            id,
            payload.len(),
            self.state
        );
        self.encoder.encode(&payload)
    }
}

/// One end of a connection: protocol state, version table, compression and
/// encryption for both directions.
///
/// After any error other than [`ErrorKind::UnexpectedEof`](crate::error::ErrorKind)
/// the stream is out of sync and the session should be dropped.
pub struct ConnectionSession {
    reader: SessionReader,
    writer: SessionWriter,
    registry: Arc<PacketRegistry>,
    awaiting_encryption: bool,
}

impl ConnectionSession {
    /// `default_version` is used until a Handshake names another
    /// registered version.
    pub fn new(
        side: Side,
        registry: Arc<PacketRegistry>,
        default_version: i32,
        config: &PipelineConfig,
    ) -> ProtocolResult<Self> {
        let table = registry.table(default_version)?;
        let state = ConnectionState::Handshaking;
        Ok(Self {
            reader: SessionReader {
                side,
                state,
                registry: registry.clone(),
                table: table.clone(),
                decoder: FrameDecoder::new(
                    config.max_frame_length,
                    config.max_uncompressed_length,
                ),
                unknown_packets: config.unknown_packets,
                reject_trailing_bytes: config.reject_trailing_bytes,
            },
            writer: SessionWriter {
                side,
                state,
                table,
                encoder: FrameEncoder::new(config.compression_level, config.max_frame_length),
            },
            registry,
            awaiting_encryption: false,
        })
    }

    pub fn side(&self) -> Side {
        self.reader.side
    }

    pub fn state(&self) -> ConnectionState {
        self.reader.state
    }

    pub fn protocol_version(&self) -> i32 {
        self.reader.table.protocol()
    }

    pub fn table(&self) -> &Arc<VersionTable> {
        &self.reader.table
    }

    pub fn compression_threshold(&self) -> Option<usize> {
        self.writer.encoder.compression()
    }

    pub fn is_encrypted(&self) -> bool {
        self.writer.encoder.is_encrypted()
    }

    /// True between an Encryption Response and [`enable_encryption`](Self::enable_encryption).
    pub fn is_awaiting_encryption(&self) -> bool {
        self.awaiting_encryption
    }

    pub fn receive(&mut self, data: &[u8]) {
        self.reader.receive(data);
    }

    /// Decode one buffered packet and apply its effect. Returns `Ok(None)`
    /// when more bytes are needed or while a key exchange is pending.
    pub fn next_packet(&mut self) -> ProtocolResult<Option<Box<dyn Packet>>> {
        if self.awaiting_encryption {
            return Ok(None);
        }
        let packet = self.reader.decode_next()?;
        if let Some(effect) = packet.as_ref().and_then(|p| p.effect()) {
            self.apply(effect)?;
        }
        Ok(packet)
    }

    /// Buffer `data` and decode every complete packet. An empty result means
    /// more data is needed.
    pub fn feed(&mut self, data: &[u8]) -> ProtocolResult<Vec<Box<dyn Packet>>> {
        self.receive(data);
        let mut packets = Vec::new();
        while let Some(packet) = self.next_packet()? {
            packets.push(packet);
        }
        Ok(packets)
    }

    /// Encode `packet` into a frame ready for the transport and apply its effect.
    pub fn send(&mut self, packet: &dyn Packet) -> ProtocolResult<BytesMut> {
        if self.awaiting_encryption {
            return Err(ProtocolError::CipherMisuse(
                "cannot send while the shared secret is pending",
            ));
        }
        let effect = packet.effect();
        if let Some(effect) = &effect {
            self.check_effect(effect)?;
        }
        let frame = self.writer.encode(packet)?;
        if let Some(effect) = effect {
            self.apply(effect)?;
        }
        Ok(frame)
    }

    /// Encode several packets into one buffer, for a single transport write.
    pub fn send_all<'a>(
        &mut self,
        packets: impl IntoIterator<Item = &'a dyn Packet>,
    ) -> ProtocolResult<BytesMut> {
        let mut out = BytesMut::new();
        for packet in packets {
            out.put(self.send(packet)?);
        }
        Ok(out)
    }

    pub fn switch_state(&mut self, next: ConnectionState) -> ProtocolResult<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(ProtocolError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        debug!("Connection state {:?} -> {:?}", current, next);
        self.reader.state = next;
        self.writer.state = next;
        Ok(())
    }

    /// Takes effect from the next packet on. A negative threshold disables
    /// compression.
    pub fn set_compression(&mut self, threshold: i32) {
        let compression = compression_from_threshold(threshold);
        debug!("Compression threshold set to {:?}", compression);
        self.reader.decoder.set_compression(compression);
        self.writer.encoder.set_compression(compression);
    }

    /// Install the shared secret for both directions at once.
    pub fn enable_encryption(&mut self, shared_secret: &[u8]) -> ProtocolResult<()> {
        if self.state() != ConnectionState::Login {
            return Err(ProtocolError::CipherMisuse(
                "encryption can only be enabled during login",
            ));
        }
        if self.is_encrypted() {
            return Err(ProtocolError::CipherMisuse("encryption already enabled"));
        }
        let (encryptor, decryptor) = Cfb8Cipher::pair(shared_secret)?;
        self.writer.encoder.enable_encryption(encryptor)?;
        self.reader.decoder.enable_encryption(decryptor)?;
        self.awaiting_encryption = false;
        debug!(
            "Encryption enabled ({} buffered bytes decrypted)",
            self.reader.decoder.buffered()
        );
        Ok(())
    }

    /// Switch to the table for `version`, or keep the current one if the
    /// registry doesn't know it.
    pub fn select_version(&mut self, version: i32) {
        if version == self.protocol_version() {
            return;
        }
        match self.registry.table(version) {
            Ok(table) => {
                debug!("Selected protocol {} ({})", version, table.name());
                self.reader.table = table.clone();
                self.writer.table = table;
            }
            Err(_) => warn!(
                "Unsupported protocol version {}, continuing with {}",
                version,
                self.protocol_version()
            ),
        }
    }

    /// Fails exactly when [`apply`](Self::apply) would, without touching the
    /// session. Outbound packets are checked before their frame is encrypted.
    fn check_effect(&self, effect: &SessionEffect) -> ProtocolResult<()> {
        let current = self.state();
        match *effect {
            SessionEffect::Handshake { next_state, .. } => {
                let next = ConnectionState::from_handshake_next(next_state)
                    .ok_or(ProtocolError::InvalidNextState(next_state))?;
                if !current.can_transition_to(next) {
                    return Err(ProtocolError::InvalidTransition {
                        from: current,
                        to: next,
                    });
                }
            }
            SessionEffect::EnableCompression { .. } => {}
            SessionEffect::AwaitEncryption => {
                if current != ConnectionState::Login || self.is_encrypted() {
                    return Err(ProtocolError::CipherMisuse("unexpected key exchange"));
                }
            }
            SessionEffect::EnterPlay => {
                if !current.can_transition_to(ConnectionState::Play) {
                    return Err(ProtocolError::InvalidTransition {
                        from: current,
                        to: ConnectionState::Play,
                    });
                }
            }
        }
        Ok(())
    }

    fn apply(&mut self, effect: SessionEffect) -> ProtocolResult<()> {
        match effect {
            SessionEffect::Handshake {
                protocol_version,
                next_state,
            } => {
                let next = ConnectionState::from_handshake_next(next_state)
                    .ok_or(ProtocolError::InvalidNextState(next_state))?;
                self.switch_state(next)?;
                self.select_version(protocol_version);
            }
            SessionEffect::EnableCompression { threshold } => self.set_compression(threshold),
            SessionEffect::AwaitEncryption => {
                if self.state() != ConnectionState::Login || self.is_encrypted() {
                    return Err(ProtocolError::CipherMisuse("unexpected key exchange"));
                }
                debug!("Waiting for shared secret");
                self.awaiting_encryption = true;
            }
            SessionEffect::EnterPlay => self.switch_state(ConnectionState::Play)?,
        }
        Ok(())
    }

    /// Separate the two directions so they can be driven concurrently.
    /// Only allowed in Play, where no packet reconfigures the session.
    pub fn split(self) -> ProtocolResult<(SessionReader, SessionWriter)> {
        if self.state() != ConnectionState::Play {
            return Err(ProtocolError::InvalidOperation(
                "sessions can only be split in play state",
            ));
        }
        Ok((self.reader, self.writer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{read_i64, read_string, write_i64, write_string, CodecResult};
    use crate::error::ErrorKind;
    use crate::packet::PacketDef;
    use crate::state::PacketDirection;

    #[derive(Debug, Clone, PartialEq)]
    struct Hello {
        version: i32,
        next: i32,
    }

    impl PacketDef for Hello {
        const NAME: &'static str = "hello";
        const STATE: ConnectionState = ConnectionState::Handshaking;
        const DIRECTION: PacketDirection = PacketDirection::Serverbound;
        fn encode(&self, buf: &mut BytesMut) {
            write_varint(buf, self.version);
            write_varint(buf, self.next);
        }
        fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
            Ok(Self {
                version: read_varint(buf)?,
                next: read_varint(buf)?,
            })
        }
        fn effect(&self) -> Option<SessionEffect> {
            Some(SessionEffect::Handshake {
                protocol_version: self.version,
                next_state: self.next,
            })
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    impl PacketDef for Name {
        const NAME: &'static str = "name";
        const STATE: ConnectionState = ConnectionState::Login;
        const DIRECTION: PacketDirection = PacketDirection::Serverbound;
        fn encode(&self, buf: &mut BytesMut) {
            write_string(buf, &self.0);
        }
        fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
            Ok(Self(read_string(buf, 16)?))
        }
    }

    #[derive(Debug)]
    struct Secret;

    impl PacketDef for Secret {
        const NAME: &'static str = "secret";
        const STATE: ConnectionState = ConnectionState::Login;
        const DIRECTION: PacketDirection = PacketDirection::Serverbound;
        fn encode(&self, _buf: &mut BytesMut) {}
        fn decode(_buf: &mut BytesMut) -> CodecResult<Self> {
            Ok(Self)
        }
        fn effect(&self) -> Option<SessionEffect> {
            Some(SessionEffect::AwaitEncryption)
        }
    }

    #[derive(Debug)]
    struct Compress(i32);

    impl PacketDef for Compress {
        const NAME: &'static str = "compress";
        const STATE: ConnectionState = ConnectionState::Login;
        const DIRECTION: PacketDirection = PacketDirection::Clientbound;
        fn encode(&self, buf: &mut BytesMut) {
            write_varint(buf, self.0);
        }
        fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
            Ok(Self(read_varint(buf)?))
        }
        fn effect(&self) -> Option<SessionEffect> {
            Some(SessionEffect::EnableCompression { threshold: self.0 })
        }
    }

    #[derive(Debug)]
    struct Welcome;

    impl PacketDef for Welcome {
        const NAME: &'static str = "welcome";
        const STATE: ConnectionState = ConnectionState::Login;
        const DIRECTION: PacketDirection = PacketDirection::Clientbound;
        fn encode(&self, _buf: &mut BytesMut) {}
        fn decode(_buf: &mut BytesMut) -> CodecResult<Self> {
            Ok(Self)
        }
        fn effect(&self) -> Option<SessionEffect> {
            Some(SessionEffect::EnterPlay)
        }
    }

    #[derive(Debug, PartialEq)]
    struct Beat(i64);

    impl PacketDef for Beat {
        const NAME: &'static str = "beat";
        const STATE: ConnectionState = ConnectionState::Play;
        const DIRECTION: PacketDirection = PacketDirection::Clientbound;
        fn encode(&self, buf: &mut BytesMut) {
            write_i64(buf, self.0);
        }
        fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
            Ok(Self(read_i64(buf)?))
        }
    }

    #[derive(Debug, PartialEq)]
    struct BeatBack(i64);

    impl PacketDef for BeatBack {
        const NAME: &'static str = "beat";
        const STATE: ConnectionState = ConnectionState::Play;
        const DIRECTION: PacketDirection = PacketDirection::Serverbound;
        fn encode(&self, buf: &mut BytesMut) {
            write_i64(buf, self.0);
        }
        fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
            Ok(Self(read_i64(buf)?))
        }
    }

    const SECRET: [u8; 16] = [7u8; 16];

    fn registry() -> Arc<PacketRegistry> {
        let mut registry = PacketRegistry::new();
        let table = |protocol: i32, beat_id: i32| {
            VersionTable::builder(protocol, format!("test-{}", protocol))
                .register::<Hello>(0x00)
                .register::<Name>(0x00)
                .register::<Secret>(0x01)
                .register::<Compress>(0x03)
                .register::<Welcome>(0x02)
                .register::<Beat>(beat_id)
                .register::<BeatBack>(0x0F)
                .build()
                .unwrap()
        };
        registry.register(table(1, 0x21));
        registry.register(table(2, 0x1E));
        Arc::new(registry)
    }

    fn pair(config: &PipelineConfig) -> (ConnectionSession, ConnectionSession) {
        let registry = registry();
        (
            ConnectionSession::new(Side::Client, registry.clone(), 1, config).unwrap(),
            ConnectionSession::new(Side::Server, registry, 1, config).unwrap(),
        )
    }

    #[test]
    fn test_handshake_moves_both_sides() {
        let (mut client, mut server) = pair(&PipelineConfig::default());
        let wire = client.send(&Hello { version: 2, next: 2 }).unwrap();
        assert_eq!(client.state(), ConnectionState::Login);
        assert_eq!(client.protocol_version(), 2);

        let packets = server.feed(&wire).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(
            packets[0].downcast_ref::<Hello>(),
            Some(&Hello { version: 2, next: 2 })
        );
        assert_eq!(server.state(), ConnectionState::Login);
        assert_eq!(server.protocol_version(), 2);
    }

    #[test]
    fn test_unsupported_version_keeps_default() {
        let (mut client, mut server) = pair(&PipelineConfig::default());
        let wire = client.send(&Hello { version: 999, next: 1 }).unwrap();
        server.feed(&wire).unwrap();
        assert_eq!(server.state(), ConnectionState::Status);
        assert_eq!(server.protocol_version(), 1);
    }

    #[test]
    fn test_rejected_effect_leaves_cipher_in_step() {
        let (mut client, mut server) = pair(&PipelineConfig::default());
        let wire = client.send(&Hello { version: 1, next: 2 }).unwrap();
        server.feed(&wire).unwrap();
        client.enable_encryption(&SECRET).unwrap();
        server.enable_encryption(&SECRET).unwrap();

        // A second key exchange is refused before anything is encrypted.
        assert!(matches!(
            client.send(&Secret),
            Err(ProtocolError::CipherMisuse(_))
        ));
        assert!(!client.is_awaiting_encryption());

        let wire = client.send(&Name("Steve".into())).unwrap();
        let packets = server.feed(&wire).unwrap();
        assert_eq!(
            packets[0].downcast_ref::<Name>(),
            Some(&Name("Steve".into()))
        );
    }

    #[test]
    fn test_invalid_next_state() {
        let (mut client, _) = pair(&PipelineConfig::default());
        let err = client.send(&Hello { version: 1, next: 3 }).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidNextState(3)));
        assert_eq!(err.kind(), ErrorKind::InvalidState);
        assert_eq!(client.state(), ConnectionState::Handshaking);
    }

    #[test]
    fn test_play_id_in_login_is_unknown() {
        let (mut client, mut server) = pair(&PipelineConfig::default());
        server.feed(&client.send(&Hello { version: 1, next: 2 }).unwrap()).unwrap();

        let mut payload = BytesMut::new();
        write_varint(&mut payload, 0x0F);
        write_i64(&mut payload, 1);
        let frame = crate::frame::encode_frame(&payload, None, 6).unwrap();
        let err = server.feed(&frame).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::UnknownPacket {
                id: 0x0F,
                state: ConnectionState::Login,
                ..
            }
        ));
    }

    #[test]
    fn test_wrong_state_and_direction_on_send() {
        let (mut client, _) = pair(&PipelineConfig::default());
        assert!(matches!(
            client.send(&BeatBack(1)),
            Err(ProtocolError::WrongState { .. })
        ));
        assert!(matches!(
            client.send(&Beat(1)),
            Err(ProtocolError::WrongDirection { .. })
        ));
    }

    #[test]
    fn test_byte_at_a_time_feed() {
        let (mut client, mut server) = pair(&PipelineConfig::default());
        let mut wire = client.send(&Hello { version: 1, next: 2 }).unwrap();
        wire.extend_from_slice(&client.send(&Name("Steve".into())).unwrap());

        let mut received = Vec::new();
        for byte in wire.iter() {
            received.extend(server.feed(&[*byte]).unwrap());
        }
        assert_eq!(received.len(), 2);
        assert_eq!(
            received[1].downcast_ref::<Name>(),
            Some(&Name("Steve".into()))
        );
    }

    fn login(config: &PipelineConfig) -> (ConnectionSession, ConnectionSession) {
        let (mut client, mut server) = pair(config);
        server.feed(&client.send(&Hello { version: 1, next: 2 }).unwrap()).unwrap();
        server.feed(&client.send(&Name("Alex".into())).unwrap()).unwrap();

        // Encryption Response, then encrypted traffic in the same read.
        let wire = client.send(&Secret).unwrap();
        assert!(client.is_awaiting_encryption());
        assert!(matches!(
            client.send(&Name("x".into())),
            Err(ProtocolError::CipherMisuse(_))
        ));
        client.enable_encryption(&SECRET).unwrap();

        let compress = server_send_after_key(&mut server, &wire, &SECRET);
        let packets = client.feed(&compress).unwrap();
        assert!(packets[0].is::<Compress>());
        assert!(packets[1].is::<Welcome>());
        assert_eq!(client.state(), ConnectionState::Play);
        assert_eq!(server.state(), ConnectionState::Play);
        assert_eq!(client.compression_threshold(), Some(64));
        (client, server)
    }

    fn server_send_after_key(
        server: &mut ConnectionSession,
        wire: &[u8],
        secret: &[u8],
    ) -> BytesMut {
        let packets = server.feed(wire).unwrap();
        assert!(packets[0].is::<Secret>());
        assert!(server.is_awaiting_encryption());
        server.enable_encryption(secret).unwrap();
        let mut out = server.send(&Compress(64)).unwrap();
        out.extend_from_slice(&server.send(&Welcome).unwrap());
        out
    }

    #[test]
    fn test_login_flow_with_encryption_and_compression() {
        let (mut client, mut server) = login(&PipelineConfig::default());
        assert!(client.is_encrypted() && server.is_encrypted());

        let wire = server.send(&Beat(i64::MAX)).unwrap();
        assert_eq!(
            client.feed(&wire).unwrap()[0].downcast_ref::<Beat>(),
            Some(&Beat(i64::MAX))
        );
        let back = client.send(&BeatBack(3)).unwrap();
        assert_eq!(
            server.feed(&back).unwrap()[0].downcast_ref::<BeatBack>(),
            Some(&BeatBack(3))
        );
    }

    #[test]
    fn test_bytes_after_key_exchange_wait_for_secret() {
        let (mut client, mut server) = pair(&PipelineConfig::default());
        server.feed(&client.send(&Hello { version: 1, next: 2 }).unwrap()).unwrap();

        let mut wire = client.send(&Secret).unwrap();
        client.enable_encryption(&SECRET).unwrap();
        wire.extend_from_slice(&client.send(&Name("late".into())).unwrap());

        let packets = server.feed(&wire).unwrap();
        assert_eq!(packets.len(), 1);
        assert!(server.is_awaiting_encryption());
        assert!(server.feed(&[]).unwrap().is_empty());

        server.enable_encryption(&SECRET).unwrap();
        let packets = server.feed(&[]).unwrap();
        assert_eq!(packets[0].downcast_ref::<Name>(), Some(&Name("late".into())));
    }

    #[test]
    fn test_cipher_misuse() {
        let (mut client, _) = pair(&PipelineConfig::default());
        assert!(matches!(
            client.enable_encryption(&SECRET),
            Err(ProtocolError::CipherMisuse(_))
        ));
        client.send(&Hello { version: 1, next: 2 }).unwrap();
        assert!(matches!(
            client.enable_encryption(&[1, 2, 3]),
            Err(ProtocolError::CipherMisuse(_))
        ));
        client.enable_encryption(&SECRET).unwrap();
        assert!(matches!(
            client.enable_encryption(&SECRET),
            Err(ProtocolError::CipherMisuse(_))
        ));
    }

    #[test]
    fn test_switch_state_rules() {
        let (mut client, _) = pair(&PipelineConfig::default());
        assert!(matches!(
            client.switch_state(ConnectionState::Play),
            Err(ProtocolError::InvalidTransition { .. })
        ));
        client.switch_state(ConnectionState::Login).unwrap();
        client.switch_state(ConnectionState::Play).unwrap();
    }

    #[test]
    fn test_unknown_packet_policies() {
        let mut payload = BytesMut::new();
        write_varint(&mut payload, 0x21);
        write_i64(&mut payload, 9);
        let stray = crate::frame::encode_frame(&payload, None, 6).unwrap();

        let setup = |policy| {
            let config = PipelineConfig {
                unknown_packets: policy,
                ..PipelineConfig::default()
            };
            let (mut client, mut server) = pair(&config);
            client.switch_state(ConnectionState::Login).unwrap();
            client.switch_state(ConnectionState::Play).unwrap();
            server.switch_state(ConnectionState::Login).unwrap();
            server.switch_state(ConnectionState::Play).unwrap();
            server.select_version(2);
            (client, server)
        };

        // 0x21 is a clientbound id in version 1 only, and the server reads
        // serverbound, so it's unknown everywhere for the server.
        let (_, mut server) = setup(UnknownPacketPolicy::Fail);
        assert!(matches!(
            server.feed(&stray),
            Err(ProtocolError::UnknownPacket { id: 0x21, .. })
        ));

        let (mut client, _) = setup(UnknownPacketPolicy::Fail);
        client.select_version(2);
        assert!(matches!(
            client.feed(&stray),
            Err(ProtocolError::NotInVersion { id: 0x21, version: 2, .. })
        ));

        let (mut client, _) = setup(UnknownPacketPolicy::Skip);
        client.select_version(2);
        let mut wire = stray.clone();
        let mut beat = BytesMut::new();
        write_varint(&mut beat, 0x1E);
        write_i64(&mut beat, 4);
        wire.extend_from_slice(&crate::frame::encode_frame(&beat, None, 6).unwrap());
        let packets = client.feed(&wire).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].downcast_ref::<Beat>(), Some(&Beat(4)));

        let (mut client, _) = setup(UnknownPacketPolicy::Passthrough);
        client.select_version(2);
        let packets = client.feed(&stray).unwrap();
        let unknown = packets[0].downcast_ref::<UnknownPacket>().unwrap();
        assert_eq!(unknown.id, 0x21);
        assert_eq!(unknown.body.len(), 8);
    }

    #[test]
    fn test_truncated_and_trailing_bodies() {
        let (mut client, mut server) = pair(&PipelineConfig::default());
        client.switch_state(ConnectionState::Login).unwrap();
        client.switch_state(ConnectionState::Play).unwrap();
        server.switch_state(ConnectionState::Login).unwrap();
        server.switch_state(ConnectionState::Play).unwrap();

        let mut short = BytesMut::new();
        write_varint(&mut short, 0x0F);
        short.extend_from_slice(&[0, 0, 0]);
        let err = server
            .feed(&crate::frame::encode_frame(&short, None, 6).unwrap())
            .unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedPacket { name: "beat", .. }));
        assert_eq!(err.kind(), ErrorKind::MalformedValue);

        let mut long = BytesMut::new();
        write_varint(&mut long, 0x21);
        write_i64(&mut long, 1);
        long.extend_from_slice(&[0xFF]);
        assert!(matches!(
            client.feed(&crate::frame::encode_frame(&long, None, 6).unwrap()),
            Err(ProtocolError::TrailingBytes { trailing: 1, .. })
        ));
    }

    #[test]
    fn test_negative_threshold_disables_compression() {
        let (mut client, _) = pair(&PipelineConfig::default());
        client.set_compression(256);
        assert_eq!(client.compression_threshold(), Some(256));
        client.set_compression(-1);
        assert_eq!(client.compression_threshold(), None);
    }

    #[test]
    fn test_split_in_play() {
        let (client, server) = login(&PipelineConfig::default());
        assert!(matches!(
            pair(&PipelineConfig::default()).0.split(),
            Err(ProtocolError::InvalidOperation(_))
        ));

        let (mut client_reader, mut client_writer) = client.split().unwrap();
        let (mut server_reader, mut server_writer) = server.split().unwrap();

        for i in 0..3 {
            let wire = server_writer.send(&Beat(i)).unwrap();
            let got = client_reader.feed(&wire).unwrap();
            assert_eq!(got[0].downcast_ref::<Beat>(), Some(&Beat(i)));
            let wire = client_writer.send(&BeatBack(i)).unwrap();
            let got = server_reader.feed(&wire).unwrap();
            assert_eq!(got[0].downcast_ref::<BeatBack>(), Some(&BeatBack(i)));
        }
        assert_eq!(client_reader.state(), ConnectionState::Play);
    }
}
