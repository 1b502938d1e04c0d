use crate::codec::CodecResult;
use crate::state::{ConnectionState, PacketDirection};
use bytes::{Bytes, BytesMut};
use std::any::{Any, TypeId};
use std::fmt::Debug;

/// Side effect a packet has on the session that sends or receives it.
///
/// These are the only places where packet content feeds back into how the
/// pipeline frames, compresses or encrypts bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEffect {
    /// Handshake: select the version table and move to Status or Login.
    Handshake {
        protocol_version: i32,
        next_state: i32,
    },
    /// Set Compression: applies from the next packet boundary on.
    EnableCompression { threshold: i32 },
    /// Encryption Response: both directions switch to the cipher once the
    /// shared secret is installed.
    AwaitEncryption,
    /// Login Success.
    EnterPlay,
}

/// A concrete packet type with a fixed place in the protocol.
///
/// Ids are not part of the definition; each version table assigns them.
pub trait PacketDef: Debug + Send + Sync + Sized + 'static {
    /// Logical name, stable across versions (e.g. "keep_alive").
    const NAME: &'static str;
    const STATE: ConnectionState;
    const DIRECTION: PacketDirection;

    /// Write the body (everything after the packet id).
    fn encode(&self, buf: &mut BytesMut);

    /// Read the body. `buf` holds exactly the bytes of this packet.
    fn decode(buf: &mut BytesMut) -> CodecResult<Self>;

    fn effect(&self) -> Option<SessionEffect> {
        None
    }
}

/// Object-safe view of any packet, used by the registry and the pipeline.
pub trait Packet: Any + Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn state(&self) -> ConnectionState;
    fn direction(&self) -> PacketDirection;
    fn encode(&self, buf: &mut BytesMut);
    fn effect(&self) -> Option<SessionEffect>;
    fn as_any(&self) -> &dyn Any;

    /// Id to use when the packet carries its own (see [`UnknownPacket`]).
    fn raw_id(&self) -> Option<i32> {
        None
    }
}

impl<T: PacketDef> Packet for T {
    fn name(&self) -> &'static str {
        T::NAME
    }

    fn state(&self) -> ConnectionState {
        T::STATE
    }

    fn direction(&self) -> PacketDirection {
        T::DIRECTION
    }

    fn encode(&self, buf: &mut BytesMut) {
        PacketDef::encode(self, buf)
    }

    fn effect(&self) -> Option<SessionEffect> {
        PacketDef::effect(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn Packet {
    pub fn is<T: Packet>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Packet>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn packet_type_id(&self) -> TypeId {
        self.as_any().type_id()
    }
}

/// A frame whose id has no descriptor, surfaced when the session is
/// configured to pass unknown packets through.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownPacket {
    pub state: ConnectionState,
    pub direction: PacketDirection,
    pub id: i32,
    pub body: Bytes,
}

impl Packet for UnknownPacket {
    fn name(&self) -> &'static str {
        "unknown"
    }

    fn state(&self) -> ConnectionState {
        self.state
    }

    fn direction(&self) -> PacketDirection {
        self.direction
    }

    fn encode(&self, buf: &mut BytesMut) {
        buf.extend_from_slice(&self.body);
    }

    fn effect(&self) -> Option<SessionEffect> {
        None
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn raw_id(&self) -> Option<i32> {
        Some(self.id)
    }
}

type DecodeFn = fn(&mut BytesMut) -> CodecResult<Box<dyn Packet>>;

fn decode_boxed<P: PacketDef>(buf: &mut BytesMut) -> CodecResult<Box<dyn Packet>> {
    Ok(Box::new(P::decode(buf)?))
}

/// Where a packet type sits in one version's table, and how to decode it.
#[derive(Clone)]
pub struct PacketDescriptor {
    pub name: &'static str,
    pub state: ConnectionState,
    pub direction: PacketDirection,
    pub id: i32,
    type_id: TypeId,
    decode: DecodeFn,
}

impl PacketDescriptor {
    pub fn of<P: PacketDef>(id: i32) -> Self {
        Self {
            name: P::NAME,
            state: P::STATE,
            direction: P::DIRECTION,
            id,
            type_id: TypeId::of::<P>(),
            decode: decode_boxed::<P>,
        }
    }

    /// Same packet type under a different id.
    pub fn with_id(&self, id: i32) -> Self {
        Self { id, ..self.clone() }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn decode(&self, buf: &mut BytesMut) -> CodecResult<Box<dyn Packet>> {
        (self.decode)(buf)
    }
}

impl Debug for PacketDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketDescriptor")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("direction", &self.direction)
            .field("id", &format_args!("0x{:02X}", self.id))
            .finish()
    }
}
