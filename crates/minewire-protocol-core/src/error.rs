use crate::state::{ConnectionState, PacketDirection};
use minewire_nbt::NbtError;
use thiserror::Error;

/// Failures of a single read from a buffer.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("not enough data: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },
    #[error("VarInt longer than {0} bytes")]
    VarIntTooLong(usize),
    #[error("string too long: {len} > {max}")]
    StringTooLong { len: usize, max: usize },
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    #[error("negative length {0}")]
    NegativeLength(i32),
    #[error("array too long: {len} > {max}")]
    ArrayTooLong { len: usize, max: usize },
    #[error("invalid boolean byte 0x{0:02X}")]
    InvalidBool(u8),
    #[error("invalid {kind} value {value}")]
    InvalidEnum { kind: &'static str, value: i32 },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid NBT: {0}")]
    Nbt(#[from] NbtError),
    #[error("{0}")]
    Invalid(String),
}

impl CodecError {
    pub fn is_eof(&self) -> bool {
        matches!(self, CodecError::UnexpectedEof { .. })
    }
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Coarse classification of a [`ProtocolError`], used by connection owners to
/// decide between waiting, skipping and closing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// More bytes are needed; retry once the transport delivers them.
    UnexpectedEof,
    /// Bytes violate a type's encoding. The stream is desynchronized.
    MalformedValue,
    /// No descriptor for (version, state, direction, id).
    UnknownPacket,
    /// The protocol version or packet type isn't available.
    NotSupportedInVersion,
    /// Declared frame length above the configured ceiling.
    FrameTooLarge,
    /// Cipher used out of order or before negotiation.
    CipherMisuse,
    /// Operation illegal in the session's current state.
    InvalidState,
    /// Inconsistent version table.
    Registration,
    /// Transport failure or peer hang-up.
    Io,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("unknown packet id 0x{id:02X} (protocol={version}, state={state:?}, {direction:?})")]
    UnknownPacket {
        version: i32,
        state: ConnectionState,
        direction: PacketDirection,
        id: i32,
    },
    #[error("packet id 0x{id:02X} is not defined for protocol {version} (state={state:?}, {direction:?}) but exists in other versions")]
    NotInVersion {
        version: i32,
        state: ConnectionState,
        direction: PacketDirection,
        id: i32,
    },
    #[error("packet {name} is not supported by protocol {version}")]
    PacketNotInVersion { name: &'static str, version: i32 },
    #[error("unsupported protocol version {0}")]
    UnsupportedVersion(i32),
    #[error("duplicate packet id 0x{id:02X} (protocol={version}, state={state:?}, {direction:?})")]
    DuplicatePacketId {
        version: i32,
        state: ConnectionState,
        direction: PacketDirection,
        id: i32,
    },
    #[error("packet {name} registered twice for protocol {version}")]
    DuplicatePacketType { name: &'static str, version: i32 },
    #[error("no packet named {name} in protocol {version}")]
    UnknownPacketName { name: String, version: i32 },
    #[error("frame of {len} bytes exceeds maximum of {max}")]
    FrameTooLarge { len: usize, max: usize },
    #[error("badly compressed packet: {0}")]
    BadCompression(String),
    #[error("packet {name} ended early: needed {needed} more bytes, {remaining} left in frame")]
    TruncatedPacket {
        name: &'static str,
        needed: usize,
        remaining: usize,
    },
    #[error("{trailing} unread bytes after packet {name}")]
    TrailingBytes { name: &'static str, trailing: usize },
    #[error("cipher misuse: {0}")]
    CipherMisuse(&'static str),
    #[error("key exchange failed: {0}")]
    KeyExchange(String),
    #[error("invalid state transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
    #[error("invalid handshake next state {0}")]
    InvalidNextState(i32),
    #[error("packet {name} belongs to {expected:?} but connection is in {current:?}")]
    WrongState {
        name: &'static str,
        expected: ConnectionState,
        current: ConnectionState,
    },
    #[error("packet {name} cannot be sent {direction:?}")]
    WrongDirection {
        name: &'static str,
        direction: PacketDirection,
    },
    #[error("{0}")]
    InvalidOperation(&'static str),
    #[error("connection closed")]
    ConnectionClosed,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::Codec(e) if e.is_eof() => ErrorKind::UnexpectedEof,
            ProtocolError::Codec(_)
            | ProtocolError::BadCompression(_)
            | ProtocolError::TruncatedPacket { .. }
            | ProtocolError::TrailingBytes { .. } => ErrorKind::MalformedValue,
            ProtocolError::UnknownPacket { .. } | ProtocolError::NotInVersion { .. } => {
                ErrorKind::UnknownPacket
            }
            ProtocolError::PacketNotInVersion { .. } | ProtocolError::UnsupportedVersion(_) => {
                ErrorKind::NotSupportedInVersion
            }
            ProtocolError::DuplicatePacketId { .. }
            | ProtocolError::DuplicatePacketType { .. }
            | ProtocolError::UnknownPacketName { .. } => ErrorKind::Registration,
            ProtocolError::FrameTooLarge { .. } => ErrorKind::FrameTooLarge,
            ProtocolError::CipherMisuse(_) | ProtocolError::KeyExchange(_) => {
                ErrorKind::CipherMisuse
            }
            ProtocolError::InvalidTransition { .. }
            | ProtocolError::InvalidNextState(_)
            | ProtocolError::InvalidOperation(_)
            | ProtocolError::WrongState { .. }
            | ProtocolError::WrongDirection { .. } => ErrorKind::InvalidState,
            ProtocolError::ConnectionClosed | ProtocolError::Io(_) => ErrorKind::Io,
        }
    }

    /// Whether the connection must be closed. Only a short read is recoverable.
    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::UnexpectedEof
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
