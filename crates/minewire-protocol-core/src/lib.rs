pub mod auth;
pub mod cipher;
pub mod codec;
pub mod compression;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod metadata;
pub mod packet;
pub mod registry;
pub mod session;
pub mod state;

pub use codec::*;
pub use config::{PipelineConfig, UnknownPacketPolicy};
pub use connection::{Connection, ConnectionReader, ConnectionWriter};
pub use error::{ErrorKind, ProtocolError, ProtocolResult};
pub use metadata::{MetadataEntry, MetadataValue};
pub use packet::{Packet, PacketDef, PacketDescriptor, SessionEffect, UnknownPacket};
pub use registry::{IdOverride, PacketRegistry, VersionAlias, VersionTable, VersionTableBuilder};
pub use session::{ConnectionSession, SessionReader, SessionWriter};
pub use state::*;
