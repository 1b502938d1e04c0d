use crate::handshaking::Handshake;
use crate::login::*;
use crate::play::*;
use crate::status::*;
use crate::v1_19;
use minewire_protocol_core::{ProtocolResult, VersionAlias, VersionTable, VersionTableBuilder};

pub const PROTOCOL_1_18_1: i32 = 757;
pub const PROTOCOL_1_18_2: i32 = 758;
pub const PROTOCOL_1_19: i32 = 759;
pub const LATEST_PROTOCOL: i32 = PROTOCOL_1_19;

/// Handshaking and Status never change between versions.
fn common(builder: VersionTableBuilder) -> VersionTableBuilder {
    builder
        .register::<Handshake>(0x00)
        .register::<StatusRequest>(0x00)
        .register::<PingRequest>(0x01)
        .register::<StatusResponse>(0x00)
        .register::<PongResponse>(0x01)
}

/// Login packets present with the same layout in every supported version.
fn common_login(builder: VersionTableBuilder) -> VersionTableBuilder {
    builder
        .register::<LoginDisconnect>(0x00)
        .register::<EncryptionRequest>(0x01)
        .register::<SetCompression>(0x03)
        .register::<LoginPluginRequest>(0x04)
        .register::<LoginPluginResponse>(0x02)
}

pub fn v1_18_1() -> ProtocolResult<VersionTable> {
    let builder = common_login(common(VersionTable::builder(PROTOCOL_1_18_1, "1.18.1")))
        .register::<LoginSuccess>(0x02)
        .register::<LoginStart>(0x00)
        .register::<EncryptionResponse>(0x01);

    builder
        // clientbound
        .register::<BlockChange>(0x0C)
        .register::<ServerDifficulty>(0x0E)
        .register::<ChatMessageClientbound>(0x0F)
        .register::<PluginMessageClientbound>(0x18)
        .register::<Disconnect>(0x1A)
        .register::<EntityStatus>(0x1B)
        .register::<KeepAliveClientbound>(0x21)
        .register::<PlayerPositionAndLook>(0x38)
        .register::<EntityMetadata>(0x4D)
        .register::<EntityProperties>(0x64)
        // serverbound
        .register::<TeleportConfirm>(0x00)
        .register::<SetDifficulty>(0x02)
        .register::<ChatMessageServerbound>(0x03)
        .register::<PluginMessageServerbound>(0x0A)
        .register::<KeepAliveServerbound>(0x0F)
        .register::<LockDifficulty>(0x10)
        .register::<PlayerPosition>(0x11)
        .register::<PlayerPositionAndRotation>(0x12)
        .register::<PlayerRotation>(0x13)
        .register::<PlayerMovement>(0x14)
        .build()
}

/// 1.18.2 kept every id of 1.18.1.
pub fn v1_18_2_alias() -> VersionAlias {
    VersionAlias {
        protocol: PROTOCOL_1_18_2,
        name: "1.18.2".into(),
        base: PROTOCOL_1_18_1,
        overrides: Vec::new(),
    }
}

pub fn v1_19() -> ProtocolResult<VersionTable> {
    let builder = common_login(common(VersionTable::builder(PROTOCOL_1_19, "1.19")))
        .register::<v1_19::LoginSuccess>(0x02)
        .register::<v1_19::LoginStart>(0x00)
        .register::<v1_19::EncryptionResponse>(0x01);

    builder
        // clientbound
        .register::<BlockChange>(0x09)
        .register::<ServerDifficulty>(0x0B)
        .register::<PluginMessageClientbound>(0x15)
        .register::<Disconnect>(0x17)
        .register::<EntityStatus>(0x18)
        .register::<KeepAliveClientbound>(0x1E)
        .register::<PlayerPositionAndLook>(0x36)
        .register::<EntityMetadata>(0x50)
        .register::<EntityProperties>(0x68)
        .register::<v1_19::SystemChat>(0x5F)
        // serverbound
        .register::<TeleportConfirm>(0x00)
        .register::<SetDifficulty>(0x02)
        .register::<PluginMessageServerbound>(0x0C)
        .register::<KeepAliveServerbound>(0x11)
        .register::<LockDifficulty>(0x12)
        .register::<PlayerPosition>(0x13)
        .register::<PlayerPositionAndRotation>(0x14)
        .register::<PlayerRotation>(0x15)
        .register::<PlayerMovement>(0x16)
        .build()
}
