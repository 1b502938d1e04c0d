//! Play-state packets whose layout is shared by 1.18.x and 1.19.

use crate::login::MAX_PLUGIN_DATA;
use bytes::BytesMut;
use minewire_protocol_core::metadata::{read_entity_metadata, write_entity_metadata};
use minewire_protocol_core::*;
use minewire_types::{Chat, Identifier, Position, Rotation, Vector3};
use uuid::Uuid;

fn read_vec3(buf: &mut BytesMut) -> CodecResult<Vector3<f64>> {
    Ok(Vector3::new(read_f64(buf)?, read_f64(buf)?, read_f64(buf)?))
}

fn write_vec3(buf: &mut BytesMut, v: &Vector3<f64>) {
    write_f64(buf, v.x);
    write_f64(buf, v.y);
    write_f64(buf, v.z);
}

fn read_look(buf: &mut BytesMut) -> CodecResult<Rotation> {
    Ok(Rotation::new(read_f32(buf)?, read_f32(buf)?))
}

fn write_look(buf: &mut BytesMut, rotation: &Rotation) {
    write_f32(buf, rotation.yaw);
    write_f32(buf, rotation.pitch);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveClientbound {
    pub keep_alive_id: i64,
}

impl PacketDef for KeepAliveClientbound {
    const NAME: &'static str = "keep_alive";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_i64(buf, self.keep_alive_id);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            keep_alive_id: read_i64(buf)?,
        })
    }
}

/// Reply to [`KeepAliveClientbound`] with the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepAliveServerbound {
    pub keep_alive_id: i64,
}

impl PacketDef for KeepAliveServerbound {
    const NAME: &'static str = "keep_alive";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_i64(buf, self.keep_alive_id);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            keep_alive_id: read_i64(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Disconnect {
    pub reason: Chat,
}

impl PacketDef for Disconnect {
    const NAME: &'static str = "disconnect";
    const STATE: ConnectionState = ConnectionState::Play;
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

/// Channel-tagged opaque data (e.g. `minecraft:brand`). The data runs to
/// the end of the frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessageClientbound {
    pub channel: Identifier,
    pub data: Vec<u8>,
}

impl PacketDef for PluginMessageClientbound {
    const NAME: &'static str = "plugin_message";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_identifier(buf, &self.channel);
        buf.extend_from_slice(&self.data);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            channel: read_identifier(buf)?,
            data: read_remaining(buf, MAX_PLUGIN_DATA)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginMessageServerbound {
    pub channel: Identifier,
    pub data: Vec<u8>,
}

impl PacketDef for PluginMessageServerbound {
    const NAME: &'static str = "plugin_message";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_identifier(buf, &self.channel);
        buf.extend_from_slice(&self.data);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            channel: read_identifier(buf)?,
            data: read_remaining(buf, MAX_PLUGIN_DATA)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerDifficulty {
    /// 0 peaceful, 1 easy, 2 normal, 3 hard.
    pub difficulty: u8,
    pub locked: bool,
}

impl PacketDef for ServerDifficulty {
    const NAME: &'static str = "server_difficulty";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_u8(buf, self.difficulty);
        write_bool(buf, self.locked);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            difficulty: read_u8(buf)?,
            locked: read_bool(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityStatus {
    pub entity_id: i32,
    pub status: i8,
}

impl PacketDef for EntityStatus {
    const NAME: &'static str = "entity_status";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_i32(buf, self.entity_id);
        write_i8(buf, self.status);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            entity_id: read_i32(buf)?,
            status: read_i8(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockChange {
    pub position: Position,
    pub block_id: i32,
}

impl PacketDef for BlockChange {
    const NAME: &'static str = "block_change";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_position(buf, &self.position);
        write_varint(buf, self.block_id);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            position: read_position(buf)?,
            block_id: read_varint(buf)?,
        })
    }
}

/// Teleports the player. Bits in `flags` mark fields as relative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPositionAndLook {
    pub position: Vector3<f64>,
    pub rotation: Rotation,
    pub flags: u8,
    pub teleport_id: i32,
    pub dismount_vehicle: bool,
}

impl PacketDef for PlayerPositionAndLook {
    const NAME: &'static str = "player_position_and_look";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_vec3(buf, &self.position);
        write_look(buf, &self.rotation);
        write_u8(buf, self.flags);
        write_varint(buf, self.teleport_id);
        write_bool(buf, self.dismount_vehicle);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            position: read_vec3(buf)?,
            rotation: read_look(buf)?,
            flags: read_u8(buf)?,
            teleport_id: read_varint(buf)?,
            dismount_vehicle: read_bool(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeleportConfirm {
    pub teleport_id: i32,
}

impl PacketDef for TeleportConfirm {
    const NAME: &'static str = "teleport_confirm";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_varint(buf, self.teleport_id);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            teleport_id: read_varint(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetDifficulty {
    pub difficulty: i8,
}

impl PacketDef for SetDifficulty {
    const NAME: &'static str = "set_difficulty";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_i8(buf, self.difficulty);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            difficulty: read_i8(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockDifficulty {
    pub locked: bool,
}

impl PacketDef for LockDifficulty {
    const NAME: &'static str = "lock_difficulty";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_bool(buf, self.locked);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            locked: read_bool(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition {
    /// `y` is the feet position.
    pub position: Vector3<f64>,
    pub on_ground: bool,
}

impl PacketDef for PlayerPosition {
    const NAME: &'static str = "player_position";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_vec3(buf, &self.position);
        write_bool(buf, self.on_ground);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            position: read_vec3(buf)?,
            on_ground: read_bool(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPositionAndRotation {
    pub position: Vector3<f64>,
    pub rotation: Rotation,
    pub on_ground: bool,
}

impl PacketDef for PlayerPositionAndRotation {
    const NAME: &'static str = "player_position_and_rotation";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_vec3(buf, &self.position);
        write_look(buf, &self.rotation);
        write_bool(buf, self.on_ground);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            position: read_vec3(buf)?,
            rotation: read_look(buf)?,
            on_ground: read_bool(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerRotation {
    pub rotation: Rotation,
    pub on_ground: bool,
}

impl PacketDef for PlayerRotation {
    const NAME: &'static str = "player_rotation";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_look(buf, &self.rotation);
        write_bool(buf, self.on_ground);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            rotation: read_look(buf)?,
            on_ground: read_bool(buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerMovement {
    pub on_ground: bool,
}

impl PacketDef for PlayerMovement {
    const NAME: &'static str = "player_movement";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_bool(buf, self.on_ground);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            on_ground: read_bool(buf)?,
        })
    }
}

/// 1.18 chat: JSON text, a position byte and the sender.
/// Replaced by signed chat packets in 1.19.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageClientbound {
    pub message: Chat,
    /// 0 chat, 1 system, 2 action bar.
    pub position: i8,
    pub sender: Uuid,
}

impl PacketDef for ChatMessageClientbound {
    const NAME: &'static str = "chat_message";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_chat(buf, &self.message);
        write_i8(buf, self.position);
        write_uuid(buf, &self.sender);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            message: read_chat(buf)?,
            position: read_i8(buf)?,
            sender: read_uuid(buf)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessageServerbound {
    pub message: String,
}

impl PacketDef for ChatMessageServerbound {
    const NAME: &'static str = "chat_message";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Serverbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_string(buf, &self.message);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            message: read_string(buf, 256)?,
        })
    }
}

/// Changed metadata entries of an entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityMetadata {
    pub entity_id: i32,
    pub metadata: Vec<MetadataEntry>,
}

impl PacketDef for EntityMetadata {
    const NAME: &'static str = "entity_metadata";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_varint(buf, self.entity_id);
        write_entity_metadata(buf, &self.metadata);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            entity_id: read_varint(buf)?,
            metadata: read_entity_metadata(buf)?,
        })
    }
}

const MAX_PROPERTIES: usize = 256;
const MAX_MODIFIERS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct EntityProperty {
    pub key: Identifier,
    pub value: f64,
    pub modifiers: Vec<AttributeModifier>,
}

fn read_property(buf: &mut BytesMut) -> CodecResult<EntityProperty> {
    Ok(EntityProperty {
        key: read_identifier(buf)?,
        value: read_f64(buf)?,
        modifiers: read_array(buf, MAX_MODIFIERS, read_modifier)?,
    })
}

fn write_property(buf: &mut BytesMut, property: &EntityProperty) {
    write_identifier(buf, &property.key);
    write_f64(buf, property.value);
    write_array(buf, &property.modifiers, write_modifier);
}

/// Attribute values (movement speed, max health, ...) and their modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityProperties {
    pub entity_id: i32,
    pub properties: Vec<EntityProperty>,
}

impl PacketDef for EntityProperties {
    const NAME: &'static str = "entity_properties";
    const STATE: ConnectionState = ConnectionState::Play;
    const DIRECTION: PacketDirection = PacketDirection::Clientbound;

    fn encode(&self, buf: &mut BytesMut) {
        write_varint(buf, self.entity_id);
        write_array(buf, &self.properties, write_property);
    }

    fn decode(buf: &mut BytesMut) -> CodecResult<Self> {
        Ok(Self {
            entity_id: read_varint(buf)?,
            properties: read_array(buf, MAX_PROPERTIES, read_property)?,
        })
    }
}
