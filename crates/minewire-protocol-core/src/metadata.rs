//! Entity metadata: `(index, type, value)` entries closed by `0xFF`.

use crate::codec::*;
use bytes::{BufMut, BytesMut};
use minewire_nbt::NbtValue;
use minewire_types::{Chat, Direction, Pose, Position, Vector3, VillagerData};
use uuid::Uuid;

/// Index byte that ends the entry list.
pub const METADATA_END: u8 = 0xFF;
/// Indices are a byte below the terminator; allow repeats but no more.
pub const MAX_METADATA_ENTRIES: usize = 256;

/// A typed metadata value. The wire type id follows from the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    VarInt(i32),
    Float(f32),
    String(String),
    Chat(Chat),
    OptChat(Option<Chat>),
    Slot(Option<Slot>),
    Boolean(bool),
    Rotation(Vector3<f32>),
    Position(Position),
    OptPosition(Option<Position>),
    Direction(Direction),
    OptUuid(Option<Uuid>),
    /// Block state id, 0 for air.
    BlockState(i32),
    Nbt(Option<NbtValue>),
    Particle(Particle),
    Villager(VillagerData),
    OptVarInt(Option<i32>),
    Pose(Pose),
}

impl MetadataValue {
    pub fn type_id(&self) -> i32 {
        match self {
            MetadataValue::Byte(_) => 0,
            MetadataValue::VarInt(_) => 1,
            MetadataValue::Float(_) => 2,
            MetadataValue::String(_) => 3,
            MetadataValue::Chat(_) => 4,
            MetadataValue::OptChat(_) => 5,
            MetadataValue::Slot(_) => 6,
            MetadataValue::Boolean(_) => 7,
            MetadataValue::Rotation(_) => 8,
            MetadataValue::Position(_) => 9,
            MetadataValue::OptPosition(_) => 10,
            MetadataValue::Direction(_) => 11,
            MetadataValue::OptUuid(_) => 12,
            MetadataValue::BlockState(_) => 13,
            MetadataValue::Nbt(_) => 14,
            MetadataValue::Particle(_) => 15,
            MetadataValue::Villager(_) => 16,
            MetadataValue::OptVarInt(_) => 17,
            MetadataValue::Pose(_) => 18,
        }
    }

    fn read(buf: &mut BytesMut, type_id: i32) -> CodecResult<Self> {
        Ok(match type_id {
            0 => MetadataValue::Byte(read_i8(buf)?),
            1 => MetadataValue::VarInt(read_varint(buf)?),
            2 => MetadataValue::Float(read_f32(buf)?),
            3 => MetadataValue::String(read_string(buf, DEFAULT_MAX_STRING)?),
            4 => MetadataValue::Chat(read_chat(buf)?),
            5 => MetadataValue::OptChat(read_optional(buf, read_chat)?),
            6 => MetadataValue::Slot(read_slot(buf)?),
            7 => MetadataValue::Boolean(read_bool(buf)?),
            8 => MetadataValue::Rotation(read_rotation3(buf)?),
            9 => MetadataValue::Position(read_position(buf)?),
            10 => MetadataValue::OptPosition(read_optional(buf, read_position)?),
            11 => MetadataValue::Direction(read_direction(buf)?),
            12 => MetadataValue::OptUuid(read_optional(buf, read_uuid)?),
            13 => MetadataValue::BlockState(read_varint(buf)?),
            14 => MetadataValue::Nbt(read_nbt(buf)?),
            15 => MetadataValue::Particle(read_particle(buf)?),
            16 => MetadataValue::Villager(read_villager(buf)?),
            17 => MetadataValue::OptVarInt(read_optional_varint(buf)?),
            18 => MetadataValue::Pose(read_pose(buf)?),
            other => {
                return Err(CodecError::InvalidEnum {
                    kind: "metadata type",
                    value: other,
                })
            }
        })
    }

    fn write(&self, buf: &mut BytesMut) {
        match self {
            MetadataValue::Byte(v) => write_i8(buf, *v),
            MetadataValue::VarInt(v) | MetadataValue::BlockState(v) => write_varint(buf, *v),
            MetadataValue::Float(v) => write_f32(buf, *v),
            MetadataValue::String(s) => write_string(buf, s),
            MetadataValue::Chat(chat) => write_chat(buf, chat),
            MetadataValue::OptChat(chat) => write_optional(buf, chat.as_ref(), write_chat),
            MetadataValue::Slot(slot) => write_slot(buf, slot.as_ref()),
            MetadataValue::Boolean(v) => write_bool(buf, *v),
            MetadataValue::Rotation(r) => write_rotation3(buf, r),
            MetadataValue::Position(p) => write_position(buf, p),
            MetadataValue::OptPosition(p) => write_optional(buf, p.as_ref(), write_position),
            MetadataValue::Direction(d) => write_direction(buf, *d),
            MetadataValue::OptUuid(u) => write_optional(buf, u.as_ref(), write_uuid),
            MetadataValue::Nbt(nbt) => write_nbt(buf, nbt.as_ref()),
            MetadataValue::Particle(p) => write_particle(buf, p),
            MetadataValue::Villager(v) => write_villager(buf, v),
            MetadataValue::OptVarInt(v) => write_optional_varint(buf, *v),
            MetadataValue::Pose(p) => write_pose(buf, *p),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetadataValue,
}

impl MetadataEntry {
    pub fn new(index: u8, value: MetadataValue) -> Self {
        Self { index, value }
    }
}

pub fn read_entity_metadata(buf: &mut BytesMut) -> CodecResult<Vec<MetadataEntry>> {
    let mut entries = Vec::new();
    loop {
        let index = read_u8(buf)?;
        if index == METADATA_END {
            return Ok(entries);
        }
        if entries.len() == MAX_METADATA_ENTRIES {
            return Err(CodecError::ArrayTooLong {
                len: entries.len() + 1,
                max: MAX_METADATA_ENTRIES,
            });
        }
        let type_id = read_varint(buf)?;
        entries.push(MetadataEntry {
            index,
            value: MetadataValue::read(buf, type_id)?,
        });
    }
}

/// Entries with index `0xFF` would end the list early and must not be passed.
pub fn write_entity_metadata(buf: &mut BytesMut, entries: &[MetadataEntry]) {
    for entry in entries {
        buf.put_u8(entry.index);
        write_varint(buf, entry.value.type_id());
        entry.value.write(buf);
    }
    buf.put_u8(METADATA_END);
}

#[cfg(test)]
mod tests {
    use super::*;
    use minewire_types::ItemStack;

    fn sample() -> Vec<MetadataEntry> {
        vec![
            MetadataEntry::new(0, MetadataValue::Byte(0x02)),
            MetadataEntry::new(1, MetadataValue::VarInt(300)),
            MetadataEntry::new(2, MetadataValue::OptChat(Some(Chat::plain("Bob")))),
            MetadataEntry::new(3, MetadataValue::Boolean(true)),
            MetadataEntry::new(
                8,
                MetadataValue::Slot(Some(Slot {
                    item: ItemStack::new(1, 1),
                    nbt: None,
                })),
            ),
            MetadataEntry::new(9, MetadataValue::Position(Position::new(1, 2, 3))),
            MetadataEntry::new(10, MetadataValue::OptPosition(None)),
            MetadataEntry::new(11, MetadataValue::Rotation(Vector3::new(0.0, 45.0, 90.0))),
            MetadataEntry::new(12, MetadataValue::OptUuid(Some(Uuid::from_u128(7)))),
            MetadataEntry::new(13, MetadataValue::BlockState(0)),
            MetadataEntry::new(
                14,
                MetadataValue::Particle(Particle {
                    id: PARTICLE_DUST,
                    data: ParticleData::Dust {
                        red: 1.0,
                        green: 0.0,
                        blue: 0.0,
                        scale: 1.0,
                    },
                }),
            ),
            MetadataEntry::new(
                17,
                MetadataValue::Villager(VillagerData {
                    kind: 0,
                    profession: 3,
                    level: 2,
                }),
            ),
            MetadataEntry::new(18, MetadataValue::OptVarInt(Some(0))),
            MetadataEntry::new(6, MetadataValue::Pose(Pose::Sleeping)),
        ]
    }

    #[test]
    fn test_metadata_roundtrip() {
        let entries = sample();
        let mut buf = BytesMut::new();
        write_entity_metadata(&mut buf, &entries);
        assert_eq!(buf[buf.len() - 1], METADATA_END);
        assert_eq!(read_entity_metadata(&mut buf).unwrap(), entries);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_metadata_layout() {
        let mut buf = BytesMut::new();
        write_entity_metadata(
            &mut buf,
            &[
                MetadataEntry::new(0, MetadataValue::Byte(0x20)),
                MetadataEntry::new(7, MetadataValue::Direction(Direction::Up)),
            ],
        );
        assert_eq!(&buf[..], &[0x00, 0x00, 0x20, 0x07, 0x0B, 0x01, 0xFF]);

        let mut empty = BytesMut::new();
        write_entity_metadata(&mut empty, &[]);
        assert_eq!(&empty[..], &[0xFF]);
        assert!(read_entity_metadata(&mut empty).unwrap().is_empty());
    }

    #[test]
    fn test_metadata_rejects_unknown_type() {
        let mut buf = BytesMut::from(&[0x00, 0x13, 0x00, 0xFF][..]);
        assert!(matches!(
            read_entity_metadata(&mut buf),
            Err(CodecError::InvalidEnum {
                kind: "metadata type",
                value: 19
            })
        ));
    }

    #[test]
    fn test_metadata_missing_terminator_is_eof() {
        let mut buf = BytesMut::new();
        write_entity_metadata(
            &mut buf,
            &[MetadataEntry::new(0, MetadataValue::Float(1.5))],
        );
        buf.truncate(buf.len() - 1);
        assert!(read_entity_metadata(&mut buf).unwrap_err().is_eof());
    }
}
