use bytes::{Buf, BufMut, BytesMut};
use minewire_nbt::NbtValue;
use minewire_types::{
    Chat, Direction, EntityModifier, Identifier, ItemStack, Pose, Position, Vector3, VillagerData,
};
use uuid::Uuid;

pub use crate::error::{CodecError, CodecResult};

pub const MAX_VARINT_LEN: usize = 5;
pub const MAX_VARLONG_LEN: usize = 10;

/// Default string limit in UTF-16 code units.
pub const DEFAULT_MAX_STRING: usize = 32767;
/// Chat JSON may be longer than ordinary strings.
pub const MAX_CHAT_LEN: usize = 262144;

fn ensure(buf: &BytesMut, needed: usize) -> CodecResult<()> {
    if buf.remaining() < needed {
        return Err(CodecError::UnexpectedEof {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

macro_rules! fixed_codec {
    ($($read:ident, $write:ident, $ty:ty, $get:ident, $put:ident;)*) => {
        $(
            pub fn $read(buf: &mut BytesMut) -> CodecResult<$ty> {
                ensure(buf, std::mem::size_of::<$ty>())?;
                Ok(buf.$get())
            }

            pub fn $write(buf: &mut BytesMut, value: $ty) {
                buf.$put(value);
            }
        )*
    };
}

fixed_codec! {
    read_i8, write_i8, i8, get_i8, put_i8;
    read_u8, write_u8, u8, get_u8, put_u8;
    read_i16, write_i16, i16, get_i16, put_i16;
    read_u16, write_u16, u16, get_u16, put_u16;
    read_i32, write_i32, i32, get_i32, put_i32;
    read_i64, write_i64, i64, get_i64, put_i64;
    read_u64, write_u64, u64, get_u64, put_u64;
    read_f32, write_f32, f32, get_f32, put_f32;
    read_f64, write_f64, f64, get_f64, put_f64;
}

pub fn read_bool(buf: &mut BytesMut) -> CodecResult<bool> {
    match read_u8(buf)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(CodecError::InvalidBool(other)),
    }
}

pub fn write_bool(buf: &mut BytesMut, value: bool) {
    buf.put_u8(value as u8);
}

/// Read a VarInt from the buffer.
pub fn read_varint(buf: &mut BytesMut) -> CodecResult<i32> {
    let mut result: i32 = 0;
    for i in 0..MAX_VARINT_LEN {
        ensure(buf, 1)?;
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(CodecError::VarIntTooLong(MAX_VARINT_LEN))
}

/// Decode a VarInt at the start of `bytes` without consuming anything.
///
/// Returns `Ok(None)` when `bytes` ends inside the VarInt, otherwise the value
/// and the number of bytes it occupies. `max_len` may be tighter than
/// [`MAX_VARINT_LEN`] (frame lengths are limited to 3 bytes).
pub fn peek_varint(bytes: &[u8], max_len: usize) -> CodecResult<Option<(i32, usize)>> {
    let mut result: i32 = 0;
    for i in 0..max_len.min(MAX_VARINT_LEN) {
        let Some(&byte) = bytes.get(i) else {
            return Ok(None);
        };
        result |= ((byte & 0x7F) as i32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(Some((result, i + 1)));
        }
    }
    Err(CodecError::VarIntTooLong(max_len))
}

/// Write a VarInt to the buffer.
pub fn write_varint(buf: &mut BytesMut, mut value: i32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Calculate the byte length of a VarInt.
pub fn varint_len(value: i32) -> usize {
    let mut val = value as u32;
    let mut len = 0;
    loop {
        len += 1;
        val >>= 7;
        if val == 0 {
            break;
        }
    }
    len
}

/// Read a VarLong from the buffer.
pub fn read_varlong(buf: &mut BytesMut) -> CodecResult<i64> {
    let mut result: i64 = 0;
    for i in 0..MAX_VARLONG_LEN {
        ensure(buf, 1)?;
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i64) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(CodecError::VarIntTooLong(MAX_VARLONG_LEN))
}

pub fn write_varlong(buf: &mut BytesMut, mut value: i64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u64) >> 7) as i64;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn varlong_len(value: i64) -> usize {
    let bits = 64 - (value as u64).leading_zeros() as usize;
    bits.max(1).div_ceil(7)
}

fn read_length(buf: &mut BytesMut) -> CodecResult<usize> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(CodecError::NegativeLength(len));
    }
    Ok(len as usize)
}

/// Read a protocol string (VarInt byte length + UTF-8).
///
/// `max_chars` counts UTF-16 code units, so characters outside the BMP count
/// twice. Invalid UTF-8 is an error, never replaced.
pub fn read_string(buf: &mut BytesMut, max_chars: usize) -> CodecResult<String> {
    let len = read_length(buf)?;
    let max_bytes = max_chars.saturating_mul(3);
    if len > max_bytes {
        return Err(CodecError::StringTooLong {
            len,
            max: max_bytes,
        });
    }
    ensure(buf, len)?;
    let bytes = buf.split_to(len);
    let s = std::str::from_utf8(&bytes).map_err(|_| CodecError::InvalidUtf8)?;
    let units = s.encode_utf16().count();
    if units > max_chars {
        return Err(CodecError::StringTooLong {
            len: units,
            max: max_chars,
        });
    }
    Ok(s.to_owned())
}

/// Write a protocol string.
pub fn write_string(buf: &mut BytesMut, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.put_slice(s.as_bytes());
}

pub fn read_identifier(buf: &mut BytesMut) -> CodecResult<Identifier> {
    read_string(buf, DEFAULT_MAX_STRING)?
        .parse()
        .map_err(CodecError::Invalid)
}

pub fn write_identifier(buf: &mut BytesMut, id: &Identifier) {
    write_string(buf, &id.to_string());
}

pub fn read_json(buf: &mut BytesMut, max_chars: usize) -> CodecResult<serde_json::Value> {
    let text = read_string(buf, max_chars)?;
    Ok(serde_json::from_str(&text)?)
}

pub fn write_json(buf: &mut BytesMut, value: &serde_json::Value) {
    write_string(buf, &value.to_string());
}

pub fn read_chat(buf: &mut BytesMut) -> CodecResult<Chat> {
    Ok(Chat(read_json(buf, MAX_CHAT_LEN)?))
}

pub fn write_chat(buf: &mut BytesMut, chat: &Chat) {
    write_json(buf, &chat.0);
}

/// Read a UUID (two big-endian 64-bit halves).
pub fn read_uuid(buf: &mut BytesMut) -> CodecResult<Uuid> {
    ensure(buf, 16)?;
    let high = buf.get_u64();
    let low = buf.get_u64();
    Ok(Uuid::from_u64_pair(high, low))
}

/// Write a UUID.
pub fn write_uuid(buf: &mut BytesMut, uuid: &Uuid) {
    let (high, low) = uuid.as_u64_pair();
    buf.put_u64(high);
    buf.put_u64(low);
}

/// Read a byte array with VarInt length prefix.
pub fn read_byte_array(buf: &mut BytesMut, max_len: usize) -> CodecResult<Vec<u8>> {
    let len = read_length(buf)?;
    if len > max_len {
        return Err(CodecError::ArrayTooLong { len, max: max_len });
    }
    ensure(buf, len)?;
    let bytes = buf.split_to(len);
    Ok(bytes.to_vec())
}

/// Write a byte array with VarInt length prefix.
pub fn write_byte_array(buf: &mut BytesMut, data: &[u8]) {
    write_varint(buf, data.len() as i32);
    buf.put_slice(data);
}

/// Consume everything left in the packet body.
pub fn read_remaining(buf: &mut BytesMut, max_len: usize) -> CodecResult<Vec<u8>> {
    if buf.len() > max_len {
        return Err(CodecError::ArrayTooLong {
            len: buf.len(),
            max: max_len,
        });
    }
    Ok(buf.split().to_vec())
}

pub fn read_position(buf: &mut BytesMut) -> CodecResult<Position> {
    Ok(Position::decode(read_u64(buf)?))
}

pub fn write_position(buf: &mut BytesMut, pos: &Position) {
    buf.put_u64(pos.encode());
}

/// Read an angle byte (1/256 of a full turn) as degrees.
pub fn read_angle(buf: &mut BytesMut) -> CodecResult<f32> {
    Ok(read_u8(buf)? as f32 * 360.0 / 256.0)
}

pub fn write_angle(buf: &mut BytesMut, degrees: f32) {
    let steps = (degrees * 256.0 / 360.0).round() as i32;
    buf.put_u8(steps.rem_euclid(256) as u8);
}

/// Three f32 rotations (x, y, z), as used by entity metadata. Yaw/pitch pairs
/// are two plain floats.
pub fn read_rotation3(buf: &mut BytesMut) -> CodecResult<Vector3<f32>> {
    ensure(buf, 12)?;
    Ok(Vector3::new(buf.get_f32(), buf.get_f32(), buf.get_f32()))
}

pub fn write_rotation3(buf: &mut BytesMut, rotation: &Vector3<f32>) {
    buf.put_f32(rotation.x);
    buf.put_f32(rotation.y);
    buf.put_f32(rotation.z);
}

pub fn read_direction(buf: &mut BytesMut) -> CodecResult<Direction> {
    let id = read_varint(buf)?;
    Direction::from_id(id).ok_or(CodecError::InvalidEnum {
        kind: "direction",
        value: id,
    })
}

pub fn write_direction(buf: &mut BytesMut, direction: Direction) {
    write_varint(buf, direction.id());
}

pub fn read_pose(buf: &mut BytesMut) -> CodecResult<Pose> {
    let id = read_varint(buf)?;
    Pose::from_id(id).ok_or(CodecError::InvalidEnum {
        kind: "pose",
        value: id,
    })
}

pub fn write_pose(buf: &mut BytesMut, pose: Pose) {
    write_varint(buf, pose.id());
}

/// Read a network NBT tag. The root name is discarded; `None` means the
/// sender wrote `TAG_End` for "no data".
pub fn read_nbt(buf: &mut BytesMut) -> CodecResult<Option<NbtValue>> {
    Ok(NbtValue::read_root_named(buf)?.map(|(_, value)| value))
}

pub fn write_nbt(buf: &mut BytesMut, value: Option<&NbtValue>) {
    match value {
        Some(nbt) => nbt.write_root_named("", buf),
        None => buf.put_u8(minewire_nbt::TAG_END),
    }
}

/// Read a boolean presence flag followed by the value when present.
pub fn read_optional<T>(
    buf: &mut BytesMut,
    read: impl FnOnce(&mut BytesMut) -> CodecResult<T>,
) -> CodecResult<Option<T>> {
    if read_bool(buf)? {
        Ok(Some(read(buf)?))
    } else {
        Ok(None)
    }
}

pub fn write_optional<T>(
    buf: &mut BytesMut,
    value: Option<&T>,
    write: impl FnOnce(&mut BytesMut, &T),
) {
    match value {
        Some(v) => {
            write_bool(buf, true);
            write(buf, v);
        }
        None => write_bool(buf, false),
    }
}

/// Optional VarInt folded into the value itself: 0 is absent, n + 1 is n.
pub fn read_optional_varint(buf: &mut BytesMut) -> CodecResult<Option<i32>> {
    match read_varint(buf)? {
        0 => Ok(None),
        v => Ok(Some(v - 1)),
    }
}

pub fn write_optional_varint(buf: &mut BytesMut, value: Option<i32>) {
    write_varint(buf, value.map_or(0, |v| v + 1));
}

/// Read a VarInt count followed by that many elements.
pub fn read_array<T>(
    buf: &mut BytesMut,
    max_len: usize,
    read: impl FnMut(&mut BytesMut) -> CodecResult<T>,
) -> CodecResult<Vec<T>> {
    let len = read_length(buf)?;
    if len > max_len {
        return Err(CodecError::ArrayTooLong { len, max: max_len });
    }
    read_fixed_array(buf, len, read)
}

/// Read `count` elements whose count is known from context.
pub fn read_fixed_array<T>(
    buf: &mut BytesMut,
    count: usize,
    mut read: impl FnMut(&mut BytesMut) -> CodecResult<T>,
) -> CodecResult<Vec<T>> {
    // Every element takes at least one byte, so never reserve past that.
    let mut items = Vec::with_capacity(count.min(buf.remaining()));
    for _ in 0..count {
        items.push(read(buf)?);
    }
    Ok(items)
}

pub fn write_array<T>(buf: &mut BytesMut, items: &[T], mut write: impl FnMut(&mut BytesMut, &T)) {
    write_varint(buf, items.len() as i32);
    for item in items {
        write(buf, item);
    }
}

/// An inventory slot as laid out up to 1.20.4.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub item: ItemStack,
    pub nbt: Option<NbtValue>,
}

/// Read a Slot. Returns None for empty slots.
pub fn read_slot(buf: &mut BytesMut) -> CodecResult<Option<Slot>> {
    read_optional(buf, |buf| {
        let item_id = read_varint(buf)?;
        let count = read_i8(buf)?;
        let nbt = read_nbt(buf)?;
        Ok(Slot {
            item: ItemStack::new(item_id, count),
            nbt,
        })
    })
}

pub fn write_slot(buf: &mut BytesMut, slot: Option<&Slot>) {
    write_optional(buf, slot, |buf, slot| {
        write_varint(buf, slot.item.item_id);
        buf.put_i8(slot.item.count);
        write_nbt(buf, slot.nbt.as_ref());
    });
}

/// One attribute modifier of an entity property.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeModifier {
    pub uuid: Uuid,
    pub amount: f64,
    pub operation: EntityModifier,
}

pub fn read_modifier(buf: &mut BytesMut) -> CodecResult<AttributeModifier> {
    let uuid = read_uuid(buf)?;
    let amount = read_f64(buf)?;
    let op = read_u8(buf)?;
    let operation = EntityModifier::from_id(op).ok_or(CodecError::InvalidEnum {
        kind: "modifier operation",
        value: op as i32,
    })?;
    Ok(AttributeModifier {
        uuid,
        amount,
        operation,
    })
}

pub fn write_modifier(buf: &mut BytesMut, modifier: &AttributeModifier) {
    write_uuid(buf, &modifier.uuid);
    write_f64(buf, modifier.amount);
    buf.put_u8(modifier.operation.id());
}

pub fn read_villager(buf: &mut BytesMut) -> CodecResult<VillagerData> {
    Ok(VillagerData {
        kind: read_varint(buf)?,
        profession: read_varint(buf)?,
        level: read_varint(buf)?,
    })
}

pub fn write_villager(buf: &mut BytesMut, villager: &VillagerData) {
    write_varint(buf, villager.kind);
    write_varint(buf, villager.profession);
    write_varint(buf, villager.level);
}

pub const PARTICLE_BLOCK: i32 = 3;
pub const PARTICLE_DUST: i32 = 14;
pub const PARTICLE_FALLING_DUST: i32 = 23;
pub const PARTICLE_ITEM: i32 = 32;

/// Extra data following a particle id. Which variant applies is decided by
/// the id alone.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleData {
    None,
    BlockState(i32),
    Dust {
        red: f32,
        green: f32,
        blue: f32,
        scale: f32,
    },
    Item(Option<Slot>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub id: i32,
    pub data: ParticleData,
}

impl Particle {
    pub fn simple(id: i32) -> Self {
        Self {
            id,
            data: ParticleData::None,
        }
    }
}

pub fn read_particle(buf: &mut BytesMut) -> CodecResult<Particle> {
    let id = read_varint(buf)?;
    let data = read_particle_data(buf, id)?;
    Ok(Particle { id, data })
}

/// Particle data for a particle id already read from elsewhere in the packet.
pub fn read_particle_data(buf: &mut BytesMut, id: i32) -> CodecResult<ParticleData> {
    Ok(match id {
        PARTICLE_BLOCK | PARTICLE_FALLING_DUST => ParticleData::BlockState(read_varint(buf)?),
        PARTICLE_DUST => ParticleData::Dust {
            red: read_f32(buf)?,
            green: read_f32(buf)?,
            blue: read_f32(buf)?,
            scale: read_f32(buf)?,
        },
        PARTICLE_ITEM => ParticleData::Item(read_slot(buf)?),
        _ => ParticleData::None,
    })
}

pub fn write_particle(buf: &mut BytesMut, particle: &Particle) {
    write_varint(buf, particle.id);
    write_particle_data(buf, &particle.data);
}

pub fn write_particle_data(buf: &mut BytesMut, data: &ParticleData) {
    match data {
        ParticleData::None => {}
        ParticleData::BlockState(state) => write_varint(buf, *state),
        ParticleData::Dust {
            red,
            green,
            blue,
            scale,
        } => {
            write_f32(buf, *red);
            write_f32(buf, *green);
            write_f32(buf, *blue);
            write_f32(buf, *scale);
        }
        ParticleData::Item(slot) => write_slot(buf, slot.as_ref()),
    }
}
