use serde::{Deserialize, Serialize};

/// A block position in the world (x, y, z integers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Encode as a 64-bit long (protocol format).
    /// x: 26 bits, z: 26 bits, y: 12 bits
    pub fn encode(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.z as u64 & 0x3FFFFFF) << 12)
            | (self.y as u64 & 0xFFF)
    }

    pub fn decode(val: u64) -> Self {
        Self {
            x: sign_extend((val >> 38) as i32, 26),
            y: sign_extend((val & 0xFFF) as i32, 12),
            z: sign_extend(((val >> 12) & 0x3FFFFFF) as i32, 26),
        }
    }

    /// True when every coordinate fits the packed bit widths.
    pub fn is_packable(&self) -> bool {
        fits(self.x, 26) && fits(self.z, 26) && fits(self.y, 12)
    }
}

fn sign_extend(value: i32, bits: u32) -> i32 {
    if value >= 1 << (bits - 1) {
        value - (1 << bits)
    } else {
        value
    }
}

fn fits(value: i32, bits: u32) -> bool {
    let half = 1i32 << (bits - 1);
    (-half..half).contains(&value)
}

/// Three numeric values, used for positions and velocities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3<T> {
    pub x: T,
    pub y: T,
    pub z: T,
}

impl<T> Vector3<T> {
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

/// Yaw and pitch in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    pub yaw: f32,
    pub pitch: f32,
}

impl Rotation {
    pub fn new(yaw: f32, pitch: f32) -> Self {
        Self { yaw, pitch }
    }
}

/// A Minecraft resource identifier (e.g., "minecraft:brand").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identifier {
    pub namespace: String,
    pub path: String,
}

impl Identifier {
    pub fn new(namespace: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            path: path.into(),
        }
    }

    pub fn minecraft(path: impl Into<String>) -> Self {
        Self::new("minecraft", path)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl std::str::FromStr for Identifier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (namespace, path) = s.split_once(':').unwrap_or(("minecraft", s));
        let valid_namespace = namespace
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'));
        let valid_path = path
            .chars()
            .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'));
        if namespace.is_empty() || path.is_empty() || !valid_namespace || !valid_path {
            return Err(format!("invalid identifier {:?}", s));
        }
        Ok(Self::new(namespace, path))
    }
}

/// Text component for chat messages (simplified JSON text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extra: Vec<TextComponent>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: None,
            italic: None,
            extra: Vec::new(),
        }
    }
}

/// A chat message as carried on the wire: arbitrary JSON text.
///
/// Peers may send any valid text JSON (a bare string, an array, a component
/// with keys we don't model), so the raw value is kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Chat(pub serde_json::Value);

impl Chat {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::from(TextComponent::plain(text))
    }

    /// Best-effort flattening of the component tree into plain text.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        flatten(&self.0, &mut out);
        out
    }
}

fn flatten(value: &serde_json::Value, out: &mut String) {
    match value {
        serde_json::Value::String(s) => out.push_str(s),
        serde_json::Value::Array(parts) => parts.iter().for_each(|p| flatten(p, out)),
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::String(text)) = map.get("text") {
                out.push_str(text);
            }
            if let Some(extra) = map.get("extra") {
                flatten(extra, out);
            }
        }
        _ => {}
    }
}

impl From<TextComponent> for Chat {
    fn from(component: TextComponent) -> Self {
        Self(serde_json::to_value(component).unwrap_or(serde_json::Value::Null))
    }
}

/// Block face / cardinal direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    Down = 0,
    Up = 1,
    North = 2,
    South = 3,
    West = 4,
    East = 5,
}

impl Direction {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Direction::Down),
            1 => Some(Direction::Up),
            2 => Some(Direction::North),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            5 => Some(Direction::East),
            _ => None,
        }
    }
}

/// Entity pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Pose {
    Standing = 0,
    FallFlying = 1,
    Sleeping = 2,
    Swimming = 3,
    SpinAttack = 4,
    Sneaking = 5,
    Dying = 6,
}

impl Pose {
    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn from_id(id: i32) -> Option<Self> {
        match id {
            0 => Some(Pose::Standing),
            1 => Some(Pose::FallFlying),
            2 => Some(Pose::Sleeping),
            3 => Some(Pose::Swimming),
            4 => Some(Pose::SpinAttack),
            5 => Some(Pose::Sneaking),
            6 => Some(Pose::Dying),
            _ => None,
        }
    }
}

/// Attribute modifier operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum EntityModifier {
    /// Add/subtract amount.
    Modify = 0,
    /// Add/subtract amount percent of the current value.
    ModifyPercent = 1,
    /// Multiply by percent amount.
    ModifyMultiplyPercent = 2,
}

impl EntityModifier {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(EntityModifier::Modify),
            1 => Some(EntityModifier::ModifyPercent),
            2 => Some(EntityModifier::ModifyMultiplyPercent),
            _ => None,
        }
    }
}

/// Villager type, profession and level, as carried in entity metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VillagerData {
    pub kind: i32,
    pub profession: i32,
    pub level: i32,
}

/// An item stack in an inventory slot.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemStack {
    pub item_id: i32,
    pub count: i8,
}

impl ItemStack {
    pub fn new(item_id: i32, count: i8) -> Self {
        Self { item_id, count }
    }
}
