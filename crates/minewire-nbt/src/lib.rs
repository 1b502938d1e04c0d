pub mod mutf8;
mod nbt;

pub use nbt::*;
