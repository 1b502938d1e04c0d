use crate::error::{ProtocolError, ProtocolResult};
use crate::packet::{Packet, PacketDef, PacketDescriptor};
use crate::state::{ConnectionState, PacketDirection};
use serde::Deserialize;
use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

type IdKey = (ConnectionState, PacketDirection, i32);

/// Every packet one protocol version knows, keyed both ways.
///
/// Immutable once built; share it behind an `Arc`.
pub struct VersionTable {
    protocol: i32,
    name: String,
    by_id: HashMap<IdKey, PacketDescriptor>,
    by_type: HashMap<TypeId, i32>,
}

impl VersionTable {
    pub fn builder(protocol: i32, name: impl Into<String>) -> VersionTableBuilder {
        VersionTableBuilder {
            protocol,
            name: name.into(),
            descriptors: Vec::new(),
        }
    }

    pub fn protocol(&self) -> i32 {
        self.protocol
    }

    /// Game version name, e.g. "1.18.1".
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(
        &self,
        state: ConnectionState,
        direction: PacketDirection,
        id: i32,
    ) -> Option<&PacketDescriptor> {
        self.by_id.get(&(state, direction, id))
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &PacketDescriptor> {
        self.by_id.values()
    }

    pub fn id_of<P: PacketDef>(&self) -> Option<i32> {
        self.by_type.get(&TypeId::of::<P>()).copied()
    }

    /// Id of a packet instance: its own id for raw packets, else the table's.
    pub fn id_for(&self, packet: &dyn Packet) -> Option<i32> {
        packet
            .raw_id()
            .or_else(|| self.by_type.get(&packet.packet_type_id()).copied())
    }

    /// Build a new table for `protocol` from this one, moving the packets
    /// named in `overrides` to new ids.
    pub fn derive(
        &self,
        protocol: i32,
        name: impl Into<String>,
        overrides: &[IdOverride],
    ) -> ProtocolResult<VersionTable> {
        for o in overrides {
            let known = self
                .by_id
                .values()
                .any(|d| d.state == o.state && d.direction == o.direction && d.name == o.packet);
            if !known {
                return Err(ProtocolError::UnknownPacketName {
                    name: o.packet.clone(),
                    version: self.protocol,
                });
            }
        }

        let descriptors = self
            .by_id
            .values()
            .map(|d| {
                let moved = overrides.iter().find(|o| {
                    o.state == d.state && o.direction == d.direction && o.packet == d.name
                });
                match moved {
                    Some(o) => d.with_id(o.id),
                    None => d.clone(),
                }
            })
            .collect();

        VersionTableBuilder {
            protocol,
            name: name.into(),
            descriptors,
        }
        .build()
    }
}

impl std::fmt::Debug for VersionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionTable")
            .field("protocol", &self.protocol)
            .field("name", &self.name)
            .field("packets", &self.by_id.len())
            .finish()
    }
}

pub struct VersionTableBuilder {
    protocol: i32,
    name: String,
    descriptors: Vec<PacketDescriptor>,
}

impl VersionTableBuilder {
    pub fn register<P: PacketDef>(mut self, id: i32) -> Self {
        self.descriptors.push(PacketDescriptor::of::<P>(id));
        self
    }

    /// Fails if two packets share an id within a (state, direction) or a
    /// packet type is registered twice.
    pub fn build(self) -> ProtocolResult<VersionTable> {
        let mut by_id = HashMap::with_capacity(self.descriptors.len());
        let mut by_type = HashMap::with_capacity(self.descriptors.len());
        for descriptor in self.descriptors {
            if by_type.insert(descriptor.type_id(), descriptor.id).is_some() {
                return Err(ProtocolError::DuplicatePacketType {
                    name: descriptor.name,
                    version: self.protocol,
                });
            }
            let key = (descriptor.state, descriptor.direction, descriptor.id);
            if by_id.contains_key(&key) {
                return Err(ProtocolError::DuplicatePacketId {
                    version: self.protocol,
                    state: descriptor.state,
                    direction: descriptor.direction,
                    id: descriptor.id,
                });
            }
            by_id.insert(key, descriptor);
        }
        Ok(VersionTable {
            protocol: self.protocol,
            name: self.name,
            by_id,
            by_type,
        })
    }
}

/// Moves one packet to a different id in a derived table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdOverride {
    pub state: ConnectionState,
    pub direction: PacketDirection,
    /// Logical packet name, e.g. "keep_alive".
    pub packet: String,
    pub id: i32,
}

/// A protocol version described as data: an existing table plus id moves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VersionAlias {
    pub protocol: i32,
    pub name: String,
    pub base: i32,
    #[serde(default)]
    pub overrides: Vec<IdOverride>,
}

/// All known protocol versions. Built once at startup, read-only afterwards.
#[derive(Debug, Default)]
pub struct PacketRegistry {
    tables: BTreeMap<i32, Arc<VersionTable>>,
}

impl PacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table, replacing any previous table for the same protocol.
    pub fn register(&mut self, table: VersionTable) {
        debug!(
            "Registered protocol {} ({}) with {} packets",
            table.protocol,
            table.name,
            table.by_id.len()
        );
        self.tables.insert(table.protocol, Arc::new(table));
    }

    pub fn alias(&mut self, alias: &VersionAlias) -> ProtocolResult<()> {
        let base = self.table(alias.base)?;
        let table = base.derive(alias.protocol, alias.name.clone(), &alias.overrides)?;
        self.register(table);
        Ok(())
    }

    pub fn apply_aliases(&mut self, aliases: &[VersionAlias]) -> ProtocolResult<()> {
        aliases.iter().try_for_each(|alias| self.alias(alias))
    }

    pub fn table(&self, version: i32) -> ProtocolResult<Arc<VersionTable>> {
        self.tables
            .get(&version)
            .cloned()
            .ok_or(ProtocolError::UnsupportedVersion(version))
    }

    pub fn supports(&self, version: i32) -> bool {
        self.tables.contains_key(&version)
    }

    pub fn versions(&self) -> impl Iterator<Item = i32> + '_ {
        self.tables.keys().copied()
    }

    pub fn latest(&self) -> Option<Arc<VersionTable>> {
        self.tables.values().next_back().cloned()
    }

    pub fn resolve(
        &self,
        state: ConnectionState,
        direction: PacketDirection,
        id: i32,
        version: i32,
    ) -> ProtocolResult<&PacketDescriptor> {
        let table = self
            .tables
            .get(&version)
            .ok_or(ProtocolError::UnsupportedVersion(version))?;
        table
            .descriptor(state, direction, id)
            .ok_or_else(|| self.missing(state, direction, id, version))
    }

    /// The error for an id absent from `version`: `NotInVersion` when some
    /// other version defines it, `UnknownPacket` otherwise.
    pub fn missing(
        &self,
        state: ConnectionState,
        direction: PacketDirection,
        id: i32,
        version: i32,
    ) -> ProtocolError {
        let elsewhere = self
            .tables
            .values()
            .any(|t| t.protocol != version && t.descriptor(state, direction, id).is_some());
        if elsewhere {
            ProtocolError::NotInVersion {
                version,
                state,
                direction,
                id,
            }
        } else {
            ProtocolError::UnknownPacket {
                version,
                state,
                direction,
                id,
            }
        }
    }

    pub fn packet_id_for<P: PacketDef>(&self, version: i32) -> ProtocolResult<i32> {
        self.tables
            .get(&version)
            .ok_or(ProtocolError::UnsupportedVersion(version))?
            .id_of::<P>()
            .ok_or(ProtocolError::PacketNotInVersion {
                name: P::NAME,
                version,
            })
    }
}
