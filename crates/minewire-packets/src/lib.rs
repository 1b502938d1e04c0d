//! Concrete packets and per-version id tables.

pub mod handshaking;
pub mod login;
pub mod play;
pub mod status;
pub mod v1_19;
pub mod versions;

pub use versions::{LATEST_PROTOCOL, PROTOCOL_1_18_1, PROTOCOL_1_18_2, PROTOCOL_1_19};

use minewire_protocol_core::{PacketRegistry, ProtocolResult, VersionAlias};
use std::sync::{Arc, OnceLock};
use tracing::error;

/// Registry with every built-in version, plus `aliases` (usually from
/// [`PipelineConfig::versions`](minewire_protocol_core::PipelineConfig)).
pub fn build_registry(aliases: &[VersionAlias]) -> ProtocolResult<PacketRegistry> {
    let mut registry = PacketRegistry::new();
    registry.register(versions::v1_18_1()?);
    registry.register(versions::v1_19()?);
    registry.alias(&versions::v1_18_2_alias())?;
    registry.apply_aliases(aliases)?;
    Ok(registry)
}

static REGISTRY: OnceLock<Arc<PacketRegistry>> = OnceLock::new();

/// The process-wide registry of built-in versions, built on first use.
pub fn registry() -> Arc<PacketRegistry> {
    REGISTRY
        .get_or_init(|| {
            let registry = build_registry(&[]).unwrap_or_else(|e| {
                // Unreachable unless a built-in table has an id clash.
                error!("Built-in packet tables are inconsistent: {}", e);
                PacketRegistry::new()
            });
            Arc::new(registry)
        })
        .clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::play::{ChatMessageClientbound, KeepAliveClientbound, KeepAliveServerbound};
    use minewire_protocol_core::{ConnectionState, PacketDirection, ProtocolError};

    #[test]
    fn test_builtin_tables_build() {
        assert!(versions::v1_18_1().is_ok());
        assert!(versions::v1_19().is_ok());
        let registry = registry();
        assert_eq!(registry.versions().collect::<Vec<_>>(), vec![757, 758, 759]);
        assert_eq!(registry.latest().unwrap().protocol(), LATEST_PROTOCOL);
        assert!(Arc::ptr_eq(&registry, &super::registry()));
    }

    #[test]
    fn test_keep_alive_ids_per_version() {
        let registry = registry();
        assert_eq!(registry.packet_id_for::<KeepAliveClientbound>(757).unwrap(), 0x21);
        assert_eq!(registry.packet_id_for::<KeepAliveClientbound>(758).unwrap(), 0x21);
        assert_eq!(registry.packet_id_for::<KeepAliveClientbound>(759).unwrap(), 0x1E);
        assert_eq!(registry.packet_id_for::<KeepAliveServerbound>(757).unwrap(), 0x0F);
        assert_eq!(registry.packet_id_for::<KeepAliveServerbound>(759).unwrap(), 0x11);

        let descriptor = registry
            .resolve(ConnectionState::Play, PacketDirection::Clientbound, 0x1E, 759)
            .unwrap();
        assert_eq!(descriptor.name, "keep_alive");
    }

    #[test]
    fn test_entity_packet_ids_per_version() {
        use crate::play::{EntityMetadata, EntityProperties};
        let registry = registry();
        assert_eq!(registry.packet_id_for::<EntityMetadata>(758).unwrap(), 0x4D);
        assert_eq!(registry.packet_id_for::<EntityMetadata>(759).unwrap(), 0x50);
        assert_eq!(registry.packet_id_for::<EntityProperties>(757).unwrap(), 0x64);
        assert_eq!(registry.packet_id_for::<EntityProperties>(759).unwrap(), 0x68);
    }

    #[test]
    fn test_chat_dropped_in_1_19() {
        let registry = registry();
        assert!(matches!(
            registry.packet_id_for::<ChatMessageClientbound>(759),
            Err(ProtocolError::PacketNotInVersion {
                name: "chat_message",
                version: 759
            })
        ));
        assert!(matches!(
            registry.resolve(ConnectionState::Play, PacketDirection::Clientbound, 0x0F, 759),
            Err(ProtocolError::NotInVersion { id: 0x0F, .. })
        ));
    }
}
