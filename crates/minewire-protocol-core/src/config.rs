use crate::frame::{MAX_FRAME_LENGTH, MAX_UNCOMPRESSED_LENGTH};
use crate::registry::VersionAlias;
use serde::Deserialize;
use std::path::Path;

/// What a session does with a frame whose id has no descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPacketPolicy {
    /// Return the error; the connection should be closed.
    #[default]
    Fail,
    /// Drop the frame and keep going.
    Skip,
    /// Surface it as an [`UnknownPacket`](crate::packet::UnknownPacket).
    Passthrough,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: usize,
    #[serde(default = "default_max_uncompressed_length")]
    pub max_uncompressed_length: usize,
    #[serde(default = "default_compression_level")]
    pub compression_level: u32,
    #[serde(default)]
    pub unknown_packets: UnknownPacketPolicy,
    #[serde(default = "default_reject_trailing_bytes")]
    pub reject_trailing_bytes: bool,
    #[serde(default)]
    pub versions: Vec<VersionAlias>,
}

fn default_max_frame_length() -> usize {
    MAX_FRAME_LENGTH
}

fn default_max_uncompressed_length() -> usize {
    MAX_UNCOMPRESSED_LENGTH
}

fn default_compression_level() -> u32 {
    6
}

fn default_reject_trailing_bytes() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_frame_length: default_max_frame_length(),
            max_uncompressed_length: default_max_uncompressed_length(),
            compression_level: default_compression_level(),
            unknown_packets: UnknownPacketPolicy::default(),
            reject_trailing_bytes: default_reject_trailing_bytes(),
            versions: Vec::new(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::parse(&contents)
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: PipelineConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.compression_level > 9 {
            anyhow::bail!(
                "compression_level must be between 0 and 9, got {}",
                self.compression_level
            );
        }
        if self.max_frame_length > MAX_FRAME_LENGTH {
            anyhow::bail!(
                "max_frame_length {} does not fit a 3-byte length prefix (max {})",
                self.max_frame_length,
                MAX_FRAME_LENGTH
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ConnectionState, PacketDirection};
    use std::io::Write;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load(&dir.path().join("minewire.toml")).unwrap();
        assert_eq!(config.max_frame_length, 2_097_151);
        assert_eq!(config.max_uncompressed_length, 8_388_608);
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.unknown_packets, UnknownPacketPolicy::Fail);
        assert!(config.reject_trailing_bytes);
        assert!(config.versions.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
max_frame_length = 65536
unknown_packets = "skip"

[[versions]]
protocol = 760
name = "1.19.2"
base = 759

[[versions.overrides]]
state = "play"
direction = "clientbound"
packet = "keep_alive"
id = 0x20
"#
        )
        .unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_frame_length, 65536);
        assert_eq!(config.compression_level, 6);
        assert_eq!(config.unknown_packets, UnknownPacketPolicy::Skip);
        assert_eq!(config.versions.len(), 1);
        let alias = &config.versions[0];
        assert_eq!(alias.base, 759);
        assert_eq!(alias.overrides[0].state, ConnectionState::Play);
        assert_eq!(alias.overrides[0].direction, PacketDirection::Clientbound);
        assert_eq!(alias.overrides[0].id, 0x20);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(PipelineConfig::parse("compression_level = 12").is_err());
        assert!(PipelineConfig::parse("max_frame_length = 4000000").is_err());
        assert!(PipelineConfig::parse("unknown_packets = \"explode\"").is_err());
        assert!(PipelineConfig::parse("unknown_packets = \"passthrough\"").is_ok());
    }
}
