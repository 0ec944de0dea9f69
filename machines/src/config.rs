//! Machine configuration, read from TOML.
//!
//! ```toml
//! cpu = "HD6309"
//! gime = "1986"
//! tv = "pal"
//! ram_kb = 128
//! frame_skip = 2
//! div_overflow = "abort"
//! ```
//!
//! Every key is optional.

use std::path::Path;

use coco_core::cpu::DivOverflowMode;
use coco_core::device::gime::{Revision, TvStandard};
use serde::Deserialize;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    /// A key parsed but holds a value the machine cannot use.
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Parse(e) => write!(f, "config parse error: {e}"),
            Self::Invalid { field, reason } => write!(f, "config '{field}': {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Invalid { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Parse(e)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub enum GimeRevision {
    #[serde(rename = "1986")]
    Early,
    #[default]
    #[serde(rename = "1987")]
    Late,
}

impl From<GimeRevision> for Revision {
    fn from(r: GimeRevision) -> Self {
        match r {
            GimeRevision::Early => Revision::Gime1986,
            GimeRevision::Late => Revision::Gime1987,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Tv {
    #[default]
    Ntsc,
    Pal,
}

impl From<Tv> for TvStandard {
    fn from(tv: Tv) -> Self {
        match tv {
            Tv::Ntsc => TvStandard::Ntsc60,
            Tv::Pal => TvStandard::Pal50,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DivOverflow {
    #[default]
    Truncate,
    Abort,
}

impl From<DivOverflow> for DivOverflowMode {
    fn from(d: DivOverflow) -> Self {
        match d {
            DivOverflow::Truncate => DivOverflowMode::Truncate,
            DivOverflow::Abort => DivOverflowMode::Abort,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct MachineConfig {
    /// CPU part name, resolved through the part registry.
    pub cpu: String,
    pub gime: GimeRevision,
    pub tv: Tv,
    /// Populated dynamic RAM: 64 or 128.
    pub ram_kb: u32,
    /// Render one field in this many.
    pub frame_skip: u32,
    pub div_overflow: DivOverflow,
    /// Accept ROM images whose CRC32 does not match.
    pub skip_checksums: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            cpu: "MC6809".to_string(),
            gime: GimeRevision::default(),
            tv: Tv::default(),
            ram_kb: 64,
            frame_skip: 1,
            div_overflow: DivOverflow::default(),
            skip_checksums: false,
        }
    }
}

impl MachineConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.ram_kb, 64 | 128) {
            return Err(ConfigError::Invalid {
                field: "ram_kb",
                reason: format!("{} KB is not fitted, use 64 or 128", self.ram_kb),
            });
        }
        if self.frame_skip == 0 {
            return Err(ConfigError::Invalid {
                field: "frame_skip",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// 64 KB banks of RAM to allocate.
    ///
    /// The second bank is selected by the SAM's bank bit, which only the 4K
    /// and 16K organisations drive. With the M bits set for 64K chips every
    /// access lands in bank 0 and the extra 64 KB stays idle.
    pub fn ram_banks(&self) -> u8 {
        (self.ram_kb / 64) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = MachineConfig::from_toml_str("").unwrap();
        assert_eq!(config, MachineConfig::default());
        assert_eq!(config.ram_banks(), 1);
    }

    #[test]
    fn every_key_parses() {
        let config = MachineConfig::from_toml_str(
            r#"
            cpu = "HD6309"
            gime = "1986"
            tv = "pal"
            ram_kb = 128
            frame_skip = 3
            div_overflow = "abort"
            skip_checksums = true
            "#,
        )
        .unwrap();
        assert_eq!(config.cpu, "HD6309");
        assert_eq!(Revision::from(config.gime), Revision::Gime1986);
        assert_eq!(TvStandard::from(config.tv), TvStandard::Pal50);
        assert_eq!(config.ram_banks(), 2);
        assert_eq!(config.frame_skip, 3);
        assert_eq!(DivOverflowMode::from(config.div_overflow), DivOverflowMode::Abort);
        assert!(config.skip_checksums);
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            MachineConfig::from_toml_str("ram_kb = 32"),
            Err(ConfigError::Invalid { field: "ram_kb", .. })
        ));
        assert!(matches!(
            MachineConfig::from_toml_str("frame_skip = 0"),
            Err(ConfigError::Invalid { field: "frame_skip", .. })
        ));
        assert!(matches!(
            MachineConfig::from_toml_str("tv = \"secam\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            MachineConfig::from_toml_str("turbo = true"),
            Err(ConfigError::Parse(_))
        ));
    }
}
