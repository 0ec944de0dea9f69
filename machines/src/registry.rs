//! Part and machine registry.
//!
//! Parts and machines self-register via [`inventory::submit!`] under a
//! string name. The frontend and configuration files refer to them only by
//! that name; there is no central list.

use coco_core::core::machine::Machine;
use coco_core::core::{Component, PartError};
use coco_core::cpu::{M6809, Model};
use coco_core::device::gime::{Revision, TvStandard};
use coco_core::device::{Gime, Ram, Sam};

use crate::config::{ConfigError, MachineConfig};
use crate::rom_loader::{RomLoadError, RomSet};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Anything that can stop a machine from being assembled.
#[derive(Debug)]
pub enum MachineError {
    Part(PartError),
    Rom(RomLoadError),
    Config(ConfigError),
}

impl std::fmt::Display for MachineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Part(e) => e.fmt(f),
            Self::Rom(e) => e.fmt(f),
            Self::Config(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for MachineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Part(e) => Some(e),
            Self::Rom(e) => Some(e),
            Self::Config(e) => Some(e),
        }
    }
}

impl From<PartError> for MachineError {
    fn from(e: PartError) -> Self {
        Self::Part(e)
    }
}

impl From<RomLoadError> for MachineError {
    fn from(e: RomLoadError) -> Self {
        Self::Rom(e)
    }
}

impl From<ConfigError> for MachineError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Machines
// ---------------------------------------------------------------------------

pub type MachineFactory = fn(&MachineConfig, &RomSet) -> Result<Box<dyn Machine>, MachineError>;

/// A complete machine the frontend can run.
pub struct MachineEntry {
    /// CLI name (e.g. "coco3").
    pub name: &'static str,
    /// File name a single ROM image is stored under.
    pub rom_name: &'static str,
    pub create: MachineFactory,
}

impl MachineEntry {
    pub const fn new(name: &'static str, rom_name: &'static str, create: MachineFactory) -> Self {
        Self {
            name,
            rom_name,
            create,
        }
    }
}

inventory::collect!(MachineEntry);

/// Every registered machine, sorted by name.
pub fn all() -> Vec<&'static MachineEntry> {
    let mut entries: Vec<_> = inventory::iter::<MachineEntry>.into_iter().collect();
    entries.sort_by_key(|e| e.name);
    entries
}

pub fn find(name: &str) -> Option<&'static MachineEntry> {
    inventory::iter::<MachineEntry>
        .into_iter()
        .find(|e| e.name == name)
}

/// Look up `name` and assemble it.
pub fn create_machine(
    name: &str,
    config: &MachineConfig,
    roms: &RomSet,
) -> Result<Box<dyn Machine>, MachineError> {
    let entry = find(name).ok_or_else(|| PartError::UnknownPart(name.to_string()))?;
    (entry.create)(config, roms)
}

// ---------------------------------------------------------------------------
// Parts
// ---------------------------------------------------------------------------

/// A CPU the machine can be fitted with.
pub struct CpuEntry {
    pub name: &'static str,
    pub model: Model,
}

inventory::collect!(CpuEntry);

/// Any other part, created in its power-on state.
pub struct PartEntry {
    pub name: &'static str,
    pub create: fn() -> Box<dyn Component>,
}

inventory::collect!(PartEntry);

inventory::submit! { CpuEntry { name: "MC6809", model: Model::Mc6809 } }
inventory::submit! { CpuEntry { name: "HD6309", model: Model::Hd6309 } }

fn new_sam() -> Box<dyn Component> {
    Box::new(Sam::new())
}

fn new_ram() -> Box<dyn Component> {
    Box::new(Ram::new(1))
}

fn new_gime_1986() -> Box<dyn Component> {
    Box::new(Gime::new(Revision::Gime1986, TvStandard::Ntsc60))
}

fn new_gime_1987() -> Box<dyn Component> {
    Box::new(Gime::new(Revision::Gime1987, TvStandard::Ntsc60))
}

inventory::submit! { PartEntry { name: "SAM", create: new_sam } }
inventory::submit! { PartEntry { name: "RAM", create: new_ram } }
inventory::submit! { PartEntry { name: "GIME-1986", create: new_gime_1986 } }
inventory::submit! { PartEntry { name: "GIME-1987", create: new_gime_1987 } }

/// Create and finish the CPU registered as `name`.
pub fn create_cpu(name: &str) -> Result<M6809, PartError> {
    let entry = inventory::iter::<CpuEntry>
        .into_iter()
        .find(|e| e.name == name)
        .ok_or_else(|| PartError::UnknownPart(name.to_string()))?;
    let mut cpu = M6809::with_model(entry.model);
    cpu.finish()?;
    Ok(cpu)
}

/// Create and finish any registered part, CPUs included.
pub fn create_part(name: &str) -> Result<Box<dyn Component>, PartError> {
    if let Ok(cpu) = create_cpu(name) {
        return Ok(Box::new(cpu));
    }
    let entry = inventory::iter::<PartEntry>
        .into_iter()
        .find(|e| e.name == name)
        .ok_or_else(|| PartError::UnknownPart(name.to_string()))?;
    let mut part = (entry.create)();
    part.finish()?;
    Ok(part)
}

/// Names of every registered part, sorted.
pub fn part_names() -> Vec<&'static str> {
    let mut names: Vec<_> = inventory::iter::<CpuEntry>
        .into_iter()
        .map(|e| e.name)
        .chain(inventory::iter::<PartEntry>.into_iter().map(|e| e.name))
        .collect();
    names.sort_unstable();
    names
}
