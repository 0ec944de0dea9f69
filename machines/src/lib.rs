pub mod coco3;
pub mod config;
pub mod registry;
pub mod rom_loader;

pub use coco3::{Board, CoCo3, CoCo3State};
pub use config::{ConfigError, MachineConfig};
pub use registry::MachineError;
