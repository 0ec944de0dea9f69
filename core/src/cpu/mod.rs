use crate::core::{Bus, Component};

/// Interface shared by the 6809-family cores.
pub trait Cpu: Component + CpuStateTrait {
    /// Execute until the bus asks for control back.
    fn run<B: Bus + ?Sized>(&mut self, bus: &mut B);

    /// Perform a single state transition: one instruction, one interrupt
    /// entry, one byte of a block transfer or one wait cycle.
    fn step<B: Bus + ?Sized>(&mut self, bus: &mut B);

    /// True while waiting in CWAI, SYNC or a bus halt.
    fn is_sleeping(&self) -> bool;
}

// Re-export state types
pub mod state;
pub use state::{CpuStateTrait, M6809State};

pub mod m6809;
pub use m6809::{CcFlag, DivOverflowMode, ExecState, M6809, Model};
