//! CPU state snapshot types and traits

use crate::cpu::m6809::{DivOverflowMode, ExecState, Model};

/// Trait for CPU types that can provide and accept state snapshots
pub trait CpuStateTrait {
    type Snapshot;
    fn snapshot(&self) -> Self::Snapshot;
    fn restore(&mut self, snapshot: &Self::Snapshot);
}

/// MC6809 / HD6309 register file and execution state
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct M6809State {
    pub model: Model,
    pub a: u8,   // Accumulator A
    pub b: u8,   // Accumulator B
    pub e: u8,   // Accumulator E (6309)
    pub f: u8,   // Accumulator F (6309)
    pub dp: u8,  // Direct Page register
    pub x: u16,  // Index register X
    pub y: u16,  // Index register Y
    pub u: u16,  // User stack pointer
    pub s: u16,  // Hardware stack pointer
    pub pc: u16, // Program counter
    pub v: u16,  // Transfer value register (6309)
    pub cc: u8,  // Condition codes
    pub md: u8,  // Mode register (6309)
    pub state: ExecState,
    pub nmi_armed: bool,
    pub nmi_pending: bool,
    /// Interrupt inputs as last sampled. NMI is edge triggered against
    /// `nmi_line`.
    pub nmi_line: bool,
    pub firq_line: bool,
    pub irq_line: bool,
    pub halt_line: bool,
    pub div_overflow: DivOverflowMode,
}
