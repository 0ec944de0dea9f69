//! Interrupt line aggregation.
//!
//! Peripherals push their output level whenever it changes; the aggregator
//! keeps one bit per source and ORs the sources wired to each CPU line. The
//! published [`InterruptState`] is what the CPU latches after its next cycle.

use crate::core::InterruptState;

/// CPU input a source is wired to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Line {
    Nmi,
    Firq,
    Irq,
    Halt,
}

/// A named interrupt source. The index is its bit in the level masks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Source {
    pub index: u8,
    pub line: Line,
}

impl Source {
    pub const fn new(index: u8, line: Line) -> Self {
        Self { index, line }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterruptAggregator {
    nmi: u32,
    firq: u32,
    irq: u32,
    halt: u32,
}

impl InterruptAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive `source` to `level`. Takes effect immediately.
    pub fn set(&mut self, source: Source, level: bool) {
        debug_assert!(source.index < 32);
        let bit = 1u32 << source.index;
        let mask = match source.line {
            Line::Nmi => &mut self.nmi,
            Line::Firq => &mut self.firq,
            Line::Irq => &mut self.irq,
            Line::Halt => &mut self.halt,
        };
        if level {
            *mask |= bit;
        } else {
            *mask &= !bit;
        }
    }

    pub fn level(&self, source: Source) -> bool {
        let mask = match source.line {
            Line::Nmi => self.nmi,
            Line::Firq => self.firq,
            Line::Irq => self.irq,
            Line::Halt => self.halt,
        };
        mask & (1 << source.index) != 0
    }

    #[inline]
    pub fn state(&self) -> InterruptState {
        InterruptState {
            nmi: self.nmi != 0,
            firq: self.firq != 0,
            irq: self.irq != 0,
            halt: self.halt != 0,
        }
    }

    /// Release every line.
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
