//! Synchronous Address Multiplexer (MC6883 / 74LS783) address translation.
//!
//! The SAM decodes every CPU address into a chip select plus a dynamic RAM
//! row/column pair, and decides how many master ticks the cycle takes. Its
//! 16-bit control word is written one bit at a time through $FFC0-$FFDF.

use crate::core::Component;

/// Chip select produced for an address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Select {
    Ram,
    /// $8000-$9FFF.
    Rom0,
    /// $A000-$BFFF and the vectors at $FFE0-$FFFF.
    Rom1,
    /// $C000-$FEFF (cartridge).
    Rom2,
    /// $FF00-$FF1F.
    Io0,
    /// $FF20-$FF3F.
    Io1,
    /// $FF40-$FF5F.
    Io2,
    /// $FF60-$FFDF, including the SAM's own control bits.
    Sam,
}

/// Dynamic RAM location for a translated address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RamAddress {
    pub bank: u8,
    pub row: u8,
    pub col: u8,
}

/// Result of decoding one CPU cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Translation {
    pub select: Select,
    /// Meaningful when `select` is [`Select::Ram`].
    pub ram: RamAddress,
    /// Master ticks this cycle occupies.
    pub ncycles: u32,
}

/// RAM chip organisation selected by the M bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemorySize {
    K4,
    K16,
    K64,
}

// Control word layout
const V_MASK: u16 = 0x0007;
const F_SHIFT: u16 = 3;
const F_MASK: u16 = 0x03F8;
const P1: u16 = 0x0400;
const R0: u16 = 0x0800;
const R1: u16 = 0x1000;
const M_SHIFT: u16 = 13;
const M_MASK: u16 = 0x6000;
const TY: u16 = 0x8000;

/// First and last control-bit addresses.
pub const CONTROL_BASE: u16 = 0xFFC0;
pub const CONTROL_END: u16 = 0xFFDF;

const SLOW_TO_SLOW: u32 = 16;
const SLOW_TO_FAST: u32 = 15;
const FAST_TO_SLOW: u32 = 17;
const FAST_TO_SLOW_REINTERLEAVE: u32 = 25;
const FAST_TO_FAST: u32 = 8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SamState {
    pub control: u16,
    pub running_fast: bool,
    pub extend_slow: bool,
}

#[derive(Debug, Default)]
pub struct Sam {
    control: u16,
    /// Previous cycle ran at the fast rate.
    running_fast: bool,
    /// Fast cycles have drifted half a slot out of step with video; the next
    /// slow cycle has to stretch to re-interleave.
    extend_slow: bool,
}

impl Sam {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn control(&self) -> u16 {
        self.control
    }

    /// Replace the control word. Applies from the next `translate`.
    pub fn set_register(&mut self, value: u16) {
        self.control = value;
        self.check_memory_size();
    }

    /// Handle a write to $FFC0-$FFDF: even addresses clear a bit, odd
    /// addresses set it. Returns true when a bit the display depends on
    /// changed: V, F, or the M bits that steer [`Sam::ram_address`].
    pub fn write_control(&mut self, addr: u16) -> bool {
        debug_assert!((CONTROL_BASE..=CONTROL_END).contains(&addr));
        let offset = addr.wrapping_sub(CONTROL_BASE) & 0x1F;
        let bit = 1u16 << (offset >> 1);
        let old = self.control;
        if offset & 1 != 0 {
            self.control |= bit;
        } else {
            self.control &= !bit;
        }
        if bit & M_MASK != 0 && old != self.control {
            self.check_memory_size();
        }
        (old ^ self.control) & (V_MASK | F_MASK | M_MASK) != 0
    }

    fn check_memory_size(&self) {
        if (self.control & M_MASK) >> M_SHIFT == 3 {
            log::warn!("SAM memory size M=3 is reserved, using 64K");
        }
    }

    /// Video display mode, V0-V2.
    pub fn v(&self) -> u8 {
        (self.control & V_MASK) as u8
    }

    /// Display offset, F0-F6, in units of 512 bytes.
    pub fn f(&self) -> u8 {
        ((self.control & F_MASK) >> F_SHIFT) as u8
    }

    pub fn page1(&self) -> bool {
        self.control & P1 != 0
    }

    /// MPU rate, R0-R1.
    pub fn rate(&self) -> u8 {
        ((self.control >> 11) & 0x03) as u8
    }

    pub fn memory_size(&self) -> MemorySize {
        match (self.control & M_MASK) >> M_SHIFT {
            0 => MemorySize::K4,
            1 => MemorySize::K16,
            _ => MemorySize::K64,
        }
    }

    /// Map type 1 puts RAM under the whole of $0000-$FEFF.
    pub fn all_ram(&self) -> bool {
        self.control & TY != 0
    }

    /// Decode one CPU cycle.
    pub fn translate(&mut self, address: u16, _is_read: bool) -> Translation {
        let select = self.select(address);

        let ram = if select == Select::Ram {
            let mut linear = address;
            if !self.all_ram() && self.page1() && self.memory_size() == MemorySize::K64 {
                linear |= 0x8000;
            }
            self.ram_address(linear)
        } else {
            RamAddress::default()
        };

        // RAM and the first PIA always follow the slow video-interleaved slot
        // unless R1 selects the fully fast rate.
        let slow_region = select == Select::Ram || select == Select::Io0;
        let fast = if self.control & R1 != 0 {
            true
        } else if self.control & R0 != 0 {
            !slow_region
        } else {
            false
        };

        Translation {
            select,
            ram,
            ncycles: self.cycle_cost(fast),
        }
    }

    fn select(&self, address: u16) -> Select {
        match address {
            0x0000..=0x7FFF => Select::Ram,
            0x8000..=0xFEFF if self.all_ram() => Select::Ram,
            0x8000..=0x9FFF => Select::Rom0,
            0xA000..=0xBFFF => Select::Rom1,
            0xC000..=0xFEFF => Select::Rom2,
            0xFF00..=0xFF1F => Select::Io0,
            0xFF20..=0xFF3F => Select::Io1,
            0xFF40..=0xFF5F => Select::Io2,
            0xFF60..=0xFFDF => Select::Sam,
            _ => Select::Rom1,
        }
    }

    /// Row/column for a RAM address under the current chip organisation.
    /// Video fetches go through here too.
    ///
    /// A second bank is only reached in the 4K and 16K organisations; with
    /// 64K chips the bank select is unused and every address lands in bank 0.
    pub fn ram_address(&self, linear: u16) -> RamAddress {
        match self.memory_size() {
            MemorySize::K4 => RamAddress {
                bank: ((linear >> 12) & 0x01) as u8,
                row: (linear & 0x3F) as u8,
                col: ((linear >> 6) & 0x3F) as u8,
            },
            MemorySize::K16 => RamAddress {
                bank: ((linear >> 14) & 0x01) as u8,
                row: (linear & 0x7F) as u8,
                col: ((linear >> 7) & 0x7F) as u8,
            },
            MemorySize::K64 => RamAddress {
                bank: 0,
                row: (linear & 0xFF) as u8,
                col: (linear >> 8) as u8,
            },
        }
    }

    fn cycle_cost(&mut self, fast: bool) -> u32 {
        match (self.running_fast, fast) {
            (false, false) => SLOW_TO_SLOW,
            (false, true) => {
                self.running_fast = true;
                SLOW_TO_FAST
            }
            (true, false) => {
                self.running_fast = false;
                if self.extend_slow {
                    self.extend_slow = false;
                    FAST_TO_SLOW_REINTERLEAVE
                } else {
                    FAST_TO_SLOW
                }
            }
            (true, true) => {
                self.extend_slow = !self.extend_slow;
                FAST_TO_FAST
            }
        }
    }

    pub fn snapshot(&self) -> SamState {
        SamState {
            control: self.control,
            running_fast: self.running_fast,
            extend_slow: self.extend_slow,
        }
    }

    pub fn restore(&mut self, state: &SamState) {
        self.control = state.control;
        self.running_fast = state.running_fast;
        self.extend_slow = state.extend_slow;
    }
}

impl Component for Sam {
    fn name(&self) -> &'static str {
        "SAM"
    }

    fn reset(&mut self) {
        self.control = 0;
        self.running_fast = false;
        self.extend_slow = false;
    }
}
