use super::{CcFlag, M6809, Mode};
use crate::core::Bus;

mod binary;
mod shift;
mod unary;
mod word;

/// 8-bit accumulators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Acc8 {
    A,
    B,
    E,
    F,
}

/// 16-bit registers reachable by the word ALU and load/store groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Wide {
    D,
    W,
    X,
    Y,
    U,
    S,
}

impl M6809 {
    #[inline]
    pub(crate) fn acc(&self, reg: Acc8) -> u8 {
        match reg {
            Acc8::A => self.a,
            Acc8::B => self.b,
            Acc8::E => self.e,
            Acc8::F => self.f,
        }
    }

    #[inline]
    pub(crate) fn set_acc(&mut self, reg: Acc8, val: u8) {
        match reg {
            Acc8::A => self.a = val,
            Acc8::B => self.b = val,
            Acc8::E => self.e = val,
            Acc8::F => self.f = val,
        }
    }

    #[inline]
    pub(crate) fn wide(&self, reg: Wide) -> u16 {
        match reg {
            Wide::D => self.get_d(),
            Wide::W => self.get_w(),
            Wide::X => self.x,
            Wide::Y => self.y,
            Wide::U => self.u,
            Wide::S => self.s,
        }
    }

    #[inline]
    pub(crate) fn set_wide(&mut self, reg: Wide, val: u16) {
        match reg {
            Wide::D => self.set_d(val),
            Wide::W => self.set_w(val),
            Wide::X => self.x = val,
            Wide::Y => self.y = val,
            Wide::U => self.u = val,
            Wide::S => self.set_s(val),
        }
    }

    /// Helper to set N, Z, V (cleared) flags for logical operations
    #[inline]
    pub(crate) fn set_flags_logical(&mut self, result: u8) {
        self.set_flag(CcFlag::N, result & 0x80 != 0);
        self.set_flag(CcFlag::Z, result == 0);
        self.set_flag(CcFlag::V, false);
    }

    /// Helper to set N, Z, V, C flags for arithmetic operations
    #[inline]
    pub(crate) fn set_flags_arithmetic(&mut self, result: u8, overflow: bool, carry: bool) {
        self.set_flag(CcFlag::N, result & 0x80 != 0);
        self.set_flag(CcFlag::Z, result == 0);
        self.set_flag(CcFlag::V, overflow);
        self.set_flag(CcFlag::C, carry);
    }

    /// Helper to set N, Z, V, C flags for 16-bit arithmetic
    #[inline]
    pub(crate) fn set_flags_arithmetic16(&mut self, result: u16, overflow: bool, carry: bool) {
        self.set_flag(CcFlag::N, result & 0x8000 != 0);
        self.set_flag(CcFlag::Z, result == 0);
        self.set_flag(CcFlag::V, overflow);
        self.set_flag(CcFlag::C, carry);
    }

    /// Helper to set N, Z, V (cleared) flags for 16-bit logical operations
    #[inline]
    pub(crate) fn set_flags_logical16(&mut self, result: u16) {
        self.set_flag(CcFlag::N, result & 0x8000 != 0);
        self.set_flag(CcFlag::Z, result == 0);
        self.set_flag(CcFlag::V, false);
    }

    /// ORCC immediate (0x1A): OR immediate value into CC register.
    /// 3 cycles, 2 in native mode.
    pub(crate) fn op_orcc<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let mask = self.fetch8(bus);
        self.nvma_emu(bus);
        self.cc |= mask;
    }

    /// ANDCC immediate (0x1C): AND immediate value into CC register.
    /// Used to clear specific CC bits (e.g., ANDCC #$FE clears C flag).
    /// 3 cycles in both modes.
    pub(crate) fn op_andcc<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let mask = self.fetch8(bus);
        self.nvma(bus);
        self.cc &= mask;
    }

    /// Undocumented 6809 0x38: ANDCC with an extra dead cycle.
    pub(crate) fn op_andcc_alias<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let mask = self.fetch8(bus);
        self.nvma_n(bus, 2);
        self.cc &= mask;
    }

    /// Opcodes 0x80-0xFF without prefix.
    pub(crate) fn op_alu_page0<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let mode = Mode::of(opcode);
        let nibble = opcode & 0x0F;
        if opcode < 0xC0 {
            match nibble {
                0x3 => self.op_sub16(Wide::D, mode, bus),
                0xC => self.op_cmp16(Wide::X, mode, bus),
                0xD if mode == Mode::Immediate => self.op_bsr(bus),
                0xD => self.op_jsr(mode, bus),
                0xE => self.op_ld16(Wide::X, mode, bus),
                0xF => self.op_st16(Wide::X, mode, bus),
                _ => self.op_acc8(nibble, Acc8::A, mode, bus),
            }
        } else {
            match nibble {
                0x3 => self.op_add16(Wide::D, mode, bus),
                0xC => self.op_ld16(Wide::D, mode, bus),
                0xD if mode == Mode::Immediate => {
                    if self.is_6309() {
                        self.op_ldq(mode, bus)
                    } else {
                        self.op_illegal(bus)
                    }
                }
                0xD => self.op_st16(Wide::D, mode, bus),
                0xE => self.op_ld16(Wide::U, mode, bus),
                0xF => self.op_st16(Wide::U, mode, bus),
                _ => self.op_acc8(nibble, Acc8::B, mode, bus),
            }
        }
    }

    /// Opcodes 0x80-0xFF behind the 0x10 prefix.
    pub(crate) fn op_alu_page2<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let mode = Mode::of(opcode);
        let h6309 = self.is_6309();
        match (opcode >= 0xC0, opcode & 0x0F) {
            (false, 0x3) => self.op_cmp16(Wide::D, mode, bus),
            (false, 0xC) => self.op_cmp16(Wide::Y, mode, bus),
            (false, 0xE) => self.op_ld16(Wide::Y, mode, bus),
            (false, 0xF) => self.op_st16(Wide::Y, mode, bus),
            (true, 0xE) => self.op_ld16(Wide::S, mode, bus),
            (true, 0xF) => self.op_st16(Wide::S, mode, bus),
            (true, 0xC) if h6309 && mode != Mode::Immediate => self.op_ldq(mode, bus),
            (true, 0xD) if h6309 && mode != Mode::Immediate => self.op_stq(mode, bus),
            (false, nibble) if h6309 => match nibble {
                0x0 => self.op_sub16(Wide::W, mode, bus),
                0x1 => self.op_cmp16(Wide::W, mode, bus),
                0x2 => self.op_sbcd(mode, bus),
                0x4 | 0x5 | 0x8 | 0xA => self.op_logic16(nibble, mode, bus),
                0x6 => self.op_ld16(Wide::W, mode, bus),
                0x7 => self.op_st16(Wide::W, mode, bus),
                0x9 => self.op_adcd(mode, bus),
                0xB => self.op_add16(Wide::W, mode, bus),
                _ => self.op_illegal(bus),
            },
            _ if h6309 => self.op_illegal(bus),
            _ => self.execute_page0(opcode, bus),
        }
    }

    /// Opcodes 0x80-0xFF behind the 0x11 prefix.
    pub(crate) fn op_alu_page3<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let mode = Mode::of(opcode);
        let h6309 = self.is_6309();
        let side_f = opcode >= 0xC0;
        match (side_f, opcode & 0x0F) {
            (false, 0x3) => self.op_cmp16(Wide::U, mode, bus),
            (false, 0xC) => self.op_cmp16(Wide::S, mode, bus),
            (false, 0xD) if h6309 => self.op_divd(mode, bus),
            (false, 0xE) if h6309 => self.op_divq(mode, bus),
            (false, 0xF) if h6309 => self.op_muld(mode, bus),
            (_, nibble @ (0x0 | 0x1 | 0x6 | 0x7 | 0xB)) if h6309 => {
                let acc = if side_f { Acc8::F } else { Acc8::E };
                self.op_acc8(nibble, acc, mode, bus)
            }
            _ if h6309 => self.op_illegal(bus),
            _ => self.execute_page0(opcode, bus),
        }
    }
}
