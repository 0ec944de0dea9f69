use super::{Acc8, Wide};
use crate::core::Bus;
use crate::cpu::m6809::{CcFlag, M6809, Mode};

/// Single-operand operations of the 0x00 and 0x40-0x7F rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Unary {
    Neg,
    /// Undocumented 6809: COM if C set, otherwise NEG.
    Ngc,
    Com,
    Lsr,
    Ror,
    Asr,
    Asl,
    Rol,
    Dec,
    Inc,
    Tst,
    Clr,
}

impl Unary {
    /// Operation selected by the low nibble of a unary row. The 6809 decodes
    /// the undocumented slots as neighbouring operations; the 6309 traps on
    /// them.
    pub(crate) fn decode(nibble: u8, hd6309: bool) -> Option<Unary> {
        Some(match nibble {
            0x0 => Unary::Neg,
            0x3 => Unary::Com,
            0x4 => Unary::Lsr,
            0x6 => Unary::Ror,
            0x7 => Unary::Asr,
            0x8 => Unary::Asl,
            0x9 => Unary::Rol,
            0xA => Unary::Dec,
            0xC => Unary::Inc,
            0xD => Unary::Tst,
            0xF => Unary::Clr,
            _ if hd6309 => return None,
            0x1 => Unary::Neg,
            0x2 => Unary::Ngc,
            0x5 => Unary::Lsr,
            0xB => Unary::Dec,
            0xE => Unary::Clr,
            _ => return None,
        })
    }
}

impl M6809 {
    // --- Internal Unary Helpers ---

    pub(crate) fn perform_unary8(&mut self, op: Unary, val: u8) -> u8 {
        match op {
            Unary::Neg => {
                let result = 0u8.wrapping_sub(val);
                self.set_flags_arithmetic(result, val == 0x80, val != 0);
                result
            }
            Unary::Ngc => {
                let op = if self.flag(CcFlag::C) { Unary::Com } else { Unary::Neg };
                self.perform_unary8(op, val)
            }
            Unary::Com => {
                let result = !val;
                self.set_flags_logical(result);
                self.set_flag(CcFlag::C, true);
                result
            }
            Unary::Lsr => self.perform_lsr(val),
            Unary::Ror => self.perform_ror(val),
            Unary::Asr => self.perform_asr(val),
            Unary::Asl => self.perform_asl(val),
            Unary::Rol => self.perform_rol(val),
            Unary::Dec => {
                let result = val.wrapping_sub(1);
                self.set_flag(CcFlag::N, result & 0x80 != 0);
                self.set_flag(CcFlag::Z, result == 0);
                self.set_flag(CcFlag::V, val == 0x80);
                result
            }
            Unary::Inc => {
                let result = val.wrapping_add(1);
                self.set_flag(CcFlag::N, result & 0x80 != 0);
                self.set_flag(CcFlag::Z, result == 0);
                self.set_flag(CcFlag::V, val == 0x7F);
                result
            }
            Unary::Tst => {
                self.set_flags_logical(val);
                val
            }
            Unary::Clr => {
                self.set_flags_arithmetic(0, false, false);
                0
            }
        }
    }

    pub(crate) fn perform_unary16(&mut self, op: Unary, val: u16) -> u16 {
        match op {
            Unary::Neg | Unary::Ngc => {
                let result = 0u16.wrapping_sub(val);
                self.set_flags_arithmetic16(result, val == 0x8000, val != 0);
                result
            }
            Unary::Com => {
                let result = !val;
                self.set_flags_logical16(result);
                self.set_flag(CcFlag::C, true);
                result
            }
            Unary::Lsr => self.perform_lsr16(val),
            Unary::Ror => self.perform_ror16(val),
            Unary::Asr => self.perform_asr16(val),
            Unary::Asl => self.perform_asl16(val),
            Unary::Rol => self.perform_rol16(val),
            Unary::Dec => {
                let result = val.wrapping_sub(1);
                self.set_flag(CcFlag::N, result & 0x8000 != 0);
                self.set_flag(CcFlag::Z, result == 0);
                self.set_flag(CcFlag::V, val == 0x8000);
                result
            }
            Unary::Inc => {
                let result = val.wrapping_add(1);
                self.set_flag(CcFlag::N, result & 0x8000 != 0);
                self.set_flag(CcFlag::Z, result == 0);
                self.set_flag(CcFlag::V, val == 0x7FFF);
                result
            }
            Unary::Tst => {
                self.set_flags_logical16(val);
                val
            }
            Unary::Clr => {
                self.set_flags_arithmetic16(0, false, false);
                0
            }
        }
    }

    /// Memory unary rows: direct (0x00), indexed (0x60), extended (0x70).
    ///
    /// Read-modify-write: direct 6 cycles (5 native), indexed 6+, extended 7 (6).
    /// TST skips the write: direct 6 (4), indexed 6+ (5+), extended 7 (5).
    /// JMP sits in the 0xE column.
    pub(crate) fn op_memory_unary<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let mode = Mode::of_unary(opcode);
        let nibble = opcode & 0x0F;

        if self.is_6309() && matches!(nibble, 0x1 | 0x2 | 0x5 | 0xB) {
            return self.op_immediate_memory(nibble, mode, bus);
        }
        if nibble == 0xE {
            self.pc = self.ea(mode, bus);
            return;
        }
        let Some(op) = Unary::decode(nibble, false) else {
            return self.op_illegal(bus);
        };

        let ea = self.ea(mode, bus);
        let val = self.read8(bus, ea);
        if op == Unary::Tst {
            self.perform_unary8(op, val);
            self.nvma_emu(bus);
            self.nvma(bus);
            return;
        }
        let result = self.perform_unary8(op, val);
        self.nvma(bus);
        self.write8(bus, ea, result);
    }

    /// Accumulator unary rows: A (0x40), B (0x50). 2 cycles, 1 native.
    pub(crate) fn op_inherent_ab<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let acc = if opcode < 0x50 { Acc8::A } else { Acc8::B };
        let Some(op) = Unary::decode(opcode & 0x0F, self.is_6309()) else {
            return self.op_illegal(bus);
        };
        self.peek_pc_emu(bus);
        let result = self.perform_unary8(op, self.acc(acc));
        self.set_acc(acc, result);
    }

    /// HD6309 D (0x10 0x40) and W (0x10 0x50) unary rows. 3 cycles, 2 native.
    pub(crate) fn op_inherent_dw<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let nibble = opcode & 0x0F;
        let (reg, valid) = if opcode < 0x50 {
            (Wide::D, matches!(nibble, 0x0 | 0x3 | 0x4 | 0x6 | 0x7 | 0x8 | 0x9 | 0xA | 0xC | 0xD | 0xF))
        } else {
            (Wide::W, matches!(nibble, 0x3 | 0x4 | 0x6 | 0x9 | 0xA | 0xC | 0xD | 0xF))
        };
        let Some(op) = Unary::decode(nibble, true).filter(|_| valid) else {
            return self.op_illegal(bus);
        };
        self.peek_pc_emu(bus);
        let result = self.perform_unary16(op, self.wide(reg));
        self.set_wide(reg, result);
    }

    /// HD6309 E (0x11 0x40) and F (0x11 0x50) rows: COM, DEC, INC, TST, CLR.
    pub(crate) fn op_inherent_ef<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let acc = if opcode < 0x50 { Acc8::E } else { Acc8::F };
        let nibble = opcode & 0x0F;
        let valid = matches!(nibble, 0x3 | 0xA | 0xC | 0xD | 0xF);
        let Some(op) = Unary::decode(nibble, true).filter(|_| valid) else {
            return self.op_illegal(bus);
        };
        self.peek_pc_emu(bus);
        let result = self.perform_unary8(op, self.acc(acc));
        self.set_acc(acc, result);
    }

    /// NOP inherent (0x12). 2 cycles, 1 native.
    pub(crate) fn op_nop<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek_pc_emu(bus);
    }

    /// SEX inherent (0x1D): Sign-extend B into A.
    /// N set if result is negative. Z set if D (A:B) is zero.
    pub(crate) fn op_sex<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek_pc_emu(bus);
        self.a = if self.b & 0x80 != 0 { 0xFF } else { 0x00 };
        let d = self.get_d();
        self.set_flag(CcFlag::N, d & 0x8000 != 0);
        self.set_flag(CcFlag::Z, d == 0);
    }

    /// ABX inherent (0x3A): X = X + B (unsigned). No flags affected.
    /// 3 cycles, 1 native.
    pub(crate) fn op_abx<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek_pc_emu(bus);
        self.nvma_emu(bus);
        self.x = self.x.wrapping_add(self.b as u16);
    }

    /// DAA inherent (0x19): Decimal Adjust A after BCD addition.
    /// C set if BCD carry occurred. V undefined (left unchanged).
    pub(crate) fn op_daa<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek_pc_emu(bus);
        let mut correction: u8 = 0;
        let mut carry = self.flag(CcFlag::C);
        let msn = self.a & 0xF0;
        let lsn = self.a & 0x0F;

        if lsn > 0x09 || self.flag(CcFlag::H) {
            correction |= 0x06;
        }
        if msn > 0x90 || carry || (msn > 0x80 && lsn > 0x09) {
            correction |= 0x60;
            carry = true;
        }

        self.a = self.a.wrapping_add(correction);
        self.set_flag(CcFlag::N, self.a & 0x80 != 0);
        self.set_flag(CcFlag::Z, self.a == 0);
        self.set_flag(CcFlag::C, carry);
    }
}
