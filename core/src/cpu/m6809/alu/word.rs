use super::Wide;
use crate::core::Bus;
use crate::cpu::m6809::{CcFlag, M6809, Mode};

impl M6809 {
    // --- Internal 16-bit Helpers ---

    #[inline]
    pub(crate) fn perform_add16(&mut self, a: u16, b: u16, carry: bool) -> u16 {
        let sum = a as u32 + b as u32 + carry as u32;
        let result = sum as u16;
        let overflow = (!(a ^ b) & (a ^ result)) & 0x8000 != 0;
        self.set_flags_arithmetic16(result, overflow, sum > 0xFFFF);
        result
    }

    #[inline]
    pub(crate) fn perform_sub16(&mut self, a: u16, b: u16, borrow: bool) -> u16 {
        let c = borrow as u32;
        let result = (a as u32).wrapping_sub(b as u32).wrapping_sub(c) as u16;
        let overflow = ((a ^ b) & (a ^ result)) & 0x8000 != 0;
        self.set_flags_arithmetic16(result, overflow, b as u32 + c > a as u32);
        result
    }

    /// Word operand followed by the ALU's dead cycle (emulation mode only).
    fn word_operand<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) -> u16 {
        let operand = self.operand16(mode, bus);
        self.nvma_emu(bus);
        operand
    }

    /// SUBD (0x83) / SUBW (0x10 0x80).
    /// Immediate 4 cycles, direct 6, indexed 6+, extended 7.
    pub(crate) fn op_sub16<B: Bus + ?Sized>(&mut self, reg: Wide, mode: Mode, bus: &mut B) {
        let operand = self.word_operand(mode, bus);
        let result = self.perform_sub16(self.wide(reg), operand, false);
        self.set_wide(reg, result);
    }

    /// ADDD (0xC3) / ADDW (0x10 0x8B).
    pub(crate) fn op_add16<B: Bus + ?Sized>(&mut self, reg: Wide, mode: Mode, bus: &mut B) {
        let operand = self.word_operand(mode, bus);
        let result = self.perform_add16(self.wide(reg), operand, false);
        self.set_wide(reg, result);
    }

    /// CMPX, CMPY, CMPD, CMPU, CMPS, CMPW. Flags only.
    pub(crate) fn op_cmp16<B: Bus + ?Sized>(&mut self, reg: Wide, mode: Mode, bus: &mut B) {
        let operand = self.word_operand(mode, bus);
        self.perform_sub16(self.wide(reg), operand, false);
    }

    /// SBCD (0x10 0x82).
    pub(crate) fn op_sbcd<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let operand = self.word_operand(mode, bus);
        let borrow = self.flag(CcFlag::C);
        let result = self.perform_sub16(self.get_d(), operand, borrow);
        self.set_d(result);
    }

    /// ADCD (0x10 0x89).
    pub(crate) fn op_adcd<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let operand = self.word_operand(mode, bus);
        let carry = self.flag(CcFlag::C);
        let result = self.perform_add16(self.get_d(), operand, carry);
        self.set_d(result);
    }

    /// ANDD (4), BITD (5), EORD (8), ORD (A) behind the 0x10 prefix.
    pub(crate) fn op_logic16<B: Bus + ?Sized>(&mut self, nibble: u8, mode: Mode, bus: &mut B) {
        let operand = self.word_operand(mode, bus);
        let d = self.get_d();
        let result = match nibble {
            0x4 | 0x5 => d & operand,
            0x8 => d ^ operand,
            _ => d | operand,
        };
        self.set_flags_logical16(result);
        if nibble != 0x5 {
            self.set_d(result);
        }
    }

    /// MUL inherent (0x3D): D = A * B (unsigned).
    /// Z set if the product is zero, C set to bit 7 of B.
    /// 11 cycles, 10 in native mode.
    pub(crate) fn op_mul<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek_pc_emu(bus);
        self.nvma_n(bus, 9);
        let product = self.a as u16 * self.b as u16;
        self.set_d(product);
        self.set_flag(CcFlag::Z, product == 0);
        self.set_flag(CcFlag::C, product & 0x80 != 0);
    }
}
