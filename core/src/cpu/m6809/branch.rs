use super::{CcFlag, M6809, Mode};
use crate::core::Bus;

impl M6809 {
    /// Condition encoded in the low nibble of a branch opcode.
    ///
    /// Even nibbles test a condition, odd nibbles its complement:
    /// 0 BRA, 2 BHI, 4 BCC, 6 BNE, 8 BVC, A BPL, C BGE, E BGT.
    pub(crate) fn branch_condition(&self, opcode: u8) -> bool {
        let c = self.flag(CcFlag::C);
        let z = self.flag(CcFlag::Z);
        let v = self.flag(CcFlag::V);
        let n = self.flag(CcFlag::N);
        let taken = match (opcode >> 1) & 0x07 {
            0 => true,
            1 => !(c || z),
            2 => !c,
            3 => !z,
            4 => !v,
            5 => !n,
            6 => n == v,
            _ => !z && n == v,
        };
        taken ^ (opcode & 0x01 != 0)
    }

    /// Short branches (0x20-0x2F): 3 cycles whether taken or not.
    pub(crate) fn op_branch<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let offset = self.fetch8(bus) as i8;
        self.nvma(bus);
        if self.branch_condition(opcode) {
            self.pc = self.pc.wrapping_add(offset as u16);
        }
    }

    /// Long branches (0x10 0x21-0x2F): 5 cycles, 6 when taken.
    pub(crate) fn op_long_branch<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let offset = self.fetch16(bus);
        self.nvma(bus);
        if self.branch_condition(opcode) {
            self.nvma(bus);
            self.pc = self.pc.wrapping_add(offset);
        }
    }

    /// LBRA (0x16): 5 cycles, 4 native.
    pub(crate) fn op_lbra<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let offset = self.fetch16(bus);
        self.nvma_emu(bus);
        self.nvma(bus);
        self.pc = self.pc.wrapping_add(offset);
    }

    /// 0x10 0x20 decodes as an always-taken long branch.
    pub(crate) fn op_lbra_page2<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.op_long_branch(0x20, bus);
    }

    /// BSR (0x8D): push PC and branch. 7 cycles, 6 native.
    pub(crate) fn op_bsr<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let offset = self.fetch8(bus) as i8;
        self.nvma(bus);
        self.nvma_emu(bus);
        self.nvma(bus);
        self.push16(bus, true, self.pc);
        self.pc = self.pc.wrapping_add(offset as u16);
    }

    /// LBSR (0x17): 9 cycles, 7 native.
    pub(crate) fn op_lbsr<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let offset = self.fetch16(bus);
        self.nvma(bus);
        self.nvma_emu(bus);
        self.nvma_emu(bus);
        self.nvma(bus);
        self.push16(bus, true, self.pc);
        self.pc = self.pc.wrapping_add(offset);
    }

    /// JSR (0x9D, 0xAD, 0xBD).
    /// Direct 7 cycles (6 native), indexed 7+ (6+), extended 8 (7).
    pub(crate) fn op_jsr<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let ea = self.ea(mode, bus);
        self.peek(bus, ea);
        if mode == Mode::Indexed {
            self.nvma_emu(bus);
        } else {
            self.nvma(bus);
        }
        self.push16(bus, true, self.pc);
        self.pc = ea;
    }

    /// RTS (0x39): 5 cycles, 4 native.
    pub(crate) fn op_rts<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek_pc_emu(bus);
        self.pc = self.pull16(bus, true);
        self.nvma(bus);
    }
}
