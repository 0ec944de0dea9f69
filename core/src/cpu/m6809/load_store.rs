use super::{CcFlag, M6809, Mode};
use super::alu::Wide;
use crate::core::Bus;

impl M6809 {
    /// LDD, LDX, LDY, LDU, LDS, LDW.
    /// Immediate 3 cycles, direct 5 (4 native), indexed 5+, extended 6 (5).
    pub(crate) fn op_ld16<B: Bus + ?Sized>(&mut self, reg: Wide, mode: Mode, bus: &mut B) {
        let val = self.operand16(mode, bus);
        self.set_flags_logical16(val);
        self.set_wide(reg, val);
    }

    /// STD, STX, STY, STU, STS, STW. The immediate form is undefined.
    pub(crate) fn op_st16<B: Bus + ?Sized>(&mut self, reg: Wide, mode: Mode, bus: &mut B) {
        if mode == Mode::Immediate {
            return self.op_illegal(bus);
        }
        let ea = self.ea(mode, bus);
        let val = self.wide(reg);
        self.set_flags_logical16(val);
        self.write16(bus, ea, val);
    }

    /// LDQ (0xCD immediate, 0x10 0xDC/0xEC/0xFC).
    pub(crate) fn op_ldq<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let val = self.operand32(mode, bus);
        self.set_q(val);
        self.set_flag(CcFlag::N, val & 0x8000_0000 != 0);
        self.set_flag(CcFlag::Z, val == 0);
        self.set_flag(CcFlag::V, false);
    }

    /// STQ (0x10 0xDD/0xED/0xFD).
    pub(crate) fn op_stq<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let ea = self.ea(mode, bus);
        let val = self.get_q();
        self.set_flag(CcFlag::N, val & 0x8000_0000 != 0);
        self.set_flag(CcFlag::Z, val == 0);
        self.set_flag(CcFlag::V, false);
        self.write16(bus, ea, (val >> 16) as u16);
        self.write16(bus, ea.wrapping_add(2), val as u16);
    }

    /// LEAX (0x30), LEAY (0x31), LEAS (0x32), LEAU (0x33). 4+ cycles.
    /// LEAX and LEAY set Z; LEAS and LEAU leave the flags alone.
    pub(crate) fn op_lea<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let ea = self.ea_indexed(bus);
        self.nvma(bus);
        match opcode & 0x03 {
            0 => {
                self.x = ea;
                self.set_flag(CcFlag::Z, ea == 0);
            }
            1 => {
                self.y = ea;
                self.set_flag(CcFlag::Z, ea == 0);
            }
            2 => self.set_s(ea),
            _ => self.u = ea,
        }
    }
}
