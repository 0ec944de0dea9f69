use super::Acc8;
use crate::core::Bus;
use crate::cpu::m6809::{CcFlag, M6809, Mode};

impl M6809 {
    // --- Internal Binary Helpers ---

    /// a + b + carry. Sets H, N, Z, V, C.
    #[inline]
    pub(crate) fn perform_add8(&mut self, a: u8, b: u8, carry: bool) -> u8 {
        let c = carry as u8;
        let sum = a as u16 + b as u16 + c as u16;
        let result = sum as u8;
        let half = (a & 0x0F) + (b & 0x0F) + c > 0x0F;
        let overflow = (!(a ^ b) & (a ^ result)) & 0x80 != 0;
        self.set_flag(CcFlag::H, half);
        self.set_flags_arithmetic(result, overflow, sum > 0xFF);
        result
    }

    /// a - b - borrow. Sets N, Z, V, C; H is left alone.
    #[inline]
    pub(crate) fn perform_sub8(&mut self, a: u8, b: u8, borrow: bool) -> u8 {
        let c = borrow as u16;
        let result = (a as u16).wrapping_sub(b as u16).wrapping_sub(c) as u8;
        let overflow = ((a ^ b) & (a ^ result)) & 0x80 != 0;
        let carry = b as u16 + c > a as u16;
        self.set_flags_arithmetic(result, overflow, carry);
        result
    }

    /// Accumulator row shared by A, B, E and F; `nibble` is the low nibble
    /// of the opcode.
    ///
    /// 0 SUB, 1 CMP, 2 SBC, 4 AND, 5 BIT, 6 LD, 7 ST, 8 EOR, 9 ADC, A OR, B ADD.
    /// Immediate 2 cycles, direct 4 (3 native), indexed 4+, extended 5 (4).
    pub(crate) fn op_acc8<B: Bus + ?Sized>(&mut self, nibble: u8, acc: Acc8, mode: Mode, bus: &mut B) {
        if nibble == 0x7 {
            if mode == Mode::Immediate {
                return self.op_illegal(bus);
            }
            let ea = self.ea(mode, bus);
            let val = self.acc(acc);
            self.set_flags_logical(val);
            self.write8(bus, ea, val);
            return;
        }

        let operand = self.operand8(mode, bus);
        let reg = self.acc(acc);
        match nibble {
            0x0 => {
                let result = self.perform_sub8(reg, operand, false);
                self.set_acc(acc, result);
            }
            0x1 => {
                self.perform_sub8(reg, operand, false);
            }
            0x2 => {
                let borrow = self.flag(CcFlag::C);
                let result = self.perform_sub8(reg, operand, borrow);
                self.set_acc(acc, result);
            }
            0x4 => {
                let result = reg & operand;
                self.set_flags_logical(result);
                self.set_acc(acc, result);
            }
            0x5 => self.set_flags_logical(reg & operand),
            0x6 => {
                self.set_flags_logical(operand);
                self.set_acc(acc, operand);
            }
            0x8 => {
                let result = reg ^ operand;
                self.set_flags_logical(result);
                self.set_acc(acc, result);
            }
            0x9 => {
                let carry = self.flag(CcFlag::C);
                let result = self.perform_add8(reg, operand, carry);
                self.set_acc(acc, result);
            }
            0xA => {
                let result = reg | operand;
                self.set_flags_logical(result);
                self.set_acc(acc, result);
            }
            0xB => {
                let result = self.perform_add8(reg, operand, false);
                self.set_acc(acc, result);
            }
            _ => debug_assert!(false, "nibble {nibble:#x} is not an accumulator op"),
        }
    }
}
