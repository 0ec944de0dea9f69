//! HD6309 extensions: register ALU, bit transfers, TFM, extended arithmetic
//! and the MD register.

use super::transfer::is_wide;
use super::{CcFlag, DivOverflowMode, ExecState, M6809, MD_DIV0, MD_ILLEGAL, Mode, PendingOp};
use crate::core::Bus;

// Internal cycles after the operand is read
const DIVD_CYCLES: u8 = 22;
const DIVQ_CYCLES: u8 = 30;
const MULD_CYCLES: u8 = 24;

impl M6809 {
    /// SEXW (0x14): sign-extend W into D. 4 cycles.
    pub(crate) fn op_sexw<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek(bus, self.pc);
        self.nvma_n(bus, 2);
        let d = if self.e & 0x80 != 0 { 0xFFFF } else { 0 };
        self.set_d(d);
        let q = self.get_q();
        self.set_flag(CcFlag::N, q & 0x8000_0000 != 0);
        self.set_flag(CcFlag::Z, q == 0);
    }

    /// OIM (1), AIM (2), EIM (5), TIM (B) in the memory unary rows.
    /// The immediate mask precedes the address. Direct 6 cycles, indexed 7+,
    /// extended 7.
    pub(crate) fn op_immediate_memory<B: Bus + ?Sized>(&mut self, nibble: u8, mode: Mode, bus: &mut B) {
        let mask = self.fetch8(bus);
        let ea = match mode {
            Mode::Direct => {
                let lo = self.fetch8(bus);
                u16::from_be_bytes([self.dp, lo])
            }
            Mode::Indexed => self.ea_indexed(bus),
            _ => self.fetch16(bus),
        };
        let val = self.read8(bus, ea);
        let result = match nibble {
            0x1 => val | mask,
            0x5 => val ^ mask,
            _ => val & mask,
        };
        self.set_flags_logical(result);
        self.nvma(bus);
        if nibble == 0xB {
            self.nvma(bus);
        } else {
            self.write8(bus, ea, result);
        }
    }

    /// BAND..STBT (0x11 0x30-0x37): single-bit operations between CC, A or B
    /// and a direct-page byte.
    ///
    /// Postbyte: register (7-6), memory bit (5-3), register bit (2-0).
    /// 7 cycles (6 native); STBT writes back for one more.
    pub(crate) fn op_bit_transfer<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let post = self.fetch8(bus);
        let lo = self.fetch8(bus);
        let reg_sel = post >> 6;
        if reg_sel == 3 {
            return self.trap(bus, MD_ILLEGAL);
        }
        let ea = u16::from_be_bytes([self.dp, lo]);
        self.nvma_emu(bus);
        let mem = self.read8(bus, ea);
        self.nvma(bus);

        let mem_bit = (post >> 3) & 0x07;
        let reg_bit = post & 0x07;
        let m = mem & (1 << mem_bit) != 0;
        let reg = match reg_sel {
            0 => self.cc,
            1 => self.a,
            _ => self.b,
        };
        let r = reg & (1 << reg_bit) != 0;

        if opcode == 0x37 {
            let updated = if r { mem | (1 << mem_bit) } else { mem & !(1 << mem_bit) };
            self.write8(bus, ea, updated);
            return;
        }

        let bit = match opcode {
            0x30 => r && m,
            0x31 => r && !m,
            0x32 => r || m,
            0x33 => r || !m,
            0x34 => r ^ m,
            0x35 => r ^ !m,
            _ => m,
        };
        let updated = if bit { reg | (1 << reg_bit) } else { reg & !(1 << reg_bit) };
        match reg_sel {
            0 => self.cc = updated,
            1 => self.a = updated,
            _ => self.b = updated,
        }
    }

    /// BITMD (0x11 0x3C): test the MD trap flags and clear the tested ones.
    pub(crate) fn op_bitmd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let mask = self.fetch8(bus) & (MD_DIV0 | MD_ILLEGAL);
        self.nvma(bus);
        self.set_flag(CcFlag::Z, self.md & mask == 0);
        self.md &= !mask;
    }

    /// LDMD (0x11 0x3D): load the native-mode and FIRQ-mode bits.
    pub(crate) fn op_ldmd<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let val = self.fetch8(bus);
        self.nvma_n(bus, 2);
        self.md = (self.md & (MD_DIV0 | MD_ILLEGAL)) | (val & 0x03);
    }

    /// ADDR..CMPR (0x10 0x30-0x37): register-to-register ALU, 4 cycles.
    /// Operation width follows the destination.
    pub(crate) fn op_register_alu<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let post = self.fetch8(bus);
        self.nvma(bus);
        let (src, dst) = (post >> 4, post & 0x0F);
        let operand = self.transfer_value(src, dst);
        let current = self.read_reg(dst);
        let carry = self.flag(CcFlag::C);

        let result = if is_wide(dst) {
            match opcode {
                0x30 => self.perform_add16(current, operand, false),
                0x31 => self.perform_add16(current, operand, carry),
                0x32 | 0x37 => self.perform_sub16(current, operand, false),
                0x33 => self.perform_sub16(current, operand, carry),
                _ => {
                    let r = match opcode {
                        0x34 => current & operand,
                        0x35 => current | operand,
                        _ => current ^ operand,
                    };
                    self.set_flags_logical16(r);
                    r
                }
            }
        } else {
            let (current, operand) = (current as u8, operand as u8);
            let r = match opcode {
                0x30 => self.perform_add8(current, operand, false),
                0x31 => self.perform_add8(current, operand, carry),
                0x32 | 0x37 => self.perform_sub8(current, operand, false),
                0x33 => self.perform_sub8(current, operand, carry),
                _ => {
                    let r = match opcode {
                        0x34 => current & operand,
                        0x35 => current | operand,
                        _ => current ^ operand,
                    };
                    self.set_flags_logical(r);
                    r
                }
            };
            r as u16
        };

        if opcode != 0x37 {
            self.write_reg(dst, result);
        }
    }

    /// PSHSW (0x10 0x38) / PSHUW (0x10 0x3A). 6 cycles.
    pub(crate) fn op_push_w<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool) {
        self.peek(bus, self.pc);
        self.nvma(bus);
        self.push16(bus, system, self.get_w());
    }

    /// PULSW (0x10 0x39) / PULUW (0x10 0x3B). 6 cycles.
    pub(crate) fn op_pull_w<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool) {
        self.peek(bus, self.pc);
        self.nvma(bus);
        let w = self.pull16(bus, system);
        self.set_w(w);
    }

    /// TFM (0x11 0x38-0x3B): copy W bytes between the addresses held in two
    /// of D, X, Y, U, S. 6 cycles plus 3 per byte.
    ///
    /// 0x38 r0+,r1+   0x39 r0-,r1-   0x3A r0+,r1   0x3B r0,r1+
    pub(crate) fn op_tfm<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let post = self.fetch8(bus);
        let (src, dst) = (post >> 4, post & 0x0F);
        if src > 4 || dst > 4 {
            return self.trap(bus, MD_ILLEGAL);
        }
        self.nvma_n(bus, 3);
        self.state = ExecState::Tfm {
            src,
            dst,
            mode: opcode & 0x03,
            start_pc: self.instr_start,
        };
    }

    /// One byte of a TFM. An interrupt rewinds PC to the instruction so it
    /// restarts, with the updated pointers and count, after the handler.
    pub(crate) fn tfm_step<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let ExecState::Tfm { src, dst, mode, start_pc } = self.state else {
            return;
        };
        if self.get_w() == 0 {
            self.state = ExecState::Fetch;
            return;
        }
        if self.interrupt_pending() {
            self.pc = start_pc;
            self.state = ExecState::Fetch;
            return;
        }

        let from = self.read_reg(src);
        let to = self.read_reg(dst);
        let val = self.read8(bus, from);
        self.nvma(bus);
        self.write8(bus, to, val);

        let (src_step, dst_step): (u16, u16) = match mode {
            0 => (1, 1),
            1 => (0xFFFF, 0xFFFF),
            2 => (1, 0),
            _ => (0, 1),
        };
        self.write_reg(src, from.wrapping_add(src_step));
        self.write_reg(dst, to.wrapping_add(dst_step));
        self.set_w(self.get_w().wrapping_sub(1));
    }

    /// DIVD (0x11 0x8D): D / signed 8-bit, quotient to B, remainder to A.
    /// Immediate 25 cycles, direct 27, indexed 27+, extended 28.
    pub(crate) fn op_divd<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let divisor = self.operand8(mode, bus);
        if divisor == 0 {
            return self.trap(bus, MD_DIV0);
        }
        self.begin_compute(PendingOp::Divd(divisor), DIVD_CYCLES);
    }

    /// DIVQ (0x11 0x8E): Q / signed 16-bit, quotient to W, remainder to D.
    /// Immediate 34 cycles, direct 36, indexed 36+, extended 37.
    pub(crate) fn op_divq<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let divisor = self.operand16(mode, bus);
        if divisor == 0 {
            return self.trap(bus, MD_DIV0);
        }
        self.begin_compute(PendingOp::Divq(divisor), DIVQ_CYCLES);
    }

    /// MULD (0x11 0x8F): Q = D * signed 16-bit.
    /// Immediate 28 cycles, direct 30, indexed 30+, extended 31.
    pub(crate) fn op_muld<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) {
        let operand = self.operand16(mode, bus);
        self.begin_compute(PendingOp::Muld(operand), MULD_CYCLES);
    }

    fn begin_compute(&mut self, op: PendingOp, cycles: u8) {
        self.state = ExecState::Compute {
            op,
            remaining: cycles,
            start_pc: self.instr_start,
        };
    }

    /// One internal cycle of DIVD/DIVQ/MULD. An interrupt abandons the
    /// operation and rewinds PC; the registers are only written on the
    /// final cycle.
    pub(crate) fn compute_step<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let ExecState::Compute { op, remaining, start_pc } = self.state else {
            return;
        };
        if self.interrupt_pending() {
            self.pc = start_pc;
            self.state = ExecState::Fetch;
            return;
        }
        self.nvma(bus);
        if remaining > 1 {
            self.state = ExecState::Compute {
                op,
                remaining: remaining - 1,
                start_pc,
            };
            return;
        }
        match op {
            PendingOp::Divd(divisor) => self.commit_divd(divisor),
            PendingOp::Divq(divisor) => self.commit_divq(divisor),
            PendingOp::Muld(operand) => self.commit_muld(operand),
        }
        self.state = ExecState::Fetch;
    }

    /// Range overflow: the quotient does not even fit in one extra bit.
    fn divide_range_overflow(&mut self) {
        self.set_flag(CcFlag::N, false);
        self.set_flag(CcFlag::Z, false);
        self.set_flag(CcFlag::V, true);
        self.set_flag(CcFlag::C, false);
    }

    fn commit_divd(&mut self, divisor: u8) {
        let dividend = self.get_d() as i16 as i32;
        let divisor = divisor as i8 as i32;
        let quotient = dividend / divisor;
        let remainder = dividend % divisor;

        if !(-256..=255).contains(&quotient) {
            return self.divide_range_overflow();
        }
        let fits = (-128..=127).contains(&quotient);
        if !fits && self.div_overflow == DivOverflowMode::Abort {
            self.set_flag(CcFlag::V, true);
            return;
        }
        self.a = remainder as u8;
        self.b = quotient as u8;
        self.set_flag(CcFlag::N, self.b & 0x80 != 0);
        self.set_flag(CcFlag::Z, self.b == 0);
        self.set_flag(CcFlag::V, !fits);
        self.set_flag(CcFlag::C, self.b & 0x01 != 0);
    }

    fn commit_divq(&mut self, divisor: u16) {
        let dividend = self.get_q() as i32 as i64;
        let divisor = divisor as i16 as i64;
        let quotient = dividend / divisor;
        let remainder = dividend % divisor;

        if !(-65536..=65535).contains(&quotient) {
            return self.divide_range_overflow();
        }
        let fits = (-32768..=32767).contains(&quotient);
        if !fits && self.div_overflow == DivOverflowMode::Abort {
            self.set_flag(CcFlag::V, true);
            return;
        }
        let w = quotient as u16;
        self.set_d(remainder as u16);
        self.set_w(w);
        self.set_flag(CcFlag::N, w & 0x8000 != 0);
        self.set_flag(CcFlag::Z, w == 0);
        self.set_flag(CcFlag::V, !fits);
        self.set_flag(CcFlag::C, w & 0x0001 != 0);
    }

    fn commit_muld(&mut self, operand: u16) {
        let product = (self.get_d() as i16 as i32) * (operand as i16 as i32);
        let q = product as u32;
        self.set_q(q);
        self.set_flag(CcFlag::N, q & 0x8000_0000 != 0);
        self.set_flag(CcFlag::Z, q == 0);
    }
}
