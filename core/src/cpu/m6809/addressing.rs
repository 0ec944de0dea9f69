use super::M6809;
use crate::core::Bus;

/// Operand addressing mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Mode {
    Immediate,
    Direct,
    Indexed,
    Extended,
}

impl Mode {
    /// Mode selected by bits 4-5 of the 0x80-0xFF opcode rows.
    #[inline]
    pub(crate) fn of(opcode: u8) -> Mode {
        match (opcode >> 4) & 0x03 {
            0 => Mode::Immediate,
            1 => Mode::Direct,
            2 => Mode::Indexed,
            _ => Mode::Extended,
        }
    }

    /// Mode of the memory unary rows 0x00, 0x60 and 0x70.
    #[inline]
    pub(crate) fn of_unary(opcode: u8) -> Mode {
        match opcode >> 4 {
            0x0 => Mode::Direct,
            0x6 => Mode::Indexed,
            _ => Mode::Extended,
        }
    }
}

impl M6809 {
    #[inline]
    fn index_reg(&self, sel: u8) -> u16 {
        match sel & 0x03 {
            0 => self.x,
            1 => self.y,
            2 => self.u,
            _ => self.s,
        }
    }

    #[inline]
    fn set_index_reg(&mut self, sel: u8, val: u16) {
        match sel & 0x03 {
            0 => self.x = val,
            1 => self.y = val,
            2 => self.u = val,
            _ => self.s = val,
        }
    }

    /// DP:nn. One dead cycle in emulation mode.
    pub(crate) fn ea_direct<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch8(bus);
        self.nvma_emu(bus);
        u16::from_be_bytes([self.dp, lo])
    }

    /// Absolute 16-bit address. One dead cycle in emulation mode.
    pub(crate) fn ea_extended<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let addr = self.fetch16(bus);
        self.nvma_emu(bus);
        addr
    }

    /// Decode an indexed postbyte, apply any auto increment/decrement and
    /// follow indirection.
    ///
    /// Cycle cost after the postbyte fetch, emulation / native:
    /// ,R 1; n5,R 2; A/B/E/F,R 2; n8,R 2; n16,R 5/4; D/W,R 5/3;
    /// ,R+ 3/2; ,R++ 4/3; ,-R 3/2; ,--R 4/3; n8,PCR 2; n16,PCR 6/4;
    /// [n16] 3/2; ,W 1; n16,W 3; ,W++ / ,--W 2. Indirection adds 3.
    pub(crate) fn ea_indexed<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let post = self.fetch8(bus);

        // 5-bit signed offset, never indirect
        if post & 0x80 == 0 {
            let offset = (((post & 0x1F) as i8) << 3) >> 3;
            self.peek(bus, self.pc);
            self.nvma(bus);
            return self.index_reg(post >> 5).wrapping_add(offset as u16);
        }

        let sel = (post >> 5) & 0x03;
        let indirect = post & 0x10 != 0;

        let ea = if self.is_6309() && matches!(post, 0x8F | 0x90 | 0xAF | 0xB0 | 0xCF | 0xD0 | 0xEF | 0xF0) {
            self.ea_w_based(post, bus)
        } else {
            match post & 0x0F {
                // ,R+
                0x0 => {
                    let reg = self.index_reg(sel);
                    self.set_index_reg(sel, reg.wrapping_add(1));
                    self.peek(bus, self.pc);
                    self.nvma(bus);
                    self.nvma_emu(bus);
                    reg
                }
                // ,R++
                0x1 => {
                    let reg = self.index_reg(sel);
                    self.set_index_reg(sel, reg.wrapping_add(2));
                    self.peek(bus, self.pc);
                    self.nvma_n(bus, 2);
                    self.nvma_emu(bus);
                    reg
                }
                // ,-R
                0x2 => {
                    let reg = self.index_reg(sel).wrapping_sub(1);
                    self.set_index_reg(sel, reg);
                    self.peek(bus, self.pc);
                    self.nvma(bus);
                    self.nvma_emu(bus);
                    reg
                }
                // ,--R
                0x3 => {
                    let reg = self.index_reg(sel).wrapping_sub(2);
                    self.set_index_reg(sel, reg);
                    self.peek(bus, self.pc);
                    self.nvma_n(bus, 2);
                    self.nvma_emu(bus);
                    reg
                }
                // B,R
                0x5 => self.ea_accumulator_offset(sel, self.b as i8, bus),
                // A,R
                0x6 => self.ea_accumulator_offset(sel, self.a as i8, bus),
                // E,R
                0x7 if self.is_6309() => self.ea_accumulator_offset(sel, self.e as i8, bus),
                // n8,R
                0x8 => {
                    let offset = self.fetch8(bus) as i8;
                    self.nvma(bus);
                    self.index_reg(sel).wrapping_add(offset as u16)
                }
                // n16,R
                0x9 => {
                    let offset = self.fetch16(bus);
                    self.nvma_n(bus, 2);
                    self.nvma_emu(bus);
                    self.index_reg(sel).wrapping_add(offset)
                }
                // F,R
                0xA if self.is_6309() => self.ea_accumulator_offset(sel, self.f as i8, bus),
                // D,R
                0xB => self.ea_wide_offset(sel, self.get_d(), bus),
                // n8,PCR
                0xC => {
                    let offset = self.fetch8(bus) as i8;
                    self.nvma(bus);
                    self.pc.wrapping_add(offset as u16)
                }
                // n16,PCR
                0xD => {
                    let offset = self.fetch16(bus);
                    self.nvma_n(bus, 2);
                    self.nvma_emu(bus);
                    self.nvma_emu(bus);
                    self.pc.wrapping_add(offset)
                }
                // W,R
                0xE if self.is_6309() => self.ea_wide_offset(sel, self.get_w(), bus),
                // [n16], or plain n16 for the undefined non-indirect form
                0xF => {
                    let addr = self.fetch16(bus);
                    self.nvma_emu(bus);
                    addr
                }
                // ,R and the undefined 6809 slots that behave like it
                _ => {
                    self.peek(bus, self.pc);
                    self.index_reg(sel)
                }
            }
        };

        if indirect {
            let target = self.read16(bus, ea);
            self.nvma(bus);
            target
        } else {
            ea
        }
    }

    fn ea_accumulator_offset<B: Bus + ?Sized>(&mut self, sel: u8, offset: i8, bus: &mut B) -> u16 {
        self.peek(bus, self.pc);
        self.nvma(bus);
        self.index_reg(sel).wrapping_add(offset as u16)
    }

    fn ea_wide_offset<B: Bus + ?Sized>(&mut self, sel: u8, offset: u16, bus: &mut B) -> u16 {
        self.peek(bus, self.pc);
        self.nvma_n(bus, 2);
        self.nvma_emu(bus);
        self.nvma_emu(bus);
        self.index_reg(sel).wrapping_add(offset)
    }

    /// HD6309 modes based on W: ,W  n16,W  ,W++  ,--W
    fn ea_w_based<B: Bus + ?Sized>(&mut self, post: u8, bus: &mut B) -> u16 {
        match post & 0x60 {
            0x00 => {
                self.peek(bus, self.pc);
                self.get_w()
            }
            0x20 => {
                let offset = self.fetch16(bus);
                self.nvma(bus);
                self.get_w().wrapping_add(offset)
            }
            0x40 => {
                let w = self.get_w();
                self.set_w(w.wrapping_add(2));
                self.peek(bus, self.pc);
                self.nvma(bus);
                w
            }
            _ => {
                let w = self.get_w().wrapping_sub(2);
                self.set_w(w);
                self.peek(bus, self.pc);
                self.nvma(bus);
                w
            }
        }
    }

    /// Effective address for a memory mode. Immediate yields the operand
    /// address without consuming it.
    pub(crate) fn ea<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) -> u16 {
        match mode {
            Mode::Immediate => self.pc,
            Mode::Direct => self.ea_direct(bus),
            Mode::Indexed => self.ea_indexed(bus),
            Mode::Extended => self.ea_extended(bus),
        }
    }

    pub(crate) fn operand8<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) -> u8 {
        match mode {
            Mode::Immediate => self.fetch8(bus),
            _ => {
                let ea = self.ea(mode, bus);
                self.read8(bus, ea)
            }
        }
    }

    pub(crate) fn operand16<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) -> u16 {
        match mode {
            Mode::Immediate => self.fetch16(bus),
            _ => {
                let ea = self.ea(mode, bus);
                self.read16(bus, ea)
            }
        }
    }

    pub(crate) fn operand32<B: Bus + ?Sized>(&mut self, mode: Mode, bus: &mut B) -> u32 {
        let (hi, lo) = match mode {
            Mode::Immediate => (self.fetch16(bus), self.fetch16(bus)),
            _ => {
                let ea = self.ea(mode, bus);
                (self.read16(bus, ea), self.read16(bus, ea.wrapping_add(2)))
            }
        };
        (u32::from(hi) << 16) | u32::from(lo)
    }
}
