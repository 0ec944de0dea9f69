use super::M6809;
use crate::core::Bus;

/// Register numbering used by TFR/EXG, the 6309 register ALU and TFM:
/// 0 D, 1 X, 2 Y, 3 U, 4 S, 5 PC, 6 W, 7 V, 8 A, 9 B, A CC, B DP,
/// C/D zero, E E, F F. Codes below 8 are 16-bit.
#[inline]
pub(crate) fn is_wide(id: u8) -> bool {
    id & 0x0F < 8
}

impl M6809 {
    /// Raw register value, 8-bit registers zero-extended. Codes the model
    /// does not implement read as all ones (6809) or zero (6309 C/D).
    pub(crate) fn read_reg(&self, id: u8) -> u16 {
        let h6309 = self.is_6309();
        match id & 0x0F {
            0x0 => self.get_d(),
            0x1 => self.x,
            0x2 => self.y,
            0x3 => self.u,
            0x4 => self.s,
            0x5 => self.pc,
            0x6 if h6309 => self.get_w(),
            0x7 if h6309 => self.v,
            0x6 | 0x7 => 0xFFFF,
            0x8 => self.a as u16,
            0x9 => self.b as u16,
            0xA => self.cc as u16,
            0xB => self.dp as u16,
            0xE if h6309 => self.e as u16,
            0xF if h6309 => self.f as u16,
            _ if h6309 => 0,
            _ => 0xFF,
        }
    }

    pub(crate) fn write_reg(&mut self, id: u8, val: u16) {
        let h6309 = self.is_6309();
        match id & 0x0F {
            0x0 => self.set_d(val),
            0x1 => self.x = val,
            0x2 => self.y = val,
            0x3 => self.u = val,
            0x4 => self.set_s(val),
            0x5 => self.pc = val,
            0x6 if h6309 => self.set_w(val),
            0x7 if h6309 => self.v = val,
            0x8 => self.a = val as u8,
            0x9 => self.b = val as u8,
            0xA => self.cc = val as u8,
            0xB => self.dp = val as u8,
            0xE if h6309 => self.e = val as u8,
            0xF if h6309 => self.f = val as u8,
            _ => {}
        }
    }

    /// Value of `src` as delivered to `dst` when the widths differ.
    ///
    /// 6809: an 8-bit source fills the high byte with $FF; a 16-bit source
    /// gives its low byte. 6309: A or B widen to D and E or F to W; A and E
    /// take the high byte of a 16-bit source, the others the low byte.
    pub(crate) fn transfer_value(&self, src: u8, dst: u8) -> u16 {
        let val = self.read_reg(src);
        match (is_wide(src), is_wide(dst)) {
            (false, true) if self.is_6309() => match src & 0x0F {
                0x8 | 0x9 => self.get_d(),
                0xE | 0xF => self.get_w(),
                _ => val,
            },
            (false, true) => 0xFF00 | val,
            (true, false) if self.is_6309() && matches!(dst & 0x0F, 0x8 | 0xE) => val >> 8,
            (true, false) => val & 0x00FF,
            _ => val,
        }
    }

    /// TFR r0,r1 (0x1F): 6 cycles, 4 native.
    pub(crate) fn op_tfr<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let post = self.fetch8(bus);
        self.nvma_n(bus, 2);
        self.nvma_emu(bus);
        self.nvma_emu(bus);
        let (src, dst) = (post >> 4, post & 0x0F);
        let val = self.transfer_value(src, dst);
        self.write_reg(dst, val);
    }

    /// EXG r0,r1 (0x1E): 8 cycles, 5 native.
    pub(crate) fn op_exg<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let post = self.fetch8(bus);
        self.nvma_n(bus, 3);
        self.nvma_emu(bus);
        self.nvma_emu(bus);
        self.nvma_emu(bus);
        let (r0, r1) = (post >> 4, post & 0x0F);
        let to_r1 = self.transfer_value(r0, r1);
        let to_r0 = self.transfer_value(r1, r0);
        self.write_reg(r1, to_r1);
        self.write_reg(r0, to_r0);
    }
}
