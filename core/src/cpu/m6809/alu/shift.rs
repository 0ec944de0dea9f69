use crate::cpu::m6809::{CcFlag, M6809};

impl M6809 {
    // --- Internal Shift/Rotate Helpers ---

    /// N, Z, C from a left shift; V = N xor C.
    #[inline]
    fn set_flags_shift_left(&mut self, negative: bool, zero: bool, carry: bool) {
        self.set_flag(CcFlag::N, negative);
        self.set_flag(CcFlag::Z, zero);
        self.set_flag(CcFlag::V, negative ^ carry);
        self.set_flag(CcFlag::C, carry);
    }

    /// N, Z, C from a right shift; V unaffected.
    #[inline]
    fn set_flags_shift_right(&mut self, negative: bool, zero: bool, carry: bool) {
        self.set_flag(CcFlag::N, negative);
        self.set_flag(CcFlag::Z, zero);
        self.set_flag(CcFlag::C, carry);
    }

    #[inline]
    pub(crate) fn perform_asl(&mut self, val: u8) -> u8 {
        let result = val << 1;
        self.set_flags_shift_left(result & 0x80 != 0, result == 0, val & 0x80 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_rol(&mut self, val: u8) -> u8 {
        let result = (val << 1) | self.flag(CcFlag::C) as u8;
        self.set_flags_shift_left(result & 0x80 != 0, result == 0, val & 0x80 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_asr(&mut self, val: u8) -> u8 {
        let result = ((val as i8) >> 1) as u8;
        self.set_flags_shift_right(result & 0x80 != 0, result == 0, val & 0x01 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_lsr(&mut self, val: u8) -> u8 {
        let result = val >> 1;
        self.set_flags_shift_right(false, result == 0, val & 0x01 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_ror(&mut self, val: u8) -> u8 {
        let result = (val >> 1) | ((self.flag(CcFlag::C) as u8) << 7);
        self.set_flags_shift_right(result & 0x80 != 0, result == 0, val & 0x01 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_asl16(&mut self, val: u16) -> u16 {
        let result = val << 1;
        self.set_flags_shift_left(result & 0x8000 != 0, result == 0, val & 0x8000 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_rol16(&mut self, val: u16) -> u16 {
        let result = (val << 1) | self.flag(CcFlag::C) as u16;
        self.set_flags_shift_left(result & 0x8000 != 0, result == 0, val & 0x8000 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_asr16(&mut self, val: u16) -> u16 {
        let result = ((val as i16) >> 1) as u16;
        self.set_flags_shift_right(result & 0x8000 != 0, result == 0, val & 0x0001 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_lsr16(&mut self, val: u16) -> u16 {
        let result = val >> 1;
        self.set_flags_shift_right(false, result == 0, val & 0x0001 != 0);
        result
    }

    #[inline]
    pub(crate) fn perform_ror16(&mut self, val: u16) -> u16 {
        let result = (val >> 1) | ((self.flag(CcFlag::C) as u16) << 15);
        self.set_flags_shift_right(result & 0x8000 != 0, result == 0, val & 0x0001 != 0);
        result
    }
}
