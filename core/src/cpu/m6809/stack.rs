use super::{CcFlag, ExecState, M6809, MD_FIRQ_ALL, VEC_FIRQ, VEC_IRQ, VEC_NMI, VEC_RESET, VEC_SWI, VEC_TRAP};
use crate::core::Bus;

impl M6809 {
    // --- Stack primitives. `system` selects S, otherwise U. ---

    pub(crate) fn push8<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool, val: u8) {
        let sp = if system {
            self.s = self.s.wrapping_sub(1);
            self.s
        } else {
            self.u = self.u.wrapping_sub(1);
            self.u
        };
        self.write8(bus, sp, val);
    }

    /// Low byte first, so the value reads big-endian from the new SP.
    pub(crate) fn push16<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool, val: u16) {
        let [hi, lo] = val.to_be_bytes();
        self.push8(bus, system, lo);
        self.push8(bus, system, hi);
    }

    pub(crate) fn pull8<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool) -> u8 {
        let sp = if system { self.s } else { self.u };
        let val = self.read8(bus, sp);
        if system {
            self.s = sp.wrapping_add(1);
        } else {
            self.u = sp.wrapping_add(1);
        }
        val
    }

    pub(crate) fn pull16<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool) -> u16 {
        let hi = self.pull8(bus, system);
        let lo = self.pull8(bus, system);
        u16::from_be_bytes([hi, lo])
    }

    /// PSHS (0x34) / PSHU (0x36).
    /// Postbyte bits, pushed high to low: PC, U/S, Y, X, DP, B, A, CC.
    /// 5 cycles + 1 per byte, 4 + 1 per byte native.
    pub(crate) fn op_push<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool) {
        let post = self.fetch8(bus);
        self.nvma_emu(bus);
        self.nvma(bus);
        self.peek(bus, if system { self.s } else { self.u });

        if post & 0x80 != 0 {
            self.push16(bus, system, self.pc);
        }
        if post & 0x40 != 0 {
            let other = if system { self.u } else { self.s };
            self.push16(bus, system, other);
        }
        if post & 0x20 != 0 {
            self.push16(bus, system, self.y);
        }
        if post & 0x10 != 0 {
            self.push16(bus, system, self.x);
        }
        if post & 0x08 != 0 {
            self.push8(bus, system, self.dp);
        }
        if post & 0x04 != 0 {
            self.push8(bus, system, self.b);
        }
        if post & 0x02 != 0 {
            self.push8(bus, system, self.a);
        }
        if post & 0x01 != 0 {
            self.push8(bus, system, self.cc);
        }
    }

    /// PULS (0x35) / PULU (0x37). Same cost as the pushes.
    pub(crate) fn op_pull<B: Bus + ?Sized>(&mut self, bus: &mut B, system: bool) {
        let post = self.fetch8(bus);
        self.nvma_emu(bus);
        self.nvma(bus);

        if post & 0x01 != 0 {
            self.cc = self.pull8(bus, system);
        }
        if post & 0x02 != 0 {
            self.a = self.pull8(bus, system);
        }
        if post & 0x04 != 0 {
            self.b = self.pull8(bus, system);
        }
        if post & 0x08 != 0 {
            self.dp = self.pull8(bus, system);
        }
        if post & 0x10 != 0 {
            self.x = self.pull16(bus, system);
        }
        if post & 0x20 != 0 {
            self.y = self.pull16(bus, system);
        }
        if post & 0x40 != 0 {
            let other = self.pull16(bus, system);
            if system {
                self.u = other;
            } else {
                self.set_s(other);
            }
        }
        if post & 0x80 != 0 {
            self.pc = self.pull16(bus, system);
        }
        self.peek(bus, if system { self.s } else { self.u });
    }

    /// Stack every register on S with E set. Native mode includes E and F.
    pub(crate) fn push_entire<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.set_flag(CcFlag::E, true);
        self.push16(bus, true, self.pc);
        self.push16(bus, true, self.u);
        self.push16(bus, true, self.y);
        self.push16(bus, true, self.x);
        self.push8(bus, true, self.dp);
        if self.native() {
            self.push8(bus, true, self.f);
            self.push8(bus, true, self.e);
        }
        self.push8(bus, true, self.b);
        self.push8(bus, true, self.a);
        self.push8(bus, true, self.cc);
    }

    /// Load PC from an interrupt vector: dead cycle, two reads, dead cycle.
    pub(crate) fn vector<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        self.nvma(bus);
        self.pc = self.read16(bus, addr);
        self.nvma(bus);
    }

    fn interrupt_prologue<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek(bus, self.pc);
        self.peek(bus, self.pc);
        self.nvma(bus);
    }

    /// NMI: 19 cycles (21 native).
    pub(crate) fn take_nmi<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.interrupt_prologue(bus);
        self.push_entire(bus);
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.vector(bus, VEC_NMI);
    }

    /// FIRQ: PC and CC only, 10 cycles, unless MD.FM asks for the entire state.
    pub(crate) fn take_firq<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.interrupt_prologue(bus);
        if self.md & MD_FIRQ_ALL != 0 {
            self.push_entire(bus);
        } else {
            self.set_flag(CcFlag::E, false);
            self.push16(bus, true, self.pc);
            self.push8(bus, true, self.cc);
        }
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.vector(bus, VEC_FIRQ);
    }

    /// IRQ: 19 cycles (21 native).
    pub(crate) fn take_irq<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.interrupt_prologue(bus);
        self.push_entire(bus);
        self.set_flag(CcFlag::I, true);
        self.vector(bus, VEC_IRQ);
    }

    /// SWI (0x3F), SWI2 (0x10 0x3F), SWI3 (0x11 0x3F).
    /// Only SWI masks interrupts. 19 cycles, 20 for the prefixed forms.
    pub(crate) fn op_swi<B: Bus + ?Sized>(&mut self, bus: &mut B, vector: u16) {
        self.peek(bus, self.pc);
        self.nvma(bus);
        self.push_entire(bus);
        if vector == VEC_SWI {
            self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        }
        self.vector(bus, vector);
    }

    /// Undocumented 6809 0x3E: an SWI through the reset vector.
    pub(crate) fn op_reset_vector<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek(bus, self.pc);
        self.nvma(bus);
        self.push_entire(bus);
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.vector(bus, VEC_RESET);
    }

    /// HD6309 trap on an illegal opcode or divide by zero. Sets `md_flag` in MD.
    pub(crate) fn trap<B: Bus + ?Sized>(&mut self, bus: &mut B, md_flag: u8) {
        log::debug!(
            "{} trap at {:04X} (MD {:02X})",
            self.model.part_name(),
            self.instr_start,
            md_flag
        );
        self.md |= md_flag;
        self.nvma(bus);
        self.push_entire(bus);
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.vector(bus, VEC_TRAP);
    }

    /// RTI (0x3B): 6 cycles with E clear, 15 (17 native) with E set.
    pub(crate) fn op_rti<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek(bus, self.pc);
        self.cc = self.pull8(bus, true);
        if self.flag(CcFlag::E) {
            self.a = self.pull8(bus, true);
            self.b = self.pull8(bus, true);
            if self.native() {
                self.e = self.pull8(bus, true);
                self.f = self.pull8(bus, true);
            }
            self.dp = self.pull8(bus, true);
            self.x = self.pull16(bus, true);
            self.y = self.pull16(bus, true);
            self.u = self.pull16(bus, true);
        }
        self.pc = self.pull16(bus, true);
        self.nvma(bus);
    }

    /// CWAI (0x3C): AND CC with the immediate, stack the entire state and
    /// wait. 20 cycles to the vector (22 native).
    pub(crate) fn op_cwai<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        let mask = self.fetch8(bus);
        self.cc &= mask;
        self.peek(bus, self.pc);
        self.nvma(bus);
        self.push_entire(bus);
        self.state = ExecState::Cwai;
    }

    /// One pass of the CWAI wait. The registers are already stacked so the
    /// vector is fetched directly.
    pub(crate) fn cwai_wait<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if self.nmi_pending {
            self.nmi_pending = false;
            self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
            self.vector(bus, VEC_NMI);
        } else if self.firq_active() {
            self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
            self.vector(bus, VEC_FIRQ);
        } else if self.irq_active() {
            self.set_flag(CcFlag::I, true);
            self.vector(bus, VEC_IRQ);
        } else {
            self.nvma(bus);
            return;
        }
        self.state = ExecState::Fetch;
    }

    /// SYNC (0x13): wait for any interrupt line, masked or not.
    pub(crate) fn op_sync<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.peek(bus, self.pc);
        self.state = ExecState::Sync;
    }
}
