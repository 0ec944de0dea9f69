mod addressing;
mod alu;
mod branch;
mod hd6309;
mod load_store;
mod stack;
mod transfer;

pub(crate) use addressing::Mode;

use crate::core::{Bus, Component, HookAction};
use crate::cpu::{
    Cpu,
    state::{CpuStateTrait, M6809State},
};

#[repr(u8)]
#[derive(Copy, Clone, Debug)]
pub enum CcFlag {
    C = 0x01, // Carry
    V = 0x02, // Overflow
    Z = 0x04, // Zero
    N = 0x08, // Negative
    I = 0x10, // IRQ mask
    H = 0x20, // Half carry
    F = 0x40, // FIRQ mask
    E = 0x80, // Entire
}

// HD6309 mode register bits
pub const MD_NATIVE: u8 = 0x01;
pub const MD_FIRQ_ALL: u8 = 0x02;
pub const MD_ILLEGAL: u8 = 0x40;
pub const MD_DIV0: u8 = 0x80;

pub const VEC_TRAP: u16 = 0xFFF0;
pub const VEC_SWI3: u16 = 0xFFF2;
pub const VEC_SWI2: u16 = 0xFFF4;
pub const VEC_FIRQ: u16 = 0xFFF6;
pub const VEC_IRQ: u16 = 0xFFF8;
pub const VEC_SWI: u16 = 0xFFFA;
pub const VEC_NMI: u16 = 0xFFFC;
pub const VEC_RESET: u16 = 0xFFFE;

/// Which member of the family is being emulated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Model {
    #[default]
    Mc6809,
    Hd6309,
}

impl Model {
    pub fn part_name(self) -> &'static str {
        match self {
            Model::Mc6809 => "MC6809",
            Model::Hd6309 => "HD6309",
        }
    }
}

/// What DIVD/DIVQ do when the quotient fits in 9 (17) signed bits but not
/// in 8 (16).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DivOverflowMode {
    /// Store the truncated quotient and remainder, set V.
    #[default]
    Truncate,
    /// Leave the registers untouched, set V.
    Abort,
}

/// Extended arithmetic waiting out its internal cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PendingOp {
    Divd(u8),
    Divq(u16),
    Muld(u16),
}

/// Resumable execution state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExecState {
    /// Vector fetch pending.
    Reset,
    /// Instruction boundary.
    Fetch,
    /// Bus released to a HALT request.
    Halted,
    /// Entire state stacked, waiting for an unmasked interrupt.
    Cwai,
    /// Waiting for any interrupt line.
    Sync,
    /// TFM in progress. `mode` is the low two bits of the opcode.
    Tfm { src: u8, dst: u8, mode: u8, start_pc: u16 },
    /// DIVD/DIVQ/MULD burning internal cycles before committing.
    Compute { op: PendingOp, remaining: u8, start_pc: u16 },
}

pub struct M6809 {
    // Registers
    pub a: u8,
    pub b: u8,
    pub e: u8,
    pub f: u8,
    pub dp: u8,
    pub x: u16,
    pub y: u16,
    pub u: u16,
    pub s: u16,
    pub pc: u16,
    pub v: u16,
    pub cc: u8,
    pub md: u8,

    /// Cleared when the bus asks for control back; `run()` returns.
    pub running: bool,
    pub div_overflow: DivOverflowMode,

    model: Model,
    pub(crate) state: ExecState,
    // Shared data latch for every bus cycle
    pub(crate) latch: u8,

    // Interrupt inputs as sampled after the last cycle
    nmi_armed: bool,
    nmi_line: bool,
    pub(crate) nmi_pending: bool,
    pub(crate) firq_line: bool,
    pub(crate) irq_line: bool,
    halt_line: bool,

    // Instruction hook already consulted for the current boundary
    hooked: bool,
    // Address of the first prefix/opcode byte of the current instruction
    pub(crate) instr_start: u16,
}

impl Default for M6809 {
    fn default() -> Self {
        Self::new()
    }
}

impl M6809 {
    pub fn new() -> Self {
        Self::with_model(Model::Mc6809)
    }

    pub fn with_model(model: Model) -> Self {
        Self {
            a: 0,
            b: 0,
            e: 0,
            f: 0,
            dp: 0,
            x: 0,
            y: 0,
            u: 0,
            s: 0,
            pc: 0,
            v: 0,
            cc: CcFlag::I as u8 | CcFlag::F as u8,
            md: 0,
            running: false,
            div_overflow: DivOverflowMode::default(),
            model,
            state: ExecState::Reset,
            latch: 0,
            nmi_armed: false,
            nmi_line: false,
            nmi_pending: false,
            firq_line: false,
            irq_line: false,
            halt_line: false,
            hooked: false,
            instr_start: 0,
        }
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn state(&self) -> ExecState {
        self.state
    }

    /// Force the execution state. Used by tests to start at a boundary
    /// without running the reset sequence.
    pub fn set_state(&mut self, state: ExecState) {
        self.state = state;
    }

    #[inline]
    pub(crate) fn is_6309(&self) -> bool {
        self.model == Model::Hd6309
    }

    /// HD6309 native mode: dead cycles removed, E and F stacked.
    #[inline]
    pub(crate) fn native(&self) -> bool {
        self.md & MD_NATIVE != 0
    }

    pub fn get_d(&self) -> u16 {
        u16::from_be_bytes([self.a, self.b])
    }

    pub fn set_d(&mut self, val: u16) {
        [self.a, self.b] = val.to_be_bytes();
    }

    pub fn get_w(&self) -> u16 {
        u16::from_be_bytes([self.e, self.f])
    }

    pub fn set_w(&mut self, val: u16) {
        [self.e, self.f] = val.to_be_bytes();
    }

    pub fn get_q(&self) -> u32 {
        u32::from_be_bytes([self.a, self.b, self.e, self.f])
    }

    pub fn set_q(&mut self, val: u32) {
        [self.a, self.b, self.e, self.f] = val.to_be_bytes();
    }

    /// Load S. The first load arms NMI.
    #[inline]
    pub fn set_s(&mut self, val: u16) {
        self.s = val;
        self.nmi_armed = true;
    }

    #[inline]
    pub(crate) fn set_flag(&mut self, flag: CcFlag, set: bool) {
        if set {
            self.cc |= flag as u8
        } else {
            self.cc &= !(flag as u8)
        }
    }

    #[inline]
    pub(crate) fn flag(&self, flag: CcFlag) -> bool {
        self.cc & flag as u8 != 0
    }

    // --- Bus cycles ---

    /// Run `n` cycles on the bus and latch the interrupt inputs afterwards.
    #[inline]
    pub(crate) fn bus_cycle<B: Bus + ?Sized>(&mut self, bus: &mut B, n: u16, is_read: bool, addr: u16) {
        bus.cycle(n, is_read, addr, &mut self.latch);
        self.sample_lines(bus);
    }

    #[inline]
    fn sample_lines<B: Bus + ?Sized>(&mut self, bus: &B) {
        let lines = bus.check_interrupts();
        if lines.nmi && !self.nmi_line && self.nmi_armed {
            self.nmi_pending = true;
        }
        self.nmi_line = lines.nmi;
        self.firq_line = lines.firq;
        self.irq_line = lines.irq;
        self.halt_line = lines.halt;
    }

    #[inline]
    pub(crate) fn read8<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u8 {
        self.bus_cycle(bus, 1, true, addr);
        self.latch
    }

    #[inline]
    pub(crate) fn write8<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, val: u8) {
        self.latch = val;
        self.bus_cycle(bus, 1, false, addr);
    }

    pub(crate) fn read16<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let hi = self.read8(bus, addr);
        let lo = self.read8(bus, addr.wrapping_add(1));
        u16::from_be_bytes([hi, lo])
    }

    pub(crate) fn write16<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16, val: u16) {
        let [hi, lo] = val.to_be_bytes();
        self.write8(bus, addr, hi);
        self.write8(bus, addr.wrapping_add(1), lo);
    }

    #[inline]
    pub(crate) fn fetch8<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u8 {
        let val = self.read8(bus, self.pc);
        self.pc = self.pc.wrapping_add(1);
        val
    }

    pub(crate) fn fetch16<B: Bus + ?Sized>(&mut self, bus: &mut B) -> u16 {
        let hi = self.fetch8(bus);
        let lo = self.fetch8(bus);
        u16::from_be_bytes([hi, lo])
    }

    /// Dead cycle: no valid memory address.
    #[inline]
    pub(crate) fn nvma<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.nvma_n(bus, 1);
    }

    pub(crate) fn nvma_n<B: Bus + ?Sized>(&mut self, bus: &mut B, n: u16) {
        if n > 0 {
            bus.dead_cycle(n, &mut self.latch);
            self.sample_lines(bus);
        }
    }

    /// Dead cycle that native mode skips.
    #[inline]
    pub(crate) fn nvma_emu<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if !self.native() {
            self.nvma(bus);
        }
    }

    /// Dummy read whose result is discarded.
    #[inline]
    pub(crate) fn peek<B: Bus + ?Sized>(&mut self, bus: &mut B, addr: u16) {
        self.bus_cycle(bus, 1, true, addr);
    }

    /// Dummy read of the next opcode byte that native mode skips.
    #[inline]
    pub(crate) fn peek_pc_emu<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if !self.native() {
            self.peek(bus, self.pc);
        }
    }

    // --- Interrupt recognition ---

    #[inline]
    fn firq_active(&self) -> bool {
        self.firq_line && !self.flag(CcFlag::F)
    }

    #[inline]
    fn irq_active(&self) -> bool {
        self.irq_line && !self.flag(CcFlag::I)
    }

    /// An interrupt the CPU would take at the next boundary.
    #[inline]
    pub(crate) fn interrupt_pending(&self) -> bool {
        self.nmi_pending || self.firq_active() || self.irq_active()
    }

    /// One state transition.
    pub fn execute_step<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        match self.state {
            ExecState::Reset => self.reset_sequence(bus),
            ExecState::Fetch => self.boundary(bus),
            ExecState::Halted => {
                if self.halt_line {
                    self.nvma(bus);
                } else {
                    self.state = ExecState::Fetch;
                }
            }
            ExecState::Sync => {
                if self.nmi_pending || self.firq_line || self.irq_line {
                    self.state = ExecState::Fetch;
                } else {
                    self.nvma(bus);
                }
            }
            ExecState::Cwai => self.cwai_wait(bus),
            ExecState::Tfm { .. } => self.tfm_step(bus),
            ExecState::Compute { .. } => self.compute_step(bus),
        }
        if !bus.running() {
            self.running = false;
        }
    }

    fn reset_sequence<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.dp = 0;
        self.md = 0;
        self.cc |= CcFlag::I as u8 | CcFlag::F as u8;
        self.nmi_armed = false;
        self.nmi_pending = false;
        self.hooked = false;
        self.nvma(bus);
        self.pc = self.read16(bus, VEC_RESET);
        self.nvma(bus);
        self.state = ExecState::Fetch;
    }

    fn boundary<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if self.halt_line {
            self.state = ExecState::Halted;
            self.nvma(bus);
            return;
        }
        if self.nmi_pending {
            self.nmi_pending = false;
            self.hooked = false;
            self.take_nmi(bus);
            return;
        }
        if self.firq_active() {
            self.hooked = false;
            self.take_firq(bus);
            return;
        }
        if self.irq_active() {
            self.hooked = false;
            self.take_irq(bus);
            return;
        }
        if !self.hooked {
            self.hooked = true;
            if bus.instruction_hook(self.pc) == HookAction::Stop {
                self.running = false;
                return;
            }
        }
        self.hooked = false;
        self.execute_instruction(bus);
    }

    fn execute_instruction<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.instr_start = self.pc;
        let mut opcode = self.fetch8(bus);
        let mut page = 0;
        // Prefixes nest; the last one selects the page.
        while opcode == 0x10 || opcode == 0x11 {
            page = opcode;
            opcode = self.fetch8(bus);
        }
        match page {
            0x10 => self.execute_page2(opcode, bus),
            0x11 => self.execute_page3(opcode, bus),
            _ => self.execute_page0(opcode, bus),
        }
    }

    fn execute_page0<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let h6309 = self.is_6309();
        match opcode {
            // Memory unary/shift: direct (0x00), indexed (0x60), extended (0x70)
            0x00..=0x0F | 0x60..=0x7F => self.op_memory_unary(opcode, bus),

            // Misc inherent/immediate
            0x12 => self.op_nop(bus),
            0x13 => self.op_sync(bus),
            0x14 if h6309 => self.op_sexw(bus),
            0x16 => self.op_lbra(bus),
            0x17 => self.op_lbsr(bus),
            0x19 => self.op_daa(bus),
            0x1A => self.op_orcc(bus),
            0x1C => self.op_andcc(bus),
            0x1D => self.op_sex(bus),
            0x1E => self.op_exg(bus),
            0x1F => self.op_tfr(bus),

            // Short branches
            0x20..=0x2F => self.op_branch(opcode, bus),

            // LEA instructions
            0x30..=0x33 => self.op_lea(opcode, bus),

            // Stack operations
            0x34 => self.op_push(bus, true),
            0x35 => self.op_pull(bus, true),
            0x36 => self.op_push(bus, false),
            0x37 => self.op_pull(bus, false),
            0x38 if !h6309 => self.op_andcc_alias(bus),

            // Subroutine / Return / Interrupt
            0x39 => self.op_rts(bus),
            0x3A => self.op_abx(bus),
            0x3B => self.op_rti(bus),
            0x3C => self.op_cwai(bus),
            0x3D => self.op_mul(bus),
            0x3E if !h6309 => self.op_reset_vector(bus),
            0x3F => self.op_swi(bus, VEC_SWI),

            // Accumulator inherent (A: 0x40, B: 0x50)
            0x40..=0x5F => self.op_inherent_ab(opcode, bus),

            // ALU/load/store, A side then B side
            0x80..=0xFF => self.op_alu_page0(opcode, bus),

            _ => self.op_undefined(bus),
        }
    }

    fn execute_page2<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let h6309 = self.is_6309();
        match opcode {
            0x20 => self.op_lbra_page2(bus),
            0x21..=0x2F => self.op_long_branch(opcode, bus),
            0x30..=0x37 if h6309 => self.op_register_alu(opcode, bus),
            0x38 if h6309 => self.op_push_w(bus, true),
            0x39 if h6309 => self.op_pull_w(bus, true),
            0x3A if h6309 => self.op_push_w(bus, false),
            0x3B if h6309 => self.op_pull_w(bus, false),
            0x3F => self.op_swi(bus, VEC_SWI2),
            0x40..=0x5F if h6309 => self.op_inherent_dw(opcode, bus),
            0x80..=0xFF => self.op_alu_page2(opcode, bus),
            _ if h6309 => self.op_illegal(bus),
            // The 6809 ignores an unused prefix.
            _ => self.execute_page0(opcode, bus),
        }
    }

    fn execute_page3<B: Bus + ?Sized>(&mut self, opcode: u8, bus: &mut B) {
        let h6309 = self.is_6309();
        match opcode {
            0x30..=0x37 if h6309 => self.op_bit_transfer(opcode, bus),
            0x38..=0x3B if h6309 => self.op_tfm(opcode, bus),
            0x3C if h6309 => self.op_bitmd(bus),
            0x3D if h6309 => self.op_ldmd(bus),
            0x3F => self.op_swi(bus, VEC_SWI3),
            0x40..=0x5F if h6309 => self.op_inherent_ef(opcode, bus),
            0x80..=0xFF => self.op_alu_page3(opcode, bus),
            _ if h6309 => self.op_illegal(bus),
            _ => self.execute_page0(opcode, bus),
        }
    }

    /// Opcode with no defined behaviour. The 6309 traps; the 6809 treats it
    /// as a two-cycle no-op.
    pub(crate) fn op_illegal<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        if self.is_6309() {
            self.trap(bus, MD_ILLEGAL);
        } else {
            self.op_nop(bus);
        }
    }

    fn op_undefined<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.op_illegal(bus);
    }
}

impl Component for M6809 {
    fn name(&self) -> &'static str {
        self.model.part_name()
    }

    fn reset(&mut self) {
        self.state = ExecState::Reset;
        self.running = false;
    }
}

impl Cpu for M6809 {
    fn run<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.running = true;
        while self.running {
            self.execute_step(bus);
        }
    }

    fn step<B: Bus + ?Sized>(&mut self, bus: &mut B) {
        self.execute_step(bus);
    }

    fn is_sleeping(&self) -> bool {
        matches!(
            self.state,
            ExecState::Cwai | ExecState::Sync | ExecState::Halted
        )
    }
}

impl CpuStateTrait for M6809 {
    type Snapshot = M6809State;

    fn snapshot(&self) -> M6809State {
        M6809State {
            model: self.model,
            a: self.a,
            b: self.b,
            e: self.e,
            f: self.f,
            dp: self.dp,
            x: self.x,
            y: self.y,
            u: self.u,
            s: self.s,
            pc: self.pc,
            v: self.v,
            cc: self.cc,
            md: self.md,
            state: self.state,
            nmi_armed: self.nmi_armed,
            nmi_pending: self.nmi_pending,
            nmi_line: self.nmi_line,
            firq_line: self.firq_line,
            irq_line: self.irq_line,
            halt_line: self.halt_line,
            div_overflow: self.div_overflow,
        }
    }

    fn restore(&mut self, snap: &M6809State) {
        self.model = snap.model;
        self.a = snap.a;
        self.b = snap.b;
        self.e = snap.e;
        self.f = snap.f;
        self.dp = snap.dp;
        self.x = snap.x;
        self.y = snap.y;
        self.u = snap.u;
        self.s = snap.s;
        self.pc = snap.pc;
        self.v = snap.v;
        self.cc = snap.cc;
        self.md = snap.md;
        self.state = snap.state;
        self.nmi_armed = snap.nmi_armed;
        self.nmi_pending = snap.nmi_pending;
        self.nmi_line = snap.nmi_line;
        self.firq_line = snap.firq_line;
        self.irq_line = snap.irq_line;
        self.halt_line = snap.halt_line;
        self.div_overflow = snap.div_overflow;
        self.hooked = false;
    }
}
