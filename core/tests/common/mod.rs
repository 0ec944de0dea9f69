#![allow(dead_code)]

use coco_core::core::{Bus, HookAction, InterruptState};
use coco_core::cpu::{Cpu, ExecState, M6809, Model};

/// Minimal bus for testing: flat 64KB read/write memory, a cycle counter and
/// interrupt lines the test drives directly.
pub struct TestBus {
    pub memory: Vec<u8>,
    pub cycles: u64,
    pub lines: InterruptState,
    /// Every non-dead cycle as (is_read, address).
    pub trace: Vec<(bool, u16)>,
    pub record: bool,
    /// Raise IRQ once this many cycles have elapsed.
    pub irq_at: Option<u64>,
    pub stop_at: Option<u16>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
            cycles: 0,
            lines: InterruptState::default(),
            trace: Vec::new(),
            record: false,
            irq_at: None,
            stop_at: None,
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn set_vector(&mut self, vector: u16, target: u16) {
        self.load(vector, &target.to_be_bytes());
    }

    pub fn peek16(&self, addr: u16) -> u16 {
        u16::from_be_bytes([self.memory[addr as usize], self.memory[addr as usize + 1]])
    }
}

impl Bus for TestBus {
    fn cycle(&mut self, ncycles: u16, is_read: bool, address: u16, data: &mut u8) {
        self.cycles += u64::from(ncycles);
        if self.record && address != 0xFFFF {
            self.trace.push((is_read, address));
        }
        if is_read {
            *data = self.memory[address as usize];
        } else {
            self.memory[address as usize] = *data;
        }
        if let Some(at) = self.irq_at {
            if self.cycles >= at {
                self.lines.irq = true;
            }
        }
    }

    fn check_interrupts(&self) -> InterruptState {
        self.lines
    }

    fn instruction_hook(&mut self, pc: u16) -> HookAction {
        if self.stop_at == Some(pc) {
            HookAction::Stop
        } else {
            HookAction::Continue
        }
    }
}

/// A CPU already past reset, about to fetch at `pc`.
pub fn cpu_at(model: Model, pc: u16) -> M6809 {
    let mut cpu = M6809::with_model(model);
    cpu.pc = pc;
    cpu.set_state(ExecState::Fetch);
    cpu
}

/// Execute one instruction and return the cycles it took.
pub fn step(cpu: &mut M6809, bus: &mut TestBus) -> u64 {
    let before = bus.cycles;
    cpu.step(bus);
    bus.cycles - before
}

/// Load `program` at 0x1000, run one instruction and return its cycle count.
pub fn cycles_of(model: Model, native: bool, program: &[u8]) -> u64 {
    let mut cpu = cpu_at(model, 0x1000);
    if native {
        cpu.md = 0x01;
    }
    cpu.set_s(0x8000);
    cpu.u = 0x7000;
    cpu.x = 0x2000;
    cpu.y = 0x3000;
    let mut bus = TestBus::new();
    bus.load(0x1000, program);
    step(&mut cpu, &mut bus)
}

/// Execute one instruction including any internal-cycle or block-transfer
/// continuation, and return the cycles it took.
pub fn step_instruction(cpu: &mut M6809, bus: &mut TestBus) -> u64 {
    let before = bus.cycles;
    cpu.step(bus);
    while matches!(cpu.state(), ExecState::Tfm { .. } | ExecState::Compute { .. }) {
        cpu.step(bus);
    }
    bus.cycles - before
}
