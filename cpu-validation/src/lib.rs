use coco_core::core::{Bus, DEAD_ADDRESS, InterruptState};
use coco_core::cpu::{Cpu, ExecState, M6809, Model};
use serde::{Deserialize, Serialize};

// --- TracingBus: flat 64KB memory with cycle-by-cycle recording ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusOp {
    Read,
    Write,
    Internal,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BusCycle {
    pub addr: u16,
    pub data: u8,
    pub op: BusOp,
}

pub struct TracingBus {
    pub memory: Vec<u8>,
    pub cycles: Vec<BusCycle>,
}

impl TracingBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x10000],
            cycles: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }

    pub fn clear_cycles(&mut self) {
        self.cycles.clear();
    }
}

impl Default for TracingBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for TracingBus {
    fn cycle(&mut self, ncycles: u16, is_read: bool, address: u16, data: &mut u8) {
        for _ in 0..ncycles {
            let op = if is_read {
                *data = self.memory[address as usize];
                BusOp::Read
            } else {
                self.memory[address as usize] = *data;
                BusOp::Write
            };
            self.cycles.push(BusCycle {
                addr: address,
                data: *data,
                op,
            });
        }
    }

    fn dead_cycle(&mut self, ncycles: u16, data: &mut u8) {
        *data = self.memory[DEAD_ADDRESS as usize];
        for _ in 0..ncycles {
            self.cycles.push(BusCycle {
                addr: DEAD_ADDRESS,
                data: *data,
                op: BusOp::Internal,
            });
        }
    }

    fn check_interrupts(&self) -> InterruptState {
        InterruptState::default()
    }
}

// --- JSON test vector types ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub initial: CpuState,
    #[serde(rename = "final")]
    pub final_state: CpuState,
    pub cycles: Vec<(u16, u8, BusOp)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    pub pc: u16,
    pub s: u16,
    pub u: u16,
    pub a: u8,
    pub b: u8,
    pub dp: u8,
    pub x: u16,
    pub y: u16,
    pub cc: u8,
    pub ram: Vec<(u16, u8)>,
}

impl CpuState {
    /// Register half of the state; `ram` is left empty.
    pub fn capture(cpu: &M6809) -> Self {
        Self {
            pc: cpu.pc,
            s: cpu.s,
            u: cpu.u,
            a: cpu.a,
            b: cpu.b,
            dp: cpu.dp,
            x: cpu.x,
            y: cpu.y,
            cc: cpu.cc,
            ram: Vec::new(),
        }
    }

    /// A CPU at an instruction boundary holding these registers, with `ram`
    /// written into `bus`.
    pub fn apply(&self, model: Model, bus: &mut TracingBus) -> M6809 {
        let mut cpu = M6809::with_model(model);
        cpu.pc = self.pc;
        cpu.set_s(self.s);
        cpu.u = self.u;
        cpu.a = self.a;
        cpu.b = self.b;
        cpu.dp = self.dp;
        cpu.x = self.x;
        cpu.y = self.y;
        cpu.cc = self.cc;
        cpu.set_state(ExecState::Fetch);
        for &(addr, val) in &self.ram {
            bus.memory[addr as usize] = val;
        }
        cpu
    }
}

// --- Cycle table ---

/// One row of the checked-in cycle table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleEntry {
    pub name: String,
    /// Instruction bytes as space-separated hex, e.g. "10 8e 12 34".
    pub bytes: String,
    /// MC6809, and HD6309 in emulation mode.
    pub cycles: u64,
    /// HD6309 native mode, where listed.
    #[serde(default)]
    pub native: Option<u64>,
    /// Only decoded by the HD6309.
    #[serde(default)]
    pub hd6309_only: bool,
    /// Memory written before the run, e.g. a non-zero divisor.
    #[serde(default)]
    pub ram: Vec<(u16, u8)>,
    /// Starting W, for block transfers.
    #[serde(default)]
    pub w: Option<u16>,
}

impl CycleEntry {
    pub fn program(&self) -> Result<Vec<u8>, std::num::ParseIntError> {
        self.bytes
            .split_whitespace()
            .map(|b| u8::from_str_radix(b, 16))
            .collect()
    }
}

pub fn load_cycle_table(json: &str) -> serde_json::Result<Vec<CycleEntry>> {
    serde_json::from_str(json)
}

/// Where [`trace_instruction`] places the program.
pub const PROGRAM_BASE: u16 = 0x1000;

/// Run `program` as a single instruction from a fixed register setup and
/// return every bus cycle it produced.
///
/// S = $8000, U = $7000, X = $2000, Y = $3000, all other memory zero.
pub fn trace_instruction(model: Model, native: bool, program: &[u8]) -> Vec<BusCycle> {
    trace(model, native, program, &[], None)
}

/// [`trace_instruction`] for a table row, with its memory and W applied.
pub fn trace_entry(
    model: Model,
    native: bool,
    entry: &CycleEntry,
) -> Result<Vec<BusCycle>, std::num::ParseIntError> {
    let program = entry.program()?;
    Ok(trace(model, native, &program, &entry.ram, entry.w))
}

fn trace(
    model: Model,
    native: bool,
    program: &[u8],
    ram: &[(u16, u8)],
    w: Option<u16>,
) -> Vec<BusCycle> {
    let mut cpu = M6809::with_model(model);
    cpu.pc = PROGRAM_BASE;
    cpu.set_s(0x8000);
    cpu.u = 0x7000;
    cpu.x = 0x2000;
    cpu.y = 0x3000;
    if let Some(w) = w {
        cpu.set_w(w);
    }
    if native {
        cpu.md = 0x01;
    }
    cpu.set_state(ExecState::Fetch);

    let mut bus = TracingBus::new();
    for &(addr, val) in ram {
        bus.memory[addr as usize] = val;
    }
    bus.load(PROGRAM_BASE, program);
    cpu.step(&mut bus);
    while matches!(cpu.state(), ExecState::Tfm { .. } | ExecState::Compute { .. }) {
        cpu.step(&mut bus);
    }
    bus.cycles
}
