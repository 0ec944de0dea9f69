use coco_core::cpu::{CcFlag, Cpu, CpuStateTrait, ExecState, M6809, Model};
mod common;
use common::{TestBus, cpu_at, step};

const NMI_HANDLER: u16 = 0x3000;
const FIRQ_HANDLER: u16 = 0x3100;
const IRQ_HANDLER: u16 = 0x3200;

fn interrupt_bus() -> TestBus {
    let mut bus = TestBus::new();
    bus.set_vector(0xFFFC, NMI_HANDLER);
    bus.set_vector(0xFFF6, FIRQ_HANDLER);
    bus.set_vector(0xFFF8, IRQ_HANDLER);
    for handler in [NMI_HANDLER, FIRQ_HANDLER, IRQ_HANDLER] {
        bus.load(handler, &[0x3B]); // RTI
    }
    // NOPs
    bus.load(0x1000, &[0x12; 16]);
    bus
}

fn armed_cpu() -> M6809 {
    let mut cpu = cpu_at(Model::Mc6809, 0x1000);
    cpu.set_s(0x0200);
    cpu.cc = 0;
    cpu
}

// ===== Reset =====

#[test]
fn test_reset_loads_vector_and_masks() {
    let mut cpu = M6809::new();
    let mut bus = TestBus::new();
    bus.set_vector(0xFFFE, 0xC000);
    cpu.dp = 0x12;
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0xC000);
    assert_eq!(cpu.dp, 0);
    assert_eq!(cpu.cc & 0x50, 0x50);
    assert_eq!(cpu.state(), ExecState::Fetch);
}

// ===== Entry sequences =====

#[test]
fn test_irq_stacks_entire_state_in_19_cycles() {
    let mut cpu = armed_cpu();
    cpu.a = 0x11;
    cpu.b = 0x22;
    cpu.x = 0x4455;
    let mut bus = interrupt_bus();
    bus.lines.irq = true;

    step(&mut cpu, &mut bus); // NOP latches the line
    assert_eq!(step(&mut cpu, &mut bus), 19);
    assert_eq!(cpu.pc, IRQ_HANDLER);
    assert_eq!(cpu.s, 0x0200 - 12);
    // CC on top of the stack has E set
    assert_eq!(bus.memory[0x01F4] & CcFlag::E as u8, CcFlag::E as u8);
    assert_eq!(bus.memory[0x01F5], 0x11);
    assert_eq!(bus.memory[0x01F6], 0x22);
    assert_eq!(bus.peek16(0x01FE), 0x1001);
    assert!(cpu.cc & CcFlag::I as u8 != 0);
    assert!(cpu.cc & CcFlag::F as u8 == 0, "IRQ leaves F alone");
}

#[test]
fn test_firq_stacks_pc_and_cc_only() {
    let mut cpu = armed_cpu();
    let mut bus = interrupt_bus();
    bus.lines.firq = true;

    step(&mut cpu, &mut bus);
    assert_eq!(step(&mut cpu, &mut bus), 10);
    assert_eq!(cpu.pc, FIRQ_HANDLER);
    assert_eq!(cpu.s, 0x0200 - 3);
    assert_eq!(bus.memory[0x01FD] & CcFlag::E as u8, 0);
    assert_eq!(cpu.cc & 0x50, 0x50);

    // RTI with E clear: 6 cycles
    bus.lines.firq = false;
    assert_eq!(step(&mut cpu, &mut bus), 6);
    assert_eq!(cpu.pc, 0x1001);
    assert_eq!(cpu.s, 0x0200);
}

#[test]
fn test_masked_irq_is_ignored() {
    let mut cpu = armed_cpu();
    cpu.cc = CcFlag::I as u8;
    let mut bus = interrupt_bus();
    bus.lines.irq = true;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1002);
}

// ===== Priority =====

#[test]
fn test_nmi_then_firq_then_irq() {
    let mut cpu = armed_cpu();
    let mut bus = interrupt_bus();
    bus.lines.nmi = true;
    bus.lines.firq = true;
    bus.lines.irq = true;

    step(&mut cpu, &mut bus);
    let mut order = Vec::new();
    for _ in 0..6 {
        step(&mut cpu, &mut bus);
        match cpu.pc {
            NMI_HANDLER => {
                order.push("NMI");
                bus.lines.nmi = false;
            }
            FIRQ_HANDLER => {
                order.push("FIRQ");
                bus.lines.firq = false;
            }
            IRQ_HANDLER => {
                order.push("IRQ");
                bus.lines.irq = false;
            }
            _ => {}
        }
    }
    assert_eq!(order, ["NMI", "FIRQ", "IRQ"]);
}

#[test]
fn test_nmi_ignored_until_s_loaded() {
    let mut cpu = cpu_at(Model::Mc6809, 0x1000);
    let mut bus = interrupt_bus();
    bus.load(0x1000, &[0x12, 0x10, 0xCE, 0x02, 0x00, 0x12, 0x12, 0x12]); // NOP; LDS #$0200; NOPs
    bus.lines.nmi = true;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1005, "edge before LDS is dropped");

    bus.lines.nmi = false;
    step(&mut cpu, &mut bus);
    bus.lines.nmi = true;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, NMI_HANDLER);
}

#[test]
fn test_nmi_is_edge_triggered() {
    let mut cpu = armed_cpu();
    let mut bus = interrupt_bus();
    bus.lines.nmi = true;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, NMI_HANDLER);
    // Line still high: the RTI returns and no second NMI follows
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1002);
}

/// A restored CPU remembers the NMI line was already high, so a held line
/// does not look like a fresh edge.
#[test]
fn test_restore_keeps_sampled_nmi_line() {
    let mut cpu = armed_cpu();
    let mut bus = interrupt_bus();
    bus.lines.nmi = true;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, NMI_HANDLER);

    let mut copy = M6809::with_model(Model::Mc6809);
    copy.restore(&cpu.snapshot());
    let mut copy_bus = interrupt_bus();
    copy_bus.memory.clone_from(&bus.memory);
    copy_bus.lines = bus.lines;

    for _ in 0..2 {
        step(&mut cpu, &mut bus);
        step(&mut copy, &mut copy_bus);
    }
    assert_eq!(cpu.pc, 0x1002);
    assert_eq!(copy.pc, cpu.pc);
    assert_eq!(copy.s, cpu.s);
}

// ===== Waits =====

#[test]
fn test_cwai_reaches_vector_in_20_cycles() {
    let mut cpu = cpu_at(Model::Mc6809, 0x1000);
    cpu.set_s(0x0200);
    let mut bus = interrupt_bus();
    bus.load(0x1000, &[0x3C, 0xEF]); // CWAI #$EF
    bus.lines.irq = true;

    assert_eq!(step(&mut cpu, &mut bus), 16);
    assert_eq!(cpu.state(), ExecState::Cwai);
    assert!(cpu.is_sleeping());
    assert_eq!(step(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc, IRQ_HANDLER);
    assert_eq!(cpu.s, 0x0200 - 12);
}

#[test]
fn test_cwai_waits_without_interrupt() {
    let mut cpu = armed_cpu();
    let mut bus = interrupt_bus();
    bus.load(0x1000, &[0x3C, 0xFF]);
    step(&mut cpu, &mut bus);
    for _ in 0..10 {
        assert_eq!(step(&mut cpu, &mut bus), 1);
    }
    assert_eq!(cpu.state(), ExecState::Cwai);
}

#[test]
fn test_sync_released_by_masked_interrupt() {
    let mut cpu = armed_cpu();
    cpu.cc = CcFlag::I as u8;
    let mut bus = interrupt_bus();
    bus.load(0x1000, &[0x13, 0x12]); // SYNC; NOP
    assert_eq!(step(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.state(), ExecState::Sync);
    assert_eq!(step(&mut cpu, &mut bus), 1);

    bus.lines.irq = true;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.state(), ExecState::Fetch);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1002, "masked IRQ only ends the wait");
}

#[test]
fn test_halt_releases_bus() {
    let mut cpu = armed_cpu();
    let mut bus = interrupt_bus();
    bus.lines.halt = true;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.state(), ExecState::Halted);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1001);

    bus.lines.halt = false;
    step(&mut cpu, &mut bus); // last halted cycle sees the release
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1002);
}

// ===== Instruction hook =====

#[test]
fn test_hook_stop_ends_run_once() {
    let mut cpu = armed_cpu();
    let mut bus = interrupt_bus();
    bus.stop_at = Some(0x1003);
    cpu.run(&mut bus);
    assert_eq!(cpu.pc, 0x1003);
    assert!(!cpu.running);
    // Resuming executes the instruction instead of stopping again
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.pc, 0x1004);
}
