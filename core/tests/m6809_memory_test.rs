use coco_core::cpu::{CcFlag, M6809, Model};
mod common;
use common::{TestBus, cpu_at, step};

fn setup(program: &[u8], prepare: impl FnOnce(&mut M6809, &mut TestBus)) -> (M6809, TestBus) {
    let mut cpu = cpu_at(Model::Mc6809, 0x1000);
    cpu.cc = 0;
    cpu.set_s(0x8000);
    let mut bus = TestBus::new();
    bus.load(0x1000, program);
    prepare(&mut cpu, &mut bus);
    (cpu, bus)
}

fn flag(cpu: &M6809, f: CcFlag) -> bool {
    cpu.cc & f as u8 != 0
}

// ===== Direct read-modify-write =====

/// Walk one byte through the whole direct-mode unary row, checking memory
/// and carry after each instruction.
#[test]
fn test_direct_unary_row() {
    #[rustfmt::skip]
    let steps: &[(u8, u8, bool)] = &[
        (0x00, 0xFF, true),  // NEG
        (0x03, 0x00, true),  // COM
        (0x0C, 0x01, true),  // INC leaves C alone
        (0x08, 0x02, false), // ASL
        (0x06, 0x01, false), // ROR
        (0x04, 0x00, true),  // LSR
        (0x0A, 0xFF, true),  // DEC leaves C alone
        (0x07, 0xFF, true),  // ASR keeps the sign
        (0x09, 0xFF, true),  // ROL pulls C into bit 0
        (0x0F, 0x00, false), // CLR
    ];
    let program: Vec<u8> = steps.iter().flat_map(|&(op, _, _)| [op, 0x10]).collect();
    let (mut cpu, mut bus) = setup(&program, |cpu, bus| {
        cpu.dp = 0x20;
        bus.memory[0x2010] = 0x01;
    });

    for &(op, value, carry) in steps {
        step(&mut cpu, &mut bus);
        assert_eq!(bus.memory[0x2010], value, "opcode {op:02X}");
        assert_eq!(flag(&cpu, CcFlag::C), carry, "opcode {op:02X} carry");
    }
    assert!(flag(&cpu, CcFlag::Z));
    assert_eq!(cpu.pc, 0x1000 + program.len() as u16);
}

#[test]
fn test_tst_direct_does_not_write() {
    let (mut cpu, mut bus) = setup(&[0x0D, 0x40], |_, bus| {
        bus.memory[0x0040] = 0x80;
        bus.record = true;
    });
    step(&mut cpu, &mut bus);
    assert!(flag(&cpu, CcFlag::N));
    assert!(!flag(&cpu, CcFlag::Z));
    assert_eq!(bus.memory[0x0040], 0x80);
    assert!(bus.trace.iter().all(|&(is_read, _)| is_read));
}

#[test]
fn test_adda_direct_uses_dp_page() {
    let (mut cpu, mut bus) = setup(&[0x9B, 0x34], |cpu, bus| {
        cpu.dp = 0x12;
        cpu.a = 0x03;
        bus.memory[0x1234] = 0x05;
        bus.memory[0x0034] = 0x77;
    });
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x08);
}

// ===== Extended =====

#[test]
fn test_inc_extended_overflows_at_0x7f() {
    let (mut cpu, mut bus) = setup(&[0x7C, 0x30, 0x00], |_, bus| bus.memory[0x3000] = 0x7F);
    assert_eq!(step(&mut cpu, &mut bus), 7);
    assert_eq!(bus.memory[0x3000], 0x80);
    assert!(flag(&cpu, CcFlag::V));
    assert!(flag(&cpu, CcFlag::N));
}

#[test]
fn test_jmp_extended() {
    let (mut cpu, mut bus) = setup(&[0x7E, 0x11, 0x00], |_, _| {});
    assert_eq!(step(&mut cpu, &mut bus), 4);
    assert_eq!(cpu.pc, 0x1100);
    assert_eq!(cpu.s, 0x8000);
}

#[test]
fn test_jsr_extended_stacks_return_address() {
    let (mut cpu, mut bus) = setup(&[0xBD, 0x11, 0x00], |_, _| {});
    assert_eq!(step(&mut cpu, &mut bus), 8);
    assert_eq!(cpu.pc, 0x1100);
    assert_eq!(cpu.s, 0x7FFE);
    assert_eq!(bus.peek16(0x7FFE), 0x1003);
}

#[test]
fn test_std_extended_sets_n() {
    let (mut cpu, mut bus) = setup(&[0xFD, 0x20, 0x00], |cpu, _| cpu.set_d(0x8001));
    step(&mut cpu, &mut bus);
    assert_eq!(bus.peek16(0x2000), 0x8001);
    assert!(flag(&cpu, CcFlag::N));
    assert!(!flag(&cpu, CcFlag::V));
}

// ===== 16-bit =====

#[test]
fn test_ldx_stx_direct() {
    // LDX <$40; STX <$50
    let (mut cpu, mut bus) = setup(&[0x9E, 0x40, 0x9F, 0x50], |_, bus| {
        bus.load(0x0040, &[0x12, 0x34]);
    });
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.x, 0x1234);
    step(&mut cpu, &mut bus);
    assert_eq!(bus.peek16(0x0050), 0x1234);
    assert!(!flag(&cpu, CcFlag::N));
    assert!(!flag(&cpu, CcFlag::Z));
}

#[test]
fn test_ldd_zero_sets_z() {
    let (mut cpu, mut bus) = setup(&[0xCC, 0x00, 0x00], |cpu, _| cpu.set_d(0x5555));
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_d(), 0);
    assert!(flag(&cpu, CcFlag::Z));
}

#[test]
fn test_subd_direct_borrows() {
    let (mut cpu, mut bus) = setup(&[0x93, 0x10], |_, bus| bus.load(0x0010, &[0x00, 0x01]));
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_d(), 0xFFFF);
    assert!(flag(&cpu, CcFlag::C));
    assert!(flag(&cpu, CcFlag::N));
}

#[test]
fn test_cmpy_page2() {
    let (mut cpu, mut bus) = setup(&[0x10, 0x8C, 0x30, 0x00], |cpu, _| cpu.y = 0x3000);
    step(&mut cpu, &mut bus);
    assert!(flag(&cpu, CcFlag::Z));
    assert_eq!(cpu.pc, 0x1004);

    let (mut cpu, mut bus) = setup(&[0x10, 0x8C, 0x30, 0x00], |cpu, _| cpu.y = 0x2FFF);
    step(&mut cpu, &mut bus);
    assert!(flag(&cpu, CcFlag::C));
    assert!(flag(&cpu, CcFlag::N));
}

#[test]
fn test_cmpu_page3() {
    let (mut cpu, mut bus) = setup(&[0x11, 0x83, 0x70, 0x00], |cpu, _| cpu.u = 0x7000);
    step(&mut cpu, &mut bus);
    assert!(flag(&cpu, CcFlag::Z));
    assert_eq!(cpu.u, 0x7000);
}

// ===== Misc =====

#[test]
fn test_abx_is_unsigned_and_keeps_flags() {
    let (mut cpu, mut bus) = setup(&[0x3A], |cpu, _| {
        cpu.x = 0x1000;
        cpu.b = 0xFF;
        cpu.cc = CcFlag::Z as u8;
    });
    assert_eq!(step(&mut cpu, &mut bus), 3);
    assert_eq!(cpu.x, 0x10FF);
    assert_eq!(cpu.cc, CcFlag::Z as u8);
}

#[test]
fn test_exg_d_x() {
    let (mut cpu, mut bus) = setup(&[0x1E, 0x01], |cpu, _| {
        cpu.set_d(0x1234);
        cpu.x = 0xABCD;
    });
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_d(), 0xABCD);
    assert_eq!(cpu.x, 0x1234);
}

#[test]
fn test_nop_changes_only_pc() {
    let (mut cpu, mut bus) = setup(&[0x12], |cpu, _| {
        cpu.a = 0x42;
        cpu.cc = CcFlag::N as u8;
    });
    assert_eq!(step(&mut cpu, &mut bus), 2);
    assert_eq!(cpu.pc, 0x1001);
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.cc, CcFlag::N as u8);
}
