use coco_core::cpu::{CcFlag, M6809, Model};
mod common;
use common::{TestBus, cpu_at, step};

fn setup(program: &[u8]) -> (M6809, TestBus) {
    let mut cpu = cpu_at(Model::Mc6809, 0x1000);
    cpu.cc = CcFlag::V as u8 | CcFlag::C as u8;
    let mut bus = TestBus::new();
    bus.load(0x1000, program);
    (cpu, bus)
}

fn flags(cpu: &M6809) -> (bool, bool, bool) {
    (
        cpu.cc & CcFlag::N as u8 != 0,
        cpu.cc & CcFlag::Z as u8 != 0,
        cpu.cc & CcFlag::V as u8 != 0,
    )
}

// ===== 8-bit =====

/// LDA #$80 sets N, clears V, leaves C.
#[test]
fn test_lda_immediate_flags() {
    let (mut cpu, mut bus) = setup(&[0x86, 0x80]);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x80);
    assert_eq!(flags(&cpu), (true, false, false));
    assert!(cpu.cc & CcFlag::C as u8 != 0);
}

/// STB <$40 with DP = $20 writes $2040.
#[test]
fn test_stb_direct_uses_dp() {
    let (mut cpu, mut bus) = setup(&[0xD7, 0x40]);
    cpu.dp = 0x20;
    cpu.b = 0x00;
    step(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x2040], 0x00);
    assert_eq!(flags(&cpu), (false, true, false));
}

#[test]
fn test_load_store_extended() {
    let (mut cpu, mut bus) = setup(&[0xB6, 0x30, 0x00, 0xB7, 0x30, 0x01]);
    bus.memory[0x3000] = 0x5C;
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!(bus.memory[0x3001], 0x5C);
}

// ===== 16-bit =====

#[test]
fn test_sixteen_bit_loads() {
    let (mut cpu, mut bus) = setup(&[
        0xCC, 0x12, 0x34, // LDD #$1234
        0x8E, 0xAB, 0xCD, // LDX #$ABCD
        0x10, 0x8E, 0x00, 0x00, // LDY #0
        0xCE, 0x40, 0x00, // LDU #$4000
        0x10, 0xCE, 0x50, 0x00, // LDS #$5000
    ]);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_d(), 0x1234);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.x, 0xABCD);
    assert_eq!(flags(&cpu), (true, false, false));
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.y, 0);
    assert_eq!(flags(&cpu), (false, true, false));
    step(&mut cpu, &mut bus);
    step(&mut cpu, &mut bus);
    assert_eq!((cpu.u, cpu.s), (0x4000, 0x5000));
}

#[test]
fn test_sixteen_bit_stores_are_big_endian() {
    let (mut cpu, mut bus) = setup(&[0xFD, 0x30, 0x00, 0x10, 0xBF, 0x30, 0x02]);
    cpu.set_d(0xBEEF);
    cpu.y = 0x0102;
    step(&mut cpu, &mut bus); // STD $3000
    step(&mut cpu, &mut bus); // STY $3002
    assert_eq!(&bus.memory[0x3000..0x3004], &[0xBE, 0xEF, 0x01, 0x02]);
}

// ===== LEA =====

#[test]
fn test_lea_flags() {
    let (mut cpu, mut bus) = setup(&[0x30, 0x1F, 0x33, 0x5F]);
    cpu.x = 1;
    cpu.u = 1;
    step(&mut cpu, &mut bus); // LEAX -1,X
    assert_eq!(cpu.x, 0);
    assert!(cpu.cc & CcFlag::Z as u8 != 0);
    cpu.cc = 0;
    step(&mut cpu, &mut bus); // LEAU -1,U
    assert_eq!(cpu.u, 0);
    assert_eq!(cpu.cc, 0, "LEAU leaves the flags alone");
}

// ===== HD6309 =====

#[test]
fn test_ldw_stw() {
    let mut cpu = cpu_at(Model::Hd6309, 0x1000);
    let mut bus = TestBus::new();
    bus.load(0x1000, &[0x10, 0x86, 0x80, 0x01, 0x10, 0xB7, 0x30, 0x00]);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.get_w(), 0x8001);
    assert!(cpu.cc & CcFlag::N as u8 != 0);
    step(&mut cpu, &mut bus);
    assert_eq!(&bus.memory[0x3000..0x3002], &[0x80, 0x01]);
}

/// On the 6809, LDW's encoding is a page-0 opcode behind a stray prefix.
#[test]
fn test_6309_only_load_is_not_decoded_on_6809() {
    let (mut cpu, mut bus) = setup(&[0x10, 0x86, 0x42]);
    step(&mut cpu, &mut bus);
    assert_eq!(cpu.a, 0x42);
    assert_eq!(cpu.get_w(), 0);
}
