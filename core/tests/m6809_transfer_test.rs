use coco_core::cpu::Model;
mod common;
use common::{TestBus, cpu_at, step};

fn transfer(model: Model, opcode: u8, post: u8, setup: impl FnOnce(&mut coco_core::cpu::M6809)) -> coco_core::cpu::M6809 {
    let mut cpu = cpu_at(model, 0x1000);
    setup(&mut cpu);
    let mut bus = TestBus::new();
    bus.load(0x1000, &[opcode, post]);
    step(&mut cpu, &mut bus);
    cpu
}

#[test]
fn test_tfr_x_to_y() {
    let cpu = transfer(Model::Mc6809, 0x1F, 0x12, |c| c.x = 0x1234);
    assert_eq!(cpu.y, 0x1234);
    assert_eq!(cpu.x, 0x1234);
}

#[test]
fn test_exg_a_dp() {
    let cpu = transfer(Model::Mc6809, 0x1E, 0x8B, |c| {
        c.a = 0x12;
        c.dp = 0x34;
    });
    assert_eq!(cpu.a, 0x34);
    assert_eq!(cpu.dp, 0x12);
}

// ===== Mixed widths =====

#[test]
fn test_6809_tfr_8_to_16_fills_high_byte() {
    let cpu = transfer(Model::Mc6809, 0x1F, 0x81, |c| c.a = 0x56);
    assert_eq!(cpu.x, 0xFF56);
}

#[test]
fn test_6809_tfr_16_to_8_takes_low_byte() {
    let cpu = transfer(Model::Mc6809, 0x1F, 0x18, |c| c.x = 0xABCD);
    assert_eq!(cpu.a, 0xCD);
}

#[test]
fn test_6309_tfr_a_to_x_widens_d() {
    let cpu = transfer(Model::Hd6309, 0x1F, 0x81, |c| c.set_d(0x1234));
    assert_eq!(cpu.x, 0x1234);
}

#[test]
fn test_6309_tfr_16_to_a_takes_high_byte() {
    let cpu = transfer(Model::Hd6309, 0x1F, 0x18, |c| c.x = 0xABCD);
    assert_eq!(cpu.a, 0xAB);
    let cpu = transfer(Model::Hd6309, 0x1F, 0x19, |c| c.x = 0xABCD);
    assert_eq!(cpu.b, 0xCD);
}

#[test]
fn test_6309_zero_register() {
    let cpu = transfer(Model::Hd6309, 0x1F, 0xC1, |c| c.x = 0xFFFF);
    assert_eq!(cpu.x, 0x0000);
}

#[test]
fn test_tfr_to_s_arms_nmi_and_sets_s() {
    let cpu = transfer(Model::Mc6809, 0x1F, 0x14, |c| c.x = 0x7F00);
    assert_eq!(cpu.s, 0x7F00);
}

#[test]
fn test_tfr_to_pc_jumps() {
    let cpu = transfer(Model::Mc6809, 0x1F, 0x15, |c| c.x = 0x4000);
    assert_eq!(cpu.pc, 0x4000);
}
