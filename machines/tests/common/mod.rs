#![allow(dead_code)]

use coco_core::device::Memory;
use coco_machines::rom_loader::{COCO3_ROM_NAME, RomSet};
use coco_machines::{CoCo3, MachineConfig};

pub const ROM_SIZE: usize = 0x2000;

/// 8 KB test image mirrored through $8000-$FEFF. The reset vector points at
/// $8000, where `program` is placed; the rest is NOPs.
pub fn test_rom(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0x12; ROM_SIZE];
    rom[..program.len()].copy_from_slice(program);
    set_vector(&mut rom, 0xFFFE, 0x8000);
    rom
}

/// Patch a CPU vector. Vectors read through ROM1 at the top of the image.
pub fn set_vector(rom: &mut [u8], vector: u16, target: u16) {
    let offset = usize::from(vector) & (ROM_SIZE - 1);
    rom[offset..offset + 2].copy_from_slice(&target.to_be_bytes());
}

/// Copy `code` to the image so that it appears at `addr` ($8000-$9FFF).
pub fn place(rom: &mut [u8], addr: u16, code: &[u8]) {
    let offset = usize::from(addr - 0x8000);
    rom[offset..offset + code.len()].copy_from_slice(code);
}

pub fn roms(image: &[u8]) -> RomSet {
    RomSet::from_slices(&[(COCO3_ROM_NAME, image)])
}

pub fn machine(image: &[u8]) -> CoCo3 {
    machine_with(image, &MachineConfig::default())
}

pub fn machine_with(image: &[u8], config: &MachineConfig) -> CoCo3 {
    CoCo3::new(config, &roms(image)).unwrap()
}

/// Read RAM the way the CPU would see `addr` under the current SAM setup.
pub fn read_ram(m: &mut CoCo3, addr: u16) -> u8 {
    let t = m.board_mut().sam_mut().translate(addr, true);
    m.board().ram().read_at(t.ram)
}
