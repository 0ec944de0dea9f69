use coco_core::device::sam::{MemorySize, RamAddress, Sam, Select};

// Control bit addresses: $FFC0 + 2 * bit, +1 to set
fn set_bit(sam: &mut Sam, bit: u16) -> bool {
    sam.write_control(0xFFC1 + 2 * bit)
}

fn clear_bit(sam: &mut Sam, bit: u16) -> bool {
    sam.write_control(0xFFC0 + 2 * bit)
}

const P1: u16 = 10;
const R0: u16 = 11;
const R1: u16 = 12;
const M0: u16 = 13;
const M1: u16 = 14;
const TY: u16 = 15;

fn sam_64k() -> Sam {
    let mut sam = Sam::new();
    clear_bit(&mut sam, M0);
    set_bit(&mut sam, M1);
    sam
}

// ===== Control register =====

#[test]
fn test_control_bits_set_and_clear() {
    let mut sam = Sam::new();
    assert!(set_bit(&mut sam, 0));
    assert!(set_bit(&mut sam, 2));
    assert_eq!(sam.v(), 0b101);
    assert!(set_bit(&mut sam, 3));
    assert!(set_bit(&mut sam, 9));
    assert_eq!(sam.f(), 0b100_0001);
    assert!(clear_bit(&mut sam, 0));
    assert_eq!(sam.v(), 0b100);
    assert_eq!(sam.control(), 0x0204 | 0x0008);
}

/// Only V and F changes report a video update; repeated writes report none.
#[test]
fn test_write_control_reports_video_changes() {
    let mut sam = Sam::new();
    assert!(!set_bit(&mut sam, R0));
    assert!(!set_bit(&mut sam, TY));
    assert!(set_bit(&mut sam, 4));
    assert!(!set_bit(&mut sam, 4));
    assert!(!clear_bit(&mut sam, 5));
}

#[test]
fn test_rate_and_memory_size_fields() {
    let mut sam = Sam::new();
    assert_eq!(sam.memory_size(), MemorySize::K4);
    set_bit(&mut sam, M0);
    assert_eq!(sam.memory_size(), MemorySize::K16);
    clear_bit(&mut sam, M0);
    set_bit(&mut sam, M1);
    assert_eq!(sam.memory_size(), MemorySize::K64);
    // M=3 is reserved and behaves as 64K
    set_bit(&mut sam, M0);
    assert_eq!(sam.memory_size(), MemorySize::K64);

    set_bit(&mut sam, R1);
    assert_eq!(sam.rate(), 2);
    set_bit(&mut sam, P1);
    assert!(sam.page1());
}

// ===== Chip select =====

#[test]
fn test_select_map() {
    let mut sam = sam_64k();
    let cases = [
        (0x0000, Select::Ram),
        (0x7FFF, Select::Ram),
        (0x8000, Select::Rom0),
        (0xA000, Select::Rom1),
        (0xC000, Select::Rom2),
        (0xFEFF, Select::Rom2),
        (0xFF00, Select::Io0),
        (0xFF22, Select::Io1),
        (0xFF40, Select::Io2),
        (0xFF90, Select::Sam),
        (0xFFC6, Select::Sam),
        (0xFFFE, Select::Rom1),
    ];
    for (addr, select) in cases {
        assert_eq!(sam.translate(addr, true).select, select, "{addr:04X}");
    }
}

#[test]
fn test_map_type_1_is_all_ram() {
    let mut sam = sam_64k();
    set_bit(&mut sam, TY);
    assert_eq!(sam.translate(0x8000, true).select, Select::Ram);
    assert_eq!(sam.translate(0xFEFF, true).select, Select::Ram);
    assert_eq!(sam.translate(0xFF00, true).select, Select::Io0);
    assert_eq!(
        sam.translate(0xC123, false).ram,
        RamAddress { bank: 0, row: 0x23, col: 0xC1 }
    );
}

/// Translating the same address twice gives the same select and RAM address.
#[test]
fn test_translate_is_repeatable() {
    let mut sam = sam_64k();
    let first = sam.translate(0x1234, true);
    let second = sam.translate(0x1234, true);
    assert_eq!(first.select, second.select);
    assert_eq!(first.ram, second.ram);
}

// ===== RAM organisation =====

#[test]
fn test_ram_address_per_chip_size() {
    let mut sam = Sam::new();
    assert_eq!(
        sam.ram_address(0x1FC5),
        RamAddress { bank: 1, row: 0x05, col: 0x3F }
    );
    set_bit(&mut sam, M0);
    assert_eq!(
        sam.ram_address(0x4185),
        RamAddress { bank: 1, row: 0x05, col: 0x03 }
    );
    let sam = sam_64k();
    assert_eq!(
        sam.ram_address(0x4185),
        RamAddress { bank: 0, row: 0x85, col: 0x41 }
    );
}

#[test]
fn test_page1_selects_upper_32k() {
    let mut sam = sam_64k();
    set_bit(&mut sam, P1);
    assert_eq!(sam.translate(0x0400, true).ram.col, 0x84);
    // Ignored in map type 1
    set_bit(&mut sam, TY);
    assert_eq!(sam.translate(0x0400, true).ram.col, 0x04);
}

// ===== Cycle timing =====

#[test]
fn test_slow_rate_is_16_ticks() {
    let mut sam = sam_64k();
    for addr in [0x0000, 0x8000, 0xFF00, 0xFFFE] {
        assert_eq!(sam.translate(addr, true).ncycles, 16);
    }
}

#[test]
fn test_fast_transitions() {
    let mut sam = sam_64k();
    set_bit(&mut sam, R1);
    assert_eq!(sam.translate(0x8000, true).ncycles, 15);
    assert_eq!(sam.translate(0x8000, true).ncycles, 8);
    assert_eq!(sam.translate(0x8000, true).ncycles, 8);
    clear_bit(&mut sam, R1);
    assert_eq!(sam.translate(0x8000, true).ncycles, 17);
    assert_eq!(sam.translate(0x8000, true).ncycles, 16);
}

/// An odd number of fast cycles leaves the bus half a slot out; the next
/// slow cycle stretches to 25 ticks.
#[test]
fn test_reinterleave_after_odd_fast_run() {
    let mut sam = sam_64k();
    set_bit(&mut sam, R1);
    sam.translate(0x8000, true);
    assert_eq!(sam.translate(0x8000, true).ncycles, 8);
    clear_bit(&mut sam, R1);
    assert_eq!(sam.translate(0x8000, true).ncycles, 25);
    assert_eq!(sam.translate(0x8000, true).ncycles, 16);
}

/// Address-dependent rate: ROM runs fast, RAM and the first PIA stay slow.
#[test]
fn test_address_dependent_rate() {
    let mut sam = sam_64k();
    set_bit(&mut sam, R0);
    assert_eq!(sam.translate(0x8000, true).ncycles, 15);
    assert_eq!(sam.translate(0x0100, true).ncycles, 17);
    assert_eq!(sam.translate(0xFF00, true).ncycles, 16);
    assert_eq!(sam.translate(0xFF20, true).ncycles, 15);
}

#[test]
fn test_snapshot_restores_timing_phase() {
    let mut sam = sam_64k();
    set_bit(&mut sam, R1);
    sam.translate(0x8000, true);
    sam.translate(0x8000, true);
    let saved = sam.snapshot();

    let mut other = Sam::new();
    other.restore(&saved);
    other.write_control(0xFFC0 + 2 * R1);
    assert_eq!(other.translate(0x8000, true).ncycles, 25);
    assert_eq!(other.control(), sam.control() & !0x1000);
}
