mod common;

use coco_core::core::machine::Machine;
use coco_machines::CoCo3State;
use common::*;

#[rustfmt::skip]
const COUNTER: [u8; 22] = [
    0x10, 0xCE, 0x7F, 0x00, // 8000 LDS #$7F00
    0x86, 0x07,             // 8004 LDA #$07
    0xB7, 0xFF, 0x03,       // 8006 STA $FF03     (field sync IRQ)
    0x1C, 0xEF,             // 8009 ANDCC #$EF
    0x7C, 0x04, 0x00,       // 800B INC $0400
    0x20, 0xFB,             // 800E BRA $800B
    0x7C, 0x04, 0x01,       // 8010 INC $0401     (IRQ handler)
    0xB6, 0xFF, 0x02,       // 8013 LDA $FF02
];

fn counter_rom() -> Vec<u8> {
    let mut rom = test_rom(&COUNTER);
    place(&mut rom, 0x8016, &[0x3B]);
    set_vector(&mut rom, 0xFFF8, 0x8010);
    rom
}

/// A snapshot taken mid-field and restored into a machine at a different
/// tick continues exactly as the original does.
#[test]
fn restore_into_fresh_machine_continues_identically() {
    let mut original = machine(&counter_rom());
    original.run_fields(3);
    for _ in 0..1234 {
        original.step();
    }

    let json = serde_json::to_string(&original.snapshot()).unwrap();
    let state: CoCo3State = serde_json::from_str(&json).unwrap();
    assert_eq!(state, original.snapshot());

    let mut copy = machine(&counter_rom());
    copy.restore(&state);
    assert_eq!(copy.snapshot(), state);
    assert_ne!(copy.board().now(), original.board().now());

    for _ in 0..50_000 {
        original.step();
        copy.step();
    }
    assert_eq!(copy.snapshot(), original.snapshot());
    assert!(read_ram(&mut copy, 0x0401) >= 3);
}

/// Event offsets are stored relative to the snapshot tick.
#[test]
fn events_are_relative_to_now() {
    let mut m = machine(&counter_rom());
    m.run_frame();
    let state = m.snapshot();
    let now = m.board().now();
    for &(event, offset) in &state.events {
        let at = m.board().scheduler().scheduled_at(event).unwrap();
        assert_eq!(now.delta(at), offset);
    }
    assert!(!state.events.is_empty());
}
