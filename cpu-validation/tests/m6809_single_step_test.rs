use std::path::Path;

use coco_core::cpu::{Cpu, Model};
use coco_cpu_validation::{CpuState, TestCase, TracingBus};

fn run_test_case(model: Model, tc: &TestCase) {
    let mut bus = TracingBus::new();
    let mut cpu = tc.initial.apply(model, &mut bus);

    cpu.step(&mut bus);

    // Assert registers
    let actual = CpuState {
        ram: tc.final_state.ram.clone(),
        ..CpuState::capture(&cpu)
    };
    assert_eq!(actual, tc.final_state, "{}: registers", tc.name);

    // Assert memory
    for &(addr, expected) in &tc.final_state.ram {
        assert_eq!(
            bus.memory[addr as usize], expected,
            "{}: RAM[0x{:04X}]",
            tc.name, addr
        );
    }

    // Assert total cycle count (dead + bus cycles)
    assert_eq!(
        bus.cycles.len(),
        tc.cycles.len(),
        "{}: total cycle count (got {} expected {})",
        tc.name,
        bus.cycles.len(),
        tc.cycles.len()
    );

    for (idx, (actual, &(exp_addr, exp_data, exp_op))) in
        bus.cycles.iter().zip(&tc.cycles).enumerate()
    {
        assert_eq!(actual.op, exp_op, "{}: cycle {} op", tc.name, idx);
        assert_eq!(actual.addr, exp_addr, "{}: cycle {} addr", tc.name, idx);
        assert_eq!(actual.data, exp_data, "{}: cycle {} data", tc.name, idx);
    }
}

/// Replays every vector file under `dir`. Returns how many cases ran.
/// A missing or empty directory is a failure, not a pass.
fn replay(model: Model, dir: &Path) -> usize {
    assert!(
        dir.is_dir(),
        "no vectors in {}. Run: cargo run -p coco-cpu-validation --bin gen_m6809_tests -- all",
        dir.display()
    );

    let mut json_files: Vec<_> = std::fs::read_dir(dir)
        .expect("Failed to read test data directory")
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            (path.extension().and_then(|e| e.to_str()) == Some("json")).then_some(path)
        })
        .collect();
    json_files.sort();

    let mut total_tests = 0;
    for json_path in &json_files {
        let json = std::fs::read_to_string(json_path)
            .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", json_path, e));
        let tests: Vec<TestCase> = serde_json::from_str(&json)
            .unwrap_or_else(|e| panic!("Failed to parse {:?}: {}", json_path, e));
        assert!(!tests.is_empty(), "Test file {:?} is empty", json_path);

        for tc in &tests {
            run_test_case(model, tc);
        }
        total_tests += tests.len();
    }

    assert!(!json_files.is_empty(), "no vector files in {}", dir.display());
    eprintln!(
        "Validated {} tests across {} opcode files in {}",
        total_tests,
        json_files.len(),
        dir.display()
    );
    total_tests
}

#[test]
#[ignore = "needs vectors from gen_m6809_tests"]
fn test_all_mc6809_vectors() {
    replay(Model::Mc6809, Path::new("test_data/m6809"));
}

#[test]
#[ignore = "needs vectors from gen_m6809_tests"]
fn test_all_hd6309_vectors() {
    replay(Model::Hd6309, Path::new("test_data/hd6309"));
}

#[test]
#[should_panic(expected = "no vectors")]
fn test_missing_vector_directory_fails() {
    replay(Model::Mc6809, Path::new("test_data/does-not-exist"));
}

/// A hand-written vector in the generator's format, so the replay path is
/// exercised even before any vectors are generated.
#[test]
fn test_inline_vector() {
    let json = r#"{
        "name": "ab 84",
        "initial": { "pc": 4096, "s": 32768, "u": 0, "a": 16, "b": 0, "dp": 0,
                     "x": 8192, "y": 0, "cc": 0,
                     "ram": [[4096, 171], [4097, 132], [8192, 32]] },
        "final":   { "pc": 4098, "s": 32768, "u": 0, "a": 48, "b": 0, "dp": 0,
                     "x": 8192, "y": 0, "cc": 0,
                     "ram": [[4096, 171], [4097, 132], [8192, 32]] },
        "cycles": [[4096, 171, "read"], [4097, 132, "read"],
                   [4098, 0, "read"], [8192, 32, "read"]]
    }"#;
    let tc: TestCase = serde_json::from_str(json).unwrap();
    run_test_case(Model::Mc6809, &tc);
}
