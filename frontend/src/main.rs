//! `coco`: run a machine headless for a number of fields, optionally stopping
//! at a trap address and saving a screenshot.

use std::cell::Cell;
use std::process;
use std::rc::Rc;

use clap::Parser;
use coco_core::core::HookAction;
use coco_machines::registry;
use coco_machines::rom_loader::RomSet;

mod capture;
mod cli;

use cli::Args;

fn list() {
    println!("Machines:");
    for entry in registry::all() {
        println!("  {}", entry.name);
    }
    println!("Parts:");
    for name in registry::part_names() {
        println!("  {name}");
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if args.list {
        list();
        return;
    }
    let (Some(machine_name), Some(rom_path)) = (&args.machine, &args.rom) else {
        eprintln!("Usage: coco <machine> <rom-path> [options]");
        process::exit(2);
    };

    let entry = registry::find(machine_name).unwrap_or_else(|| {
        let names: Vec<_> = registry::all().iter().map(|e| e.name).collect();
        eprintln!("Unknown machine: {machine_name}");
        eprintln!("Available: {}", names.join(", "));
        process::exit(1);
    });

    let config = cli::resolve_config(&args, cli::default_config_path().as_deref()).unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        process::exit(1);
    });
    let rom_set = RomSet::from_path(rom_path, entry.rom_name).unwrap_or_else(|e| {
        eprintln!("Failed to load ROMs: {e}");
        process::exit(1);
    });
    let mut machine = (entry.create)(&config, &rom_set).unwrap_or_else(|e| {
        eprintln!("Failed to initialize machine: {e}");
        process::exit(1);
    });

    let trapped = Rc::new(Cell::new(false));
    if let Some(addr) = args.trap {
        let Some(breakpoints) = machine.breakpoints() else {
            eprintln!("{machine_name} does not support breakpoints");
            process::exit(1);
        };
        let hit = trapped.clone();
        breakpoints.add_instruction(
            addr,
            Box::new(move |pc| {
                log::info!("trap at ${pc:04X}");
                hit.set(true);
                HookAction::Stop
            }),
        );
    }

    let mut frames = 0;
    while frames < args.frames {
        machine.run_frame();
        if machine.stopped() {
            break;
        }
        frames += 1;
    }

    if trapped.get() {
        if let Some(addr) = args.trap {
            println!("Trap ${addr:04X} hit after {frames} fields");
        }
    } else {
        println!("Ran {frames} fields");
    }

    if let Some(path) = &args.screenshot
        && let Err(e) = capture::save_screenshot(machine.as_ref(), path)
    {
        eprintln!("Screenshot error: {e}");
        process::exit(1);
    }
}
