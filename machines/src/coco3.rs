//! Tandy Color Computer 3.
//!
//! The CPU sits on a [`Board`] that owns everything else: the scheduler, the
//! SAM-compatible address decode, the GIME, RAM and ROM, both PIAs, the
//! interrupt aggregator and the breakpoint table. The board is the CPU's
//! [`Bus`]; each bus cycle is translated, time advances by the cycle's cost,
//! video events that fell due are dispatched and then the transfer happens.

use coco_core::core::bus::InterruptState;
use coco_core::core::machine::Machine;
use coco_core::core::{Bus, Component, EventHandler, HookAction, Scheduler, Tick};
use coco_core::cpu::{Cpu, CpuStateTrait, M6809, M6809State};
use coco_core::device::gime::{GimeState, Revision, TvStandard, VideoSignals};
use coco_core::device::interrupt::{InterruptAggregator, Line, Source};
use coco_core::device::sam::{CONTROL_BASE, CONTROL_END, SamState};
use coco_core::device::{
    Breakpoints, FrameBuffer, Gime, Mc6821, Memory, Ram, Rom, Sam, Select, Translation,
    VideoEvent, VideoMemory,
};
use serde::{Deserialize, Serialize};

use crate::config::MachineConfig;
use crate::registry::{self, MachineEntry, MachineError};
use crate::rom_loader::{CARTRIDGE_ROM, CARTRIDGE_ROM_NAME, COCO3_ROM, COCO3_ROM_NAME, RomSet};

/// Optional character generator image for the GIME text modes.
pub const FONT_ROM_NAME: &str = "font.rom";

// Interrupt wiring
const PIA0_IRQ: Source = Source::new(0, Line::Irq);
const GIME_IRQ: Source = Source::new(1, Line::Irq);
const PIA1_FIRQ: Source = Source::new(2, Line::Firq);
const GIME_FIRQ: Source = Source::new(3, Line::Firq);

/// Every event on the machine's queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    Video(VideoEvent),
}

impl From<VideoEvent> for Event {
    fn from(e: VideoEvent) -> Self {
        Event::Video(e)
    }
}

// ---------------------------------------------------------------------------
// Video fetch and event dispatch
// ---------------------------------------------------------------------------

/// RAM as the display sees it: through the SAM's row/column mapping.
struct VideoRam<'a> {
    sam: &'a Sam,
    ram: &'a Ram,
}

impl VideoMemory for VideoRam<'_> {
    fn fetch(&self, addr: u32) -> u8 {
        // No GIME MMU: the display sees the low 64K of the 19-bit space
        debug_assert!(addr < 0x8_0000, "video address {addr:#x} out of range");
        self.ram.read_at(self.sam.ram_address((addr & 0xFFFF) as u16))
    }
}

/// Borrows the parts an event can touch while the scheduler is advancing.
struct Dispatch<'a> {
    gime: &'a mut Gime,
    video: VideoRam<'a>,
    sink: &'a mut FrameBuffer,
    pia0: &'a mut Mc6821,
    interrupts: &'a mut InterruptAggregator,
}

impl EventHandler<Event> for Dispatch<'_> {
    fn handle_event(&mut self, event: Event, at: Tick, scheduler: &mut Scheduler<Event>) {
        match event {
            Event::Video(ev) => {
                let VideoSignals { hs, fs } =
                    self.gime
                        .handle_event(ev, at, scheduler, &self.video, &mut *self.sink);
                if let Some(level) = hs {
                    self.pia0.set_ca1(level);
                }
                if let Some(level) = fs {
                    self.pia0.set_cb1(level);
                }
                self.interrupts.set(PIA0_IRQ, self.pia0.irq());
                self.interrupts.set(GIME_IRQ, self.gime.irq());
                self.interrupts.set(GIME_FIRQ, self.gime.firq());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

pub struct Board {
    scheduler: Scheduler<Event>,
    sam: Sam,
    gime: Gime,
    ram: Ram,
    /// Internal 32K image: ROM0 at offset 0, ROM1 at 0x2000, ROM2 at 0x4000.
    rom: Rom,
    cartridge: Rom,
    pia0: Mc6821,
    pia1: Mc6821,
    interrupts: InterruptAggregator,
    breakpoints: Breakpoints,
    frame: FrameBuffer,

    /// `running()` goes false once the GIME has completed this many fields.
    field_target: u64,
    stop_requested: bool,
    cycles: u64,
}

impl Board {
    pub fn new(revision: Revision, tv: TvStandard, ram_banks: u8) -> Self {
        let mut board = Self {
            scheduler: Scheduler::new(),
            sam: Sam::new(),
            gime: Gime::new(revision, tv),
            ram: Ram::new(ram_banks),
            rom: Rom::default(),
            cartridge: Rom::default(),
            pia0: Mc6821::new(),
            pia1: Mc6821::new(),
            interrupts: InterruptAggregator::new(),
            breakpoints: Breakpoints::new(),
            frame: FrameBuffer::new(usize::from(tv.lines_per_field())),
            field_target: 0,
            stop_requested: false,
            cycles: 0,
        };
        board.release_inputs();
        board.gime.start(&mut board.scheduler);
        board
    }

    /// Keyboard rows and joystick comparator read high with nothing pressed.
    fn release_inputs(&mut self) {
        self.pia0.set_port_a_input(0xFF);
        self.pia0.set_port_b_input(0xFF);
        self.pia1.set_port_a_input(0xFF);
        self.pia1.set_port_b_input(0xFF);
    }

    pub fn load_rom(&mut self, image: Vec<u8>) {
        self.rom = Rom::new(image);
    }

    pub fn load_cartridge(&mut self, image: Vec<u8>) {
        self.cartridge = Rom::new(image);
    }

    // --- Accessors ---

    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    pub fn scheduler(&self) -> &Scheduler<Event> {
        &self.scheduler
    }

    pub fn sam(&self) -> &Sam {
        &self.sam
    }

    pub fn sam_mut(&mut self) -> &mut Sam {
        &mut self.sam
    }

    pub fn gime(&self) -> &Gime {
        &self.gime
    }

    pub fn gime_mut(&mut self) -> &mut Gime {
        &mut self.gime
    }

    pub fn ram(&self) -> &Ram {
        &self.ram
    }

    pub fn ram_mut(&mut self) -> &mut Ram {
        &mut self.ram
    }

    pub fn pia0(&self) -> &Mc6821 {
        &self.pia0
    }

    pub fn pia1(&self) -> &Mc6821 {
        &self.pia1
    }

    pub fn interrupts(&self) -> &InterruptAggregator {
        &self.interrupts
    }

    pub fn breakpoints_mut(&mut self) -> &mut Breakpoints {
        &mut self.breakpoints
    }

    pub fn frame(&self) -> &FrameBuffer {
        &self.frame
    }

    /// CPU bus cycles since power-on.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Drive the cartridge interrupt line (PIA1 CB1).
    pub fn set_cart_line(&mut self, level: bool) {
        self.pia1.set_cb1(level);
        self.interrupts.set(PIA1_FIRQ, self.pia1.irq());
    }

    /// Let `run()` continue until `fields` more fields have completed.
    pub fn run_for_fields(&mut self, fields: u64) {
        self.field_target = self.gime.frames() + fields;
        self.stop_requested = false;
    }

    // --- Cycle ---

    fn dispatch(&mut self, now: Tick) {
        let mut dispatch = Dispatch {
            gime: &mut self.gime,
            video: VideoRam {
                sam: &self.sam,
                ram: &self.ram,
            },
            sink: &mut self.frame,
            pia0: &mut self.pia0,
            interrupts: &mut self.interrupts,
        };
        self.scheduler.advance(now, &mut dispatch);
    }

    fn single_cycle(&mut self, is_read: bool, address: u16, data: &mut u8) {
        let t = self.sam.translate(address, is_read);
        let now = self.scheduler.now() + t.ncycles;
        self.dispatch(now);
        self.cycles += 1;

        if is_read {
            *data = self.read_selected(t, address);
        } else {
            self.write_selected(t, address, *data, now);
        }

        if !self.breakpoints.is_empty() {
            let action = if is_read {
                self.breakpoints.on_read(address)
            } else {
                self.breakpoints.on_write(address)
            };
            if action == HookAction::Stop {
                self.stop_requested = true;
            }
        }
    }

    fn read_selected(&mut self, t: Translation, address: u16) -> u8 {
        match t.select {
            Select::Ram => self.ram.read_at(t.ram),
            Select::Rom0 => self.rom.read(usize::from(address & 0x1FFF)),
            Select::Rom1 => self.rom.read(0x2000 | usize::from(address & 0x1FFF)),
            Select::Rom2 => {
                let offset = usize::from(address - 0xC000);
                if self.cartridge.is_empty() {
                    self.rom.read(0x4000 + offset)
                } else {
                    self.cartridge.read(offset)
                }
            }
            Select::Io0 => {
                let data = self.pia0.read(address);
                self.interrupts.set(PIA0_IRQ, self.pia0.irq());
                data
            }
            Select::Io1 => {
                let data = self.pia1.read(address);
                self.interrupts.set(PIA1_FIRQ, self.pia1.irq());
                data
            }
            // Disk controller slot, empty
            Select::Io2 => 0xFF,
            Select::Sam => match address {
                0xFF90..=0xFF9F | 0xFFB0..=0xFFBF => {
                    let data = self.gime.read(address);
                    self.publish_gime();
                    data
                }
                _ => 0xFF,
            },
        }
    }

    fn write_selected(&mut self, t: Translation, address: u16, data: u8, now: Tick) {
        match t.select {
            Select::Ram => self.ram.write_at(t.ram, data),
            Select::Rom0 | Select::Rom1 | Select::Rom2 | Select::Io2 => {}
            Select::Io0 => {
                self.pia0.write(address, data);
                self.interrupts.set(PIA0_IRQ, self.pia0.irq());
            }
            Select::Io1 => {
                self.pia1.write(address, data);
                self.interrupts.set(PIA1_FIRQ, self.pia1.irq());
            }
            Select::Sam => match address {
                0xFF90..=0xFF9F | 0xFFB0..=0xFFBF => {
                    let video = VideoRam {
                        sam: &self.sam,
                        ram: &self.ram,
                    };
                    self.gime
                        .write(address, data, now, &mut self.scheduler, &video);
                    self.publish_gime();
                }
                CONTROL_BASE..=CONTROL_END => {
                    // Pixels already drawn on this line keep the old decode
                    self.gime.render_to(
                        now,
                        &VideoRam {
                            sam: &self.sam,
                            ram: &self.ram,
                        },
                    );
                    if self.sam.write_control(address) {
                        let video = VideoRam {
                            sam: &self.sam,
                            ram: &self.ram,
                        };
                        self.gime
                            .set_sam_video(self.sam.v(), self.sam.f(), now, &video);
                    }
                }
                _ => {}
            },
        }
    }

    fn publish_gime(&mut self) {
        self.interrupts.set(GIME_IRQ, self.gime.irq());
        self.interrupts.set(GIME_FIRQ, self.gime.firq());
    }

    fn publish_all(&mut self) {
        self.interrupts.set(PIA0_IRQ, self.pia0.irq());
        self.interrupts.set(PIA1_FIRQ, self.pia1.irq());
        self.publish_gime();
    }

    /// Peripherals back to power-on state. RAM is kept and the beam keeps
    /// running.
    pub fn reset(&mut self) {
        self.sam.reset();
        self.gime.reset();
        self.scheduler.cancel(VideoEvent::Timer.into());
        if !self.scheduler.is_queued(VideoEvent::HsFall.into()) {
            self.gime.start(&mut self.scheduler);
        }
        self.pia0.reset();
        self.pia1.reset();
        self.release_inputs();
        self.interrupts.clear();
        self.publish_all();
        self.stop_requested = false;
    }
}

impl Bus for Board {
    fn cycle(&mut self, ncycles: u16, is_read: bool, address: u16, data: &mut u8) {
        for _ in 0..ncycles {
            self.single_cycle(is_read, address, data);
        }
    }

    fn check_interrupts(&self) -> InterruptState {
        self.interrupts.state()
    }

    fn running(&self) -> bool {
        !self.stop_requested && self.gime.frames() < self.field_target
    }

    fn instruction_hook(&mut self, pc: u16) -> HookAction {
        if self.breakpoints.is_empty() {
            return HookAction::Continue;
        }
        let action = self.breakpoints.on_instruction(pc);
        if action == HookAction::Stop {
            self.stop_requested = true;
        }
        action
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Whole-machine state. Event times are offsets from the snapshot's tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoCo3State {
    pub cpu: M6809State,
    pub sam: SamState,
    pub gime: GimeState,
    pub pia0: Mc6821,
    pub pia1: Mc6821,
    pub interrupts: InterruptAggregator,
    pub events: Vec<(Event, i32)>,
    pub ram: Vec<u8>,
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

pub struct CoCo3 {
    cpu: M6809,
    board: Board,
}

impl CoCo3 {
    /// Fit `cpu` to a board. ROMs are loaded separately.
    pub fn with_cpu(cpu: M6809, revision: Revision, tv: TvStandard, ram_banks: u8) -> Self {
        Self {
            cpu,
            board: Board::new(revision, tv, ram_banks),
        }
    }

    /// Assemble from a configuration and a ROM set.
    pub fn new(config: &MachineConfig, roms: &RomSet) -> Result<Self, MachineError> {
        config.validate()?;
        let mut cpu = registry::create_cpu(&config.cpu)?;
        cpu.div_overflow = config.div_overflow.into();

        let mut machine = Self::with_cpu(cpu, config.gime.into(), config.tv.into(), config.ram_banks());
        let board = &mut machine.board;
        board.gime.set_frame_skip(config.frame_skip);
        board.sam.finish()?;
        board.gime.finish()?;

        let (rom, cart) = if config.skip_checksums {
            (
                COCO3_ROM.load_skip_checksums(roms)?,
                CARTRIDGE_ROM.load_skip_checksums(roms)?,
            )
        } else {
            (COCO3_ROM.load(roms)?, CARTRIDGE_ROM.load(roms)?)
        };
        board.load_rom(rom);
        if roms.get(CARTRIDGE_ROM_NAME).is_some() {
            board.load_cartridge(cart);
        }
        if let Some(font) = roms.get(FONT_ROM_NAME) {
            board.gime.set_font(font.to_vec());
        }

        log::info!(
            "CoCo 3 assembled: {} CPU, {} ({:?}), {} KB RAM",
            machine.cpu.name(),
            machine.board.gime.name(),
            config.tv,
            config.ram_kb
        );
        Ok(machine)
    }

    pub fn cpu(&self) -> &M6809 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut M6809 {
        &mut self.cpu
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// One CPU state transition, ignoring the field limit.
    pub fn step(&mut self) {
        self.cpu.step(&mut self.board);
    }

    /// Run `n` fields, stopping early on a breakpoint. Returns the number of
    /// fields completed.
    pub fn run_fields(&mut self, n: u64) -> u64 {
        let start = self.board.gime.frames();
        self.board.run_for_fields(n);
        while self.board.running() {
            self.cpu.run(&mut self.board);
        }
        self.board.gime.frames() - start
    }

    pub fn snapshot(&self) -> CoCo3State {
        let now = self.board.scheduler.now();
        CoCo3State {
            cpu: self.cpu.snapshot(),
            sam: self.board.sam.snapshot(),
            gime: self.board.gime.snapshot(now),
            pia0: self.board.pia0,
            pia1: self.board.pia1,
            interrupts: self.board.interrupts,
            events: self.board.scheduler.snapshot(),
            ram: self.board.ram.as_slice().to_vec(),
        }
    }

    /// Restore onto the current tick. The master clock is not rewound.
    pub fn restore(&mut self, state: &CoCo3State) {
        let now = self.board.scheduler.now();
        self.cpu.restore(&state.cpu);
        self.board.sam.restore(&state.sam);
        self.board.gime.restore(&state.gime, now);
        self.board.pia0 = state.pia0;
        self.board.pia1 = state.pia1;
        self.board.interrupts = state.interrupts;
        self.board.scheduler.restore(now, &state.events);
        self.board.ram.load(&state.ram);
    }
}

impl Machine for CoCo3 {
    fn display_size(&self) -> (u32, u32) {
        (self.board.frame.width() as u32, self.board.frame.height() as u32)
    }

    fn run_frame(&mut self) {
        self.run_fields(1);
    }

    fn render_frame(&self, buffer: &mut [u8]) {
        self.board.frame.to_rgb(buffer);
    }

    fn reset(&mut self) {
        self.cpu.reset();
        self.board.reset();
    }

    fn stopped(&self) -> bool {
        self.board.stop_requested
    }

    fn breakpoints(&mut self) -> Option<&mut Breakpoints> {
        Some(&mut self.board.breakpoints)
    }
}

fn create_machine(config: &MachineConfig, roms: &RomSet) -> Result<Box<dyn Machine>, MachineError> {
    Ok(Box::new(CoCo3::new(config, roms)?))
}

inventory::submit! {
    MachineEntry::new("coco3", COCO3_ROM_NAME, create_machine)
}
