//! GIME video timing engine.
//!
//! Beam timing is driven entirely by scheduler events relative to each line's
//! falling edge of horizontal sync. Pixels are expanded lazily: a line is
//! rendered when it completes, or up to the current tick when a register that
//! affects the picture is about to change.
//!
//! The engine also carries the GIME's interrupt latches and 12-bit timer. The
//! memory management unit is not modelled; RAM is reached through the
//! SAM-compatible decode.

mod render;
mod timing;

pub use render::{FrameBuffer, NullSink, VideoMemory, VideoSink, rgb};
pub use timing::{
    FieldLayout, LINE_PIXELS, LINE_TICKS, LineGeometry, Revision, RevisionTiming, TvStandard,
    VISIBLE_END, VISIBLE_START, VSYNC_LINES,
};

use crate::core::{Component, Scheduler, Tick};
use timing::{HRES_BYTES, HRES_COLUMNS, LPR_LINES, SAM_V_GEOMETRY};

/// Events owned by the video engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VideoEvent {
    HsFall,
    HsRise,
    VBorder,
    HBorder,
    Timer,
}

/// Sync edges produced while handling one event. The machine routes these to
/// whatever is wired to HS and FS.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VideoSignals {
    pub hs: Option<bool>,
    pub fs: Option<bool>,
}

// Interrupt sources, as laid out in $FF92 / $FF93
pub const INT_TMR: u8 = 0x20;
pub const INT_HBORD: u8 = 0x10;
pub const INT_VBORD: u8 = 0x08;
pub const INT_EI2: u8 = 0x04;
pub const INT_EI1: u8 = 0x02;
pub const INT_EI0: u8 = 0x01;

// $FF90 INIT0
const INIT0_COCO: u8 = 0x80;
const INIT0_IEN: u8 = 0x20;
const INIT0_FEN: u8 = 0x10;
// $FF91 INIT1
const INIT1_TINS: u8 = 0x20;
// $FF98 VMODE
const VMODE_BP: u8 = 0x80;
const VMODE_BPI: u8 = 0x20;
const VMODE_H50: u8 = 0x08;
// $FF9F
const HOFFSET_HVEN: u8 = 0x80;

// Register file offsets from $FF90
const R_INIT0: usize = 0x0;
const R_INIT1: usize = 0x1;
const R_IRQ: usize = 0x2;
const R_FIRQ: usize = 0x3;
const R_TIMER_HI: usize = 0x4;
const R_TIMER_LO: usize = 0x5;
const R_VMODE: usize = 0x8;
const R_VRES: usize = 0x9;
const R_BORDER: usize = 0xA;
const R_VOFFSET_HI: usize = 0xD;
const R_VOFFSET_LO: usize = 0xE;
const R_HOFFSET: usize = 0xF;

/// Timer input period in ticks when clocked from the 3.58 MHz source.
const TIMER_FAST_TICKS: u32 = 4;

/// Vertical region of the current line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Phase {
    #[default]
    Sync,
    TopBorder,
    Active,
    BottomBorder,
}

/// Serialisable engine state. Line start is stored relative to the snapshot
/// time; pending events live in the scheduler snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GimeState {
    pub revision: Revision,
    pub tv: TvStandard,
    pub regs: [u8; 16],
    pub palette: [u8; 16],
    pub irq_latch: u8,
    pub firq_latch: u8,
    pub timer_count: u16,
    pub line: u16,
    pub line_start: i32,
    pub beam: u32,
    pub phase: Phase,
    pub layout: FieldLayout,
    pub geometry: LineGeometry,
    pub row_counter: u8,
    pub row_addr: u32,
    pub sam_v: u8,
    pub sam_f: u8,
    pub hs: bool,
    pub fs: bool,
    pub frame_skip: u32,
    pub skip_counter: u32,
    pub rendering: bool,
    pub line_pixels: Vec<u8>,
}

pub struct Gime {
    revision: Revision,
    tv: TvStandard,

    /// $FF90-$FF9F as last written.
    regs: [u8; 16],
    palette: [u8; 16],
    irq_latch: u8,
    firq_latch: u8,
    /// Counts remaining before the next timer underflow.
    timer_count: u16,

    // SAM video bits, used in CoCo-compatible mode
    sam_v: u8,
    sam_f: u8,

    // Beam
    line: u16,
    line_start: Tick,
    /// Ticks of the current line already rendered.
    beam: u32,
    phase: Phase,
    layout: FieldLayout,
    geometry: LineGeometry,
    row_counter: u8,
    row_addr: u32,
    hs: bool,
    fs: bool,

    // Output
    line_pixels: Vec<u8>,
    font: Vec<u8>,
    frame_skip: u32,
    skip_counter: u32,
    rendering: bool,
    frames: u64,
}

impl Gime {
    pub fn new(revision: Revision, tv: TvStandard) -> Self {
        Self {
            revision,
            tv,
            regs: [0; 16],
            palette: [0; 16],
            irq_latch: 0,
            firq_latch: 0,
            timer_count: 0,
            sam_v: 0,
            sam_f: 0,
            line: 0,
            line_start: Tick::ZERO,
            beam: 0,
            phase: Phase::Sync,
            layout: FieldLayout::new(tv, 0),
            geometry: LineGeometry::new(revision.timing(), false),
            row_counter: 0,
            row_addr: 0,
            hs: true,
            fs: true,
            line_pixels: vec![0; LINE_PIXELS],
            font: Vec::new(),
            frame_skip: 1,
            skip_counter: 0,
            rendering: true,
            frames: 0,
        }
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// Render one frame in every `n`. Zero is treated as one.
    pub fn set_frame_skip(&mut self, n: u32) {
        self.frame_skip = n.max(1);
        self.skip_counter %= self.frame_skip;
    }

    /// Character generator for text modes: 128 glyphs, one byte per row,
    /// `font.len() / 128` rows each.
    pub fn set_font(&mut self, font: Vec<u8>) {
        self.font = font;
    }

    pub fn palette(&self) -> &[u8; 16] {
        &self.palette
    }

    pub fn line(&self) -> u16 {
        self.line
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn layout(&self) -> FieldLayout {
        self.layout
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn hs(&self) -> bool {
        self.hs
    }

    pub fn fs(&self) -> bool {
        self.fs
    }

    #[inline]
    fn coco_mode(&self) -> bool {
        self.regs[R_INIT0] & INIT0_COCO != 0
    }

    #[inline]
    fn graphics(&self) -> bool {
        self.regs[R_VMODE] & VMODE_BP != 0
    }

    #[inline]
    fn hres(&self) -> usize {
        usize::from((self.regs[R_VRES] >> 2) & 0x07)
    }

    #[inline]
    fn cres(&self) -> u8 {
        self.regs[R_VRES] & 0x03
    }

    #[inline]
    fn lpf(&self) -> usize {
        usize::from((self.regs[R_VRES] >> 5) & 0x03)
    }

    fn field_standard(&self) -> TvStandard {
        if self.regs[R_VMODE] & VMODE_H50 != 0 {
            TvStandard::Pal50
        } else {
            self.tv
        }
    }

    /// 640-tick active area for the 40/80 column class.
    fn wide(&self) -> bool {
        !self.coco_mode() && self.hres() & 1 != 0
    }

    fn burst_phase(&self) -> u8 {
        u8::from(self.regs[R_VMODE] & VMODE_BPI != 0)
    }

    // ===== Interrupts =====

    /// Latch `sources` in whichever enable registers select them.
    pub fn raise(&mut self, sources: u8) {
        self.irq_latch |= sources & self.regs[R_IRQ];
        self.firq_latch |= sources & self.regs[R_FIRQ];
    }

    pub fn irq(&self) -> bool {
        self.regs[R_INIT0] & INIT0_IEN != 0 && self.irq_latch != 0
    }

    pub fn firq(&self) -> bool {
        self.regs[R_INIT0] & INIT0_FEN != 0 && self.firq_latch != 0
    }

    // ===== Registers =====

    /// Registers whose value is visible in the picture.
    pub fn affects_rendering(addr: u16) -> bool {
        matches!(addr, 0xFF90 | 0xFF98..=0xFF9F | 0xFFB0..=0xFFBF)
    }

    /// Read $FF90-$FF9F or the palette. Reading $FF92 / $FF93 returns and
    /// clears the latched sources.
    pub fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0xFF92 => std::mem::take(&mut self.irq_latch),
            0xFF93 => std::mem::take(&mut self.firq_latch),
            0xFF90..=0xFF9F => self.regs[usize::from(addr & 0x0F)],
            0xFFB0..=0xFFBF => self.palette[usize::from(addr & 0x0F)],
            _ => 0xFF,
        }
    }

    /// Write a register at `now`. The current line is rendered up to `now`
    /// first when the write changes the picture.
    pub fn write<E, M>(&mut self, addr: u16, data: u8, now: Tick, scheduler: &mut Scheduler<E>, mem: &M)
    where
        E: From<VideoEvent> + Copy + PartialEq,
        M: VideoMemory + ?Sized,
    {
        if Self::affects_rendering(addr) {
            self.render_to(now, mem);
        }
        match addr {
            0xFF90..=0xFF9F => {
                let reg = usize::from(addr & 0x0F);
                let old = self.regs[reg];
                self.regs[reg] = data;
                match reg {
                    R_INIT1 if (old ^ data) & INIT1_TINS != 0 => self.restart_timer(now, scheduler),
                    R_IRQ => self.irq_latch &= data,
                    R_FIRQ => self.firq_latch &= data,
                    R_TIMER_HI => self.restart_timer(now, scheduler),
                    R_VRES if self.graphics() && self.cres() == 3 => {
                        log::warn!("GIME colour resolution 3 is undefined, using 16 colours");
                    }
                    _ => {}
                }
            }
            0xFFB0..=0xFFBF => self.palette[usize::from(addr & 0x0F)] = data & 0x3F,
            _ => {}
        }
    }

    /// Update the SAM V and F bits used by CoCo-compatible modes.
    pub fn set_sam_video<M: VideoMemory + ?Sized>(&mut self, v: u8, f: u8, now: Tick, mem: &M) {
        self.render_to(now, mem);
        self.sam_v = v & 0x07;
        self.sam_f = f & 0x7F;
    }

    // ===== Timer =====

    fn timer_reload(&self) -> u16 {
        (u16::from(self.regs[R_TIMER_HI] & 0x0F) << 8) | u16::from(self.regs[R_TIMER_LO])
    }

    fn timer_period(&self) -> u16 {
        self.timer_reload() + self.revision.timing().timer_extra
    }

    fn timer_fast(&self) -> bool {
        self.regs[R_INIT1] & INIT1_TINS != 0
    }

    fn restart_timer<E: From<VideoEvent> + Copy + PartialEq>(&mut self, now: Tick, scheduler: &mut Scheduler<E>) {
        scheduler.cancel(VideoEvent::Timer.into());
        if self.timer_reload() == 0 {
            self.timer_count = 0;
            return;
        }
        self.timer_count = self.timer_period();
        if self.timer_fast() {
            scheduler.schedule(
                VideoEvent::Timer.into(),
                now + u32::from(self.timer_count) * TIMER_FAST_TICKS,
            );
        }
    }

    /// One count of the horizontal-sync timer clock.
    fn clock_timer_slow(&mut self) {
        if self.timer_fast() || self.timer_count == 0 {
            return;
        }
        self.timer_count -= 1;
        if self.timer_count == 0 {
            self.raise(INT_TMR);
            self.timer_count = self.timer_period();
        }
    }

    // ===== Beam =====

    /// Begin line timing at the scheduler's current tick, at the top of a
    /// field. Any pending video events are replaced.
    pub fn start<E: From<VideoEvent> + Copy + PartialEq>(&mut self, scheduler: &mut Scheduler<E>) {
        self.line_start = scheduler.now();
        self.beam = 0;
        self.line = 0;
        self.begin_field();
        self.schedule_line(scheduler);
    }

    fn schedule_line<E: From<VideoEvent> + Copy + PartialEq>(&self, scheduler: &mut Scheduler<E>) {
        let timing = self.revision.timing();
        scheduler.schedule(VideoEvent::HsRise.into(), self.line_start + timing.hs_width);
        scheduler.schedule(VideoEvent::VBorder.into(), self.line_start + timing.vborder_offset);
        scheduler.schedule(VideoEvent::HsFall.into(), self.line_start + LINE_TICKS);
    }

    fn begin_field(&mut self) {
        let lpf = if self.coco_mode() { 0 } else { self.lpf() };
        self.layout = FieldLayout::new(self.field_standard(), lpf);
        self.rendering = self.skip_counter == 0;
        self.skip_counter = (self.skip_counter + 1) % self.frame_skip;
    }

    /// Dispatch one of the engine's events.
    pub fn handle_event<E, M, S>(
        &mut self,
        event: VideoEvent,
        at: Tick,
        scheduler: &mut Scheduler<E>,
        mem: &M,
        sink: &mut S,
    ) -> VideoSignals
    where
        E: From<VideoEvent> + Copy + PartialEq,
        M: VideoMemory + ?Sized,
        S: VideoSink + ?Sized,
    {
        let mut signals = VideoSignals::default();
        match event {
            VideoEvent::HsFall => {
                self.render_to(at, mem);
                self.finish_line(sink);
                self.line_start = at;
                self.beam = 0;
                self.line += 1;
                if self.line >= self.layout.lines {
                    self.line = 0;
                    sink.end_frame();
                    self.frames += 1;
                    self.begin_field();
                }
                self.clock_timer_slow();
                self.hs = false;
                signals.hs = Some(false);
                self.schedule_line(scheduler);
            }
            VideoEvent::HsRise => {
                self.hs = true;
                signals.hs = Some(true);
            }
            VideoEvent::VBorder => {
                signals.fs = self.vertical_transition();
                self.geometry = LineGeometry::new(self.revision.timing(), self.wide());
                scheduler.schedule(
                    VideoEvent::HBorder.into(),
                    self.line_start + self.geometry.active_end(),
                );
            }
            VideoEvent::HBorder => {
                self.render_to(at, mem);
                self.raise(INT_HBORD);
                if self.phase == Phase::Active {
                    self.advance_row();
                }
            }
            VideoEvent::Timer => {
                if self.timer_fast() && self.timer_reload() != 0 {
                    self.raise(INT_TMR);
                    self.timer_count = self.timer_period();
                    scheduler.schedule(
                        VideoEvent::Timer.into(),
                        at + u32::from(self.timer_count) * TIMER_FAST_TICKS,
                    );
                }
            }
        }
        signals
    }

    /// Work out the vertical region for the current line. Returns a field
    /// sync edge when one happens here.
    fn vertical_transition(&mut self) -> Option<bool> {
        let line = self.line;
        let layout = self.layout;
        let mut fs = None;
        if line == 0 {
            self.fs = false;
            fs = Some(false);
        } else if line == VSYNC_LINES {
            self.fs = true;
            fs = Some(true);
        }
        self.phase = if line < VSYNC_LINES {
            Phase::Sync
        } else if line < layout.active_start {
            Phase::TopBorder
        } else if line < layout.active_end {
            Phase::Active
        } else {
            Phase::BottomBorder
        };
        if line == layout.active_start {
            self.row_counter = 0;
            self.row_addr = self.video_base();
        }
        if line == layout.active_end {
            self.raise(INT_VBORD);
        }
        fs
    }

    fn video_base(&self) -> u32 {
        if self.coco_mode() {
            u32::from(self.sam_f) << 9
        } else {
            let mut base =
                (u32::from(self.regs[R_VOFFSET_HI]) << 11) | (u32::from(self.regs[R_VOFFSET_LO]) << 3);
            let h = self.regs[R_HOFFSET];
            if h & HOFFSET_HVEN != 0 {
                base += u32::from(h & 0x7F) * 2;
            }
            base
        }
    }

    fn text_attributes(&self) -> bool {
        self.cres() & 1 != 0
    }

    fn row_stride(&self) -> u32 {
        if self.coco_mode() {
            u32::from(SAM_V_GEOMETRY[usize::from(self.sam_v)].0)
        } else if self.regs[R_HOFFSET] & HOFFSET_HVEN != 0 {
            256
        } else if self.graphics() {
            u32::from(HRES_BYTES[self.hres()])
        } else {
            let per_char = if self.text_attributes() { 2 } else { 1 };
            u32::from(HRES_COLUMNS[self.hres()]) * per_char
        }
    }

    fn advance_row(&mut self) {
        if self.coco_mode() {
            // 4-bit divider: a row height lowered below the current count
            // only takes effect after the counter wraps at 16
            let lines = SAM_V_GEOMETRY[usize::from(self.sam_v)].1;
            self.row_counter = (self.row_counter + 1) & 0x0F;
            if self.row_counter == lines || self.row_counter == 0 {
                self.row_counter = 0;
                self.row_addr += self.row_stride();
            }
        } else {
            match LPR_LINES[usize::from(self.regs[R_VMODE] & 0x07)] {
                Some(lines) => {
                    self.row_counter += 1;
                    if self.row_counter >= lines {
                        self.row_counter = 0;
                        self.row_addr += self.row_stride();
                    }
                }
                None => self.row_counter = (self.row_counter + 1) & 0x0F,
            }
        }
    }

    // ===== Rendering =====

    /// Expand the current line up to `now`.
    pub fn render_to<M: VideoMemory + ?Sized>(&mut self, now: Tick, mem: &M) {
        let target = self.line_start.delta(now).clamp(0, LINE_TICKS as i32) as u32;
        if target <= self.beam {
            return;
        }
        if self.rendering && self.phase != Phase::Sync {
            let from = self.beam.max(VISIBLE_START);
            let to = target.min(VISIBLE_END);
            for t in from..to {
                self.line_pixels[(t - VISIBLE_START) as usize] = self.pixel_at(t, mem);
            }
        }
        self.beam = target;
    }

    fn finish_line<S: VideoSink + ?Sized>(&mut self, sink: &mut S) {
        let pixels = if self.rendering && self.phase != Phase::Sync {
            Some(&self.line_pixels[..])
        } else {
            None
        };
        sink.render_line(self.burst_phase(), LINE_PIXELS, pixels);
    }

    fn border(&self) -> u8 {
        self.regs[R_BORDER] & 0x3F
    }

    fn pixel_at<M: VideoMemory + ?Sized>(&self, t: u32, mem: &M) -> u8 {
        let g = self.geometry;
        if self.phase != Phase::Active || t < g.active_start || t >= g.active_end() {
            return self.border();
        }
        let offset = t - g.active_start;
        if self.coco_mode() {
            self.coco_pixel(offset, mem)
        } else if self.graphics() {
            self.graphics_pixel(offset, g.active_width, mem)
        } else {
            self.text_pixel(offset, g.active_width, mem)
        }
    }

    /// Colour index of pixel `px` in a packed row of `bpp`-bit pixels.
    fn packed_index<M: VideoMemory + ?Sized>(&self, px: u32, bpp: u32, mem: &M) -> usize {
        let bit = px * bpp;
        let byte = mem.fetch(self.row_addr + bit / 8);
        let shift = 8 - bpp - (bit % 8);
        usize::from((byte >> shift) & ((1u8 << bpp) - 1))
    }

    fn graphics_pixel<M: VideoMemory + ?Sized>(&self, offset: u32, width: u32, mem: &M) -> u8 {
        let bpp = match self.cres() {
            0 => 1,
            1 => 2,
            _ => 4,
        };
        let per_row = u32::from(HRES_BYTES[self.hres()]) * 8 / bpp;
        let px = offset * per_row / width;
        self.palette[self.packed_index(px, bpp, mem)]
    }

    fn glyph_row(&self, ch: u8, row: u8) -> u8 {
        let height = self.font.len() / 128;
        if usize::from(row) >= height {
            return 0;
        }
        self.font[usize::from(ch & 0x7F) * height + usize::from(row)]
    }

    fn text_pixel<M: VideoMemory + ?Sized>(&self, offset: u32, width: u32, mem: &M) -> u8 {
        let columns = u32::from(HRES_COLUMNS[self.hres()]);
        let cell = width / columns;
        let col = offset / cell;
        let x = (offset % cell) * 8 / cell;
        let attributes = self.text_attributes();
        let addr = self.row_addr + col * if attributes { 2 } else { 1 };
        let ch = mem.fetch(addr);
        let (fg, bg, underline) = if attributes {
            let attr = mem.fetch(addr + 1);
            let last_row = LPR_LINES[usize::from(self.regs[R_VMODE] & 0x07)]
                .is_some_and(|lines| self.row_counter + 1 == lines);
            (
                8 + usize::from((attr >> 3) & 0x07),
                usize::from(attr & 0x07),
                attr & 0x40 != 0 && last_row,
            )
        } else {
            (1, 0, false)
        };
        let on = underline || self.glyph_row(ch, self.row_counter) & (0x80 >> x) != 0;
        self.palette[if on { fg } else { bg }]
    }

    fn coco_pixel<M: VideoMemory + ?Sized>(&self, offset: u32, mem: &M) -> u8 {
        let (bytes, _) = SAM_V_GEOMETRY[usize::from(self.sam_v)];
        if self.sam_v == 0 {
            // 32 x 16 text, 16 ticks per cell
            let ch = mem.fetch(self.row_addr + offset / 16);
            let x = (offset % 16) / 2;
            let on = self.glyph_row(ch, self.row_counter) & (0x80 >> x) != 0;
            return self.palette[if on { 12 } else { 13 }];
        }
        let bpp = if bytes == 16 || self.sam_v == 6 { 1 } else { 2 };
        let per_row = u32::from(bytes) * 8 / bpp;
        let px = offset * per_row / 512;
        self.palette[8 + self.packed_index(px, bpp, mem)]
    }

    // ===== Snapshot =====

    pub fn snapshot(&self, now: Tick) -> GimeState {
        GimeState {
            revision: self.revision,
            tv: self.tv,
            regs: self.regs,
            palette: self.palette,
            irq_latch: self.irq_latch,
            firq_latch: self.firq_latch,
            timer_count: self.timer_count,
            line: self.line,
            line_start: now.delta(self.line_start),
            beam: self.beam,
            phase: self.phase,
            layout: self.layout,
            geometry: self.geometry,
            row_counter: self.row_counter,
            row_addr: self.row_addr,
            sam_v: self.sam_v,
            sam_f: self.sam_f,
            hs: self.hs,
            fs: self.fs,
            frame_skip: self.frame_skip,
            skip_counter: self.skip_counter,
            rendering: self.rendering,
            line_pixels: self.line_pixels.clone(),
        }
    }

    /// Restore from a snapshot taken at any time, rebased onto `now`.
    pub fn restore(&mut self, state: &GimeState, now: Tick) {
        self.revision = state.revision;
        self.tv = state.tv;
        self.regs = state.regs;
        self.palette = state.palette;
        self.irq_latch = state.irq_latch;
        self.firq_latch = state.firq_latch;
        self.timer_count = state.timer_count;
        self.line = state.line;
        self.line_start = now.offset(state.line_start);
        self.beam = state.beam;
        self.phase = state.phase;
        self.row_counter = state.row_counter;
        self.row_addr = state.row_addr;
        self.sam_v = state.sam_v;
        self.sam_f = state.sam_f;
        self.hs = state.hs;
        self.fs = state.fs;
        self.frame_skip = state.frame_skip.max(1);
        self.skip_counter = state.skip_counter % self.frame_skip;
        self.rendering = state.rendering;
        self.line_pixels = state.line_pixels.clone();
        self.line_pixels.resize(LINE_PIXELS, 0);
        self.layout = state.layout;
        self.geometry = state.geometry;
    }
}

impl Component for Gime {
    fn name(&self) -> &'static str {
        match self.revision {
            Revision::Gime1986 => "GIME-1986",
            Revision::Gime1987 => "GIME-1987",
        }
    }

    /// Registers and latches clear; the beam keeps running.
    fn reset(&mut self) {
        self.regs = [0; 16];
        self.palette = [0; 16];
        self.irq_latch = 0;
        self.firq_latch = 0;
        self.timer_count = 0;
        self.sam_v = 0;
        self.sam_f = 0;
    }
}
