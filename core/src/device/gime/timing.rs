//! Per-revision and per-mode timing constants. All horizontal positions are
//! master ticks measured from the falling edge of horizontal sync.

/// Ticks per scanline.
pub const LINE_TICKS: u32 = 912;

/// First tick of the line handed to the display sink.
pub const VISIBLE_START: u32 = 120;

/// One past the last visible tick.
pub const VISIBLE_END: u32 = 872;

/// Pixel entries per rendered line, one per tick of the visible window.
pub const LINE_PIXELS: usize = (VISIBLE_END - VISIBLE_START) as usize;

/// Lines of vertical sync at the top of every field.
pub const VSYNC_LINES: u16 = 4;

/// Chip revision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Revision {
    Gime1986,
    #[default]
    Gime1987,
}

/// Field rate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TvStandard {
    #[default]
    Ntsc60,
    Pal50,
}

impl TvStandard {
    pub fn lines_per_field(self) -> u16 {
        match self {
            TvStandard::Ntsc60 => 263,
            TvStandard::Pal50 => 314,
        }
    }
}

/// Timing constants that differ between revisions.
#[derive(Clone, Copy, Debug)]
pub struct RevisionTiming {
    /// Width of the horizontal sync pulse.
    pub hs_width: u32,
    /// VBorder point relative to HS fall.
    pub vborder_offset: u32,
    /// Start of the active area for the 512-tick (32/64 column) class.
    pub active_start_512: u32,
    /// Start of the active area for the 640-tick (40/80 column) class.
    pub active_start_640: u32,
    /// Extra timer counts before the first underflow.
    pub timer_extra: u16,
}

impl Revision {
    pub fn timing(self) -> &'static RevisionTiming {
        match self {
            Revision::Gime1986 => &GIME_1986,
            Revision::Gime1987 => &GIME_1987,
        }
    }
}

const GIME_1986: RevisionTiming = RevisionTiming {
    hs_width: 80,
    vborder_offset: 16,
    active_start_512: 240,
    active_start_640: 176,
    timer_extra: 2,
};

const GIME_1987: RevisionTiming = RevisionTiming {
    hs_width: 80,
    vborder_offset: 24,
    active_start_512: 232,
    active_start_640: 168,
    timer_extra: 1,
};

/// Active lines per field selected by VRES bits 5-6.
pub const LPF_LINES: [u16; 4] = [192, 200, 210, 225];

/// Top border lines for each LPF at 60 Hz and 50 Hz.
const TOP_BORDER_60: [u16; 4] = [36, 32, 27, 19];
const TOP_BORDER_50: [u16; 4] = [63, 59, 54, 46];

/// Bytes per row in graphics mode, indexed by HRES.
pub const HRES_BYTES: [u16; 8] = [16, 20, 32, 40, 64, 80, 128, 160];

/// Character columns in text mode, indexed by HRES.
pub const HRES_COLUMNS: [u16; 8] = [32, 40, 32, 40, 64, 80, 64, 80];

/// Lines per character row, indexed by LPR. `None` never advances.
pub const LPR_LINES: [Option<u8>; 8] = [
    Some(1),
    Some(2),
    Some(3),
    Some(8),
    Some(9),
    Some(10),
    Some(12),
    None,
];

/// CoCo-compatible geometry from the SAM V bits: (bytes per row, lines per row).
pub const SAM_V_GEOMETRY: [(u16, u8); 8] = [
    (32, 12),
    (16, 3),
    (32, 3),
    (16, 2),
    (32, 2),
    (16, 1),
    (32, 1),
    (32, 1),
];

/// Vertical layout of one field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldLayout {
    pub lines: u16,
    /// First active line.
    pub active_start: u16,
    /// First bottom-border line.
    pub active_end: u16,
}

impl FieldLayout {
    pub fn new(tv: TvStandard, lpf: usize) -> Self {
        let lpf = lpf & 0x03;
        let top = match tv {
            TvStandard::Ntsc60 => TOP_BORDER_60[lpf],
            TvStandard::Pal50 => TOP_BORDER_50[lpf],
        };
        let active_start = VSYNC_LINES + top;
        Self {
            lines: tv.lines_per_field(),
            active_start,
            active_end: active_start + LPF_LINES[lpf],
        }
    }

    pub fn bottom_border(&self) -> u16 {
        self.lines - self.active_end
    }
}

/// Horizontal geometry of one line, recomputed at the VBorder point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineGeometry {
    pub active_start: u32,
    pub active_width: u32,
}

impl LineGeometry {
    pub fn new(timing: &RevisionTiming, wide: bool) -> Self {
        if wide {
            Self {
                active_start: timing.active_start_640,
                active_width: 640,
            }
        } else {
            Self {
                active_start: timing.active_start_512,
                active_width: 512,
            }
        }
    }

    pub fn active_end(&self) -> u32 {
        self.active_start + self.active_width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_layouts_fill_the_field() {
        for tv in [TvStandard::Ntsc60, TvStandard::Pal50] {
            for lpf in 0..4 {
                let layout = FieldLayout::new(tv, lpf);
                assert_eq!(
                    VSYNC_LINES + (layout.active_start - VSYNC_LINES) + LPF_LINES[lpf]
                        + layout.bottom_border(),
                    tv.lines_per_field()
                );
            }
        }
        assert_eq!(FieldLayout::new(TvStandard::Ntsc60, 0).bottom_border(), 31);
        assert_eq!(FieldLayout::new(TvStandard::Pal50, 3).bottom_border(), 39);
    }

    #[test]
    fn active_area_fits_visible_window() {
        for rev in [Revision::Gime1986, Revision::Gime1987] {
            for wide in [false, true] {
                let g = LineGeometry::new(rev.timing(), wide);
                assert!(g.active_start >= VISIBLE_START);
                assert!(g.active_end() <= VISIBLE_END);
                assert!(rev.timing().vborder_offset < VISIBLE_START);
            }
        }
    }
}
