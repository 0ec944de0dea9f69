pub mod breakpoint;
pub mod gime;
pub mod interrupt;
pub mod mc6821;
pub mod memory;
pub mod sam;

pub use breakpoint::{BreakKind, BreakpointHandler, BreakpointId, Breakpoints};
pub use gime::{FrameBuffer, Gime, VideoEvent, VideoMemory, VideoSignals, VideoSink};
pub use interrupt::{InterruptAggregator, Line, Source};
pub use mc6821::Mc6821;
pub use memory::{Memory, Ram, Rom};
pub use sam::{RamAddress, Sam, Select, Translation};
