use crate::device::Breakpoints;

/// Machine-agnostic interface used by the frontend.
///
/// A machine owns its CPU, scheduler and peripherals and exposes only whole
/// frames and an RGB24 view of the last completed frame.
pub trait Machine {
    /// Output resolution as (width, height) in pixels.
    fn display_size(&self) -> (u32, u32);

    /// Run until the video engine completes the current field.
    fn run_frame(&mut self);

    /// Copy the last completed frame into `buffer` as RGB24.
    ///
    /// The buffer must hold at least `width * height * 3` bytes.
    fn render_frame(&self, buffer: &mut [u8]);

    /// Reset the machine. The master oscillator keeps running; persistent
    /// events are re-queued relative to the current tick.
    fn reset(&mut self);

    /// True once a breakpoint handler asked for execution to stop.
    fn stopped(&self) -> bool {
        false
    }

    /// Breakpoint table consulted by the machine's bus, if it has one.
    fn breakpoints(&mut self) -> Option<&mut Breakpoints> {
        None
    }
}
