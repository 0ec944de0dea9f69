/// Result of a hook invoked by the CPU or the bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HookAction {
    /// Keep executing.
    #[default]
    Continue,
    /// Return control to the caller of `run()` at the next instruction boundary.
    Stop,
}

/// Address the CPU drives during a dead cycle.
pub const DEAD_ADDRESS: u16 = 0xFFFF;

/// CPU-side bus delegate.
///
/// The CPU announces every bus cycle through [`Bus::cycle`]. This is the only
/// place global time advances: the implementor translates the address, moves
/// the scheduler forward by the cost of the cycle, runs any events that fell
/// due and then performs the transfer against the shared data latch.
pub trait Bus {
    /// Run `ncycles` identical bus cycles at `address`.
    ///
    /// For reads the implementor stores the value in `data` before returning;
    /// for writes it consumes `data`.
    fn cycle(&mut self, ncycles: u16, is_read: bool, address: u16, data: &mut u8);

    /// Run `ncycles` dead (VMA-less) cycles. On the pins these are reads of
    /// [`DEAD_ADDRESS`] whose result is ignored, which is what the default
    /// does; override to tell them apart from real reads of that address.
    fn dead_cycle(&mut self, ncycles: u16, data: &mut u8) {
        self.cycle(ncycles, true, DEAD_ADDRESS, data);
    }

    /// Aggregated interrupt and halt lines, sampled by the CPU after each cycle.
    fn check_interrupts(&self) -> InterruptState;

    /// Polled after every CPU state transition. Returning false clears the
    /// CPU's running flag so that `run()` returns.
    fn running(&self) -> bool {
        true
    }

    /// Called at each instruction boundary with the address about to be fetched.
    fn instruction_hook(&mut self, _pc: u16) -> HookAction {
        HookAction::Continue
    }

    /// Single read cycle.
    fn read(&mut self, address: u16) -> u8 {
        let mut data = 0;
        self.cycle(1, true, address, &mut data);
        data
    }

    /// Single write cycle.
    fn write(&mut self, address: u16, data: u8) {
        let mut data = data;
        self.cycle(1, false, address, &mut data);
    }
}

/// Levels of the CPU's interrupt inputs.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterruptState {
    pub nmi: bool,
    pub firq: bool,
    pub irq: bool,
    /// Bus request: the CPU stops at the next instruction boundary while set.
    pub halt: bool,
}
