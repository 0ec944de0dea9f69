pub mod core;
pub mod cpu;
pub mod device;

pub mod prelude {
    pub use crate::core::event::{EventHandler, Scheduler, Tick};
    pub use crate::core::machine::Machine;
    pub use crate::core::{Bus, Component, HookAction, InterruptState};
    pub use crate::cpu::Cpu;
}
