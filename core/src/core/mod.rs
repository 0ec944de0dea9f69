pub mod bus;
pub mod component;
pub mod event;
pub mod machine;

pub use bus::{Bus, DEAD_ADDRESS, HookAction, InterruptState};
pub use component::{Component, PartError};
pub use event::{EventHandler, Scheduler, Tick};
pub use machine::Machine;
