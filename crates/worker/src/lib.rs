//! Thread and task spawning primitives for the workbench.
//!
//! Every thread or task the workbench starts goes through here so it carries a
//! [`TaskClass`] label in traces.

mod class;
mod panic;
mod spawn;

pub use class::TaskClass;
pub use panic::{catch_panic, panic_message};
pub use spawn::{runtime_handle, spawn, spawn_named_thread};
