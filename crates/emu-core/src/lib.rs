//! Collaborator traits for the NABU platform.
//!
//! The platform glue never talks to a concrete CPU core, window, or audio
//! device. It sees them through the traits in this crate, and the chips
//! expose their state through [`Observable`].

mod bus;
mod clock;
mod cpu;
mod observable;
mod presenter;
mod tickable;

pub use bus::{Bus, IoBus};
pub use clock::{Clock, SystemClock};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use presenter::Presenter;
pub use tickable::Tickable;
