//! NABU Personal Computer platform.
//!
//! Everything on the NABU logic board except the chip cores: the memory
//! overlay and port decoder, the PSG-driven interrupt priority network,
//! the floppy controller card, the keyboard byte queue, the cable-modem
//! link, and the scanline scheduler that ties them to a CPU.
//!
//! The CPU is anything implementing [`emu_core::Cpu`]. The host supplies
//! a [`emu_core::Presenter`] for frames, an [`InputSource`] for key and
//! control events, and pulls audio through [`SharedPsg::fill`].

mod audio;
mod bus;
mod config;
mod control;
mod error;
pub mod fdc;
mod input;
pub mod interrupts;
pub mod keyboard;
mod keyboard_map;
mod memory;
mod modem;
mod nabu;
mod video;

pub use audio::{PSG_CLOCK_HZ, SharedPsg};
pub use bus::{NabuBus, Violation};
pub use config::{
    DEFAULT_ROM, DEFAULT_SAMPLE_RATE, DEFAULT_WATCHDOG_SCANLINES, DriveConfig, ModemConfig,
    NabuConfig, ViolationPolicy,
};
pub use control::{Control, ControlRegister, POWER_ON_CONTROL, ParallelPort};
pub use error::{NabuError, Result};
pub use fdc::{DiskController, DiskImage, DiskKind, FdcMode, FdcStatus};
pub use input::{EventQueue, HostEvent, InputSource, NoInput};
pub use interrupts::{EncoderOutput, InterruptController, InterruptLine};
pub use keyboard::KeyboardQueue;
pub use keyboard_map::{Joystick, Modifiers, NabuKey, joystick_report, translate_char};
pub use memory::{AddressSpace, Rom};
pub use modem::{Modem, NullModem, TcpModem};
pub use nabu::{
    CYCLES_PER_SCANLINE, Nabu, SCANLINE_DURATION, SCANLINES_PER_FRAME, VISIBLE_SCANLINES,
};
pub use video::{Display, FRAME_HEIGHT, FRAME_WIDTH};
