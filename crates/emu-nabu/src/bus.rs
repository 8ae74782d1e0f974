//! NABU bus: memory overlay and I/O port routing.
//!
//! The bus owns every device the CPU can reach. The CPU core calls back
//! into it through `emu_core::Bus` / `emu_core::IoBus` and never holds a
//! reference to anything else.
//!
//! # Port map
//!
//! Only A0–A7 are decoded.
//!
//! | Port      | Read                        | Write                    |
//! |-----------|-----------------------------|--------------------------|
//! | $00       | (write-only)                | Control register         |
//! | $40       | PSG data                    | PSG data                 |
//! | $41       | (write-only)                | PSG address latch        |
//! | $80       | Modem data                  | Modem data               |
//! | $90       | Keyboard data               | ignored                  |
//! | $91       | Keyboard status             | ignored                  |
//! | $A0       | VDP data                    | VDP data                 |
//! | $A1       | VDP status                  | VDP control              |
//! | $B0       | 0                           | Parallel data latch      |
//! | $C0–$CF   | Floppy controller           | Floppy controller        |
//!
//! Anything else reads 0 and ignores writes.

#![allow(clippy::cast_possible_truncation)]

use emu_core::{Bus, IoBus};
use gi_ay_3_8910::{PORT_A, PORT_B, REGISTER_COUNT};
use ti_tms9918::Tms9918;

use crate::audio::SharedPsg;
use crate::config::ViolationPolicy;
use crate::control::{ControlRegister, ParallelPort};
use crate::error::NabuError;
use crate::fdc::DiskController;
use crate::interrupts::{InterruptController, InterruptLine};
use crate::keyboard::{EMPTY, KeyboardQueue, POWER_UP};
use crate::memory::{AddressSpace, Rom};
use crate::modem::{Modem, NullModem};

/// A guest access the hardware leaves undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// PSG address latch written with a value above 0x1F.
    PsgRegister(u8),
    /// Read from a port that only latches writes.
    WriteOnlyPort(u8),
}

impl Violation {
    /// Attach the program counter the access came from.
    #[must_use]
    pub fn into_error(self, pc: u16) -> NabuError {
        match self {
            Self::PsgRegister(value) => NabuError::PsgRegister { value, pc },
            Self::WriteOnlyPort(port) => NabuError::WriteOnlyPort { port, pc },
        }
    }
}

/// The NABU bus, implementing `emu_core::IoBus`.
pub struct NabuBus {
    pub memory: AddressSpace,
    pub control: ControlRegister,
    pub parallel: ParallelPort,
    pub psg: SharedPsg,
    pub vdp: Tms9918,
    pub interrupts: InterruptController,
    pub fdc: DiskController,
    pub keyboard: KeyboardQueue,
    pub modem: Box<dyn Modem>,

    policy: ViolationPolicy,
    /// First undefined access since the scheduler last looked.
    violation: Option<Violation>,
}

impl NabuBus {
    #[must_use]
    pub fn new(rom: Rom, psg: SharedPsg, watchdog_scanlines: u32, policy: ViolationPolicy) -> Self {
        let mut bus = Self {
            memory: AddressSpace::new(rom),
            control: ControlRegister::new(),
            parallel: ParallelPort::new(),
            psg,
            vdp: Tms9918::new(),
            interrupts: InterruptController::new(),
            fdc: DiskController::new(),
            keyboard: KeyboardQueue::new(watchdog_scanlines),
            modem: Box::new(NullModem),
            policy,
            violation: None,
        };
        bus.sync_rom_overlay();
        bus.publish_interrupt_status();
        bus
    }

    /// Cold start and reset: the keyboard announces itself and the serial
    /// transmitter is idle (ready).
    pub fn power_up(&mut self) {
        self.keyboard.clear();
        self.keyboard.put(POWER_UP);
        self.interrupts.clear_lines();
        self.set_line(InterruptLine::SerialTransmit, true);
    }

    /// Assert or release an interrupt line and mirror the encoder onto
    /// PSG port B.
    pub fn set_line(&mut self, line: InterruptLine, asserted: bool) {
        self.interrupts.set_line(line, asserted);
        self.publish_interrupt_status();
    }

    /// Take the pending violation, if any.
    pub fn take_violation(&mut self) -> Option<Violation> {
        self.violation.take()
    }

    #[must_use]
    pub fn policy(&self) -> ViolationPolicy {
        self.policy
    }

    /// Pull the interrupt mask back out of PSG port A. Used after the PSG
    /// has been touched behind the bus's back (reset).
    pub fn sync_interrupt_mask(&mut self) {
        let mask = self.psg.lock().port_a();
        self.interrupts.set_mask(mask);
        self.publish_interrupt_status();
    }

    fn publish_interrupt_status(&mut self) {
        let status = self.interrupts.status();
        self.psg.lock().set_port_b(status);
    }

    fn sync_rom_overlay(&mut self) {
        self.memory.set_rom_enabled(self.control.rom_enabled());
    }

    fn write_control(&mut self, value: u8) {
        let strobe = self.control.write(value);
        self.sync_rom_overlay();
        if strobe {
            self.parallel.strobe();
        }
    }

    /// Clear the control latch, as the reset line does. The ROM comes
    /// back into view.
    pub fn clear_control(&mut self) {
        self.control.clear();
        self.sync_rom_overlay();
    }

    fn violate(&mut self, violation: Violation) {
        match self.policy {
            ViolationPolicy::Warn => tracing::warn!("ignored guest access: {violation:?}"),
            ViolationPolicy::Fatal => {
                self.violation.get_or_insert(violation);
            }
        }
    }

    fn read_keyboard(&mut self) -> u8 {
        let byte = self.keyboard.get();
        self.set_line(InterruptLine::Keyboard, false);
        if byte == EMPTY { 0 } else { byte }
    }

    fn read_modem(&mut self) -> u8 {
        let byte = self.modem.read_byte().unwrap_or(0);
        self.set_line(InterruptLine::SerialReceive, false);
        byte
    }

    fn write_psg_data(&mut self, value: u8) {
        let (register, mask) = {
            let mut psg = self.psg.lock();
            psg.write_data(value);
            (psg.selected_register(), psg.port_a())
        };
        match register {
            PORT_A => {
                self.interrupts.set_mask(mask);
                self.publish_interrupt_status();
            }
            // Port B is driven by the encoder, not the guest.
            PORT_B => self.publish_interrupt_status(),
            _ => {}
        }
    }

    fn select_psg_register(&mut self, value: u8) {
        if usize::from(value) >= REGISTER_COUNT {
            self.violate(Violation::PsgRegister(value));
            return;
        }
        self.psg.lock().select_register(value);
    }
}

impl Bus for NabuBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }
}

impl IoBus for NabuBus {
    fn read_io(&mut self, port: u16) -> u8 {
        let port = port as u8;
        match port {
            0x00 | 0x41 => {
                self.violate(Violation::WriteOnlyPort(port));
                0
            }
            0x40 => self.psg.lock().read_data(),
            0x80 => self.read_modem(),
            0x90 => self.read_keyboard(),
            0x91 => {
                if self.keyboard.is_empty() {
                    0x00
                } else {
                    0xFF
                }
            }
            0xA0 => self.vdp.read_data(),
            0xA1 => {
                let status = self.vdp.read_status();
                self.set_line(InterruptLine::Video, false);
                status
            }
            0xC0..=0xCF => self.fdc.read_port(port & 0x0F),
            _ => {
                tracing::debug!("read from unmapped port {port:#04X}");
                0
            }
        }
    }

    fn write_io(&mut self, port: u16, value: u8) {
        let port = port as u8;
        match port {
            0x00 => self.write_control(value),
            0x40 => self.write_psg_data(value),
            0x41 => self.select_psg_register(value),
            0x80 => self.modem.write_byte(value),
            0x90 | 0x91 => tracing::debug!("keyboard port {port:#04X} write {value:#04X} ignored"),
            0xA0 => self.vdp.write_data(value),
            0xA1 => self.vdp.write_control(value),
            0xB0 => self.parallel.latch(value),
            0xC0..=0xCF => self.fdc.write_port(port & 0x0F, value),
            _ => tracing::debug!("write {value:#04X} to unmapped port {port:#04X}"),
        }
    }
}
