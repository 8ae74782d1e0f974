//! Texas Instruments TMS9918A Video Display Processor.
//!
//! 16 KiB of private VRAM, eight write-only registers, and one status
//! register, reached through two ports: data (mode 0) and control
//! (mode 1). The chip generates 192 active lines of 256 pixels; this
//! model produces them one line at a time on request from the machine's
//! scheduler, so there is no internal dot clock.
//!
//! # Registers
//!
//! | Reg | Contents                                              |
//! |-----|-------------------------------------------------------|
//! | R0  | bit 1 M3 (Graphics II), bit 0 external video          |
//! | R1  | bit 7 4/16K, 6 BLANK, 5 IE, 4 M1, 3 M2, 1 SIZE, 0 MAG  |
//! | R2  | name table base / 0x400                               |
//! | R3  | colour table base / 0x40                              |
//! | R4  | pattern generator base / 0x800                        |
//! | R5  | sprite attribute table base / 0x80                    |
//! | R6  | sprite pattern generator base / 0x800                 |
//! | R7  | text colour (7-4), backdrop colour (3-0)              |
//!
//! # Status
//!
//! Bit 7 F (frame), bit 6 5S (fifth sprite), bit 5 C (coincidence),
//! bits 4-0 fifth sprite number. Reading status clears F, 5S and C.

mod render;

pub use render::{ACTIVE_LINES, SCREEN_WIDTH};

/// ARGB colours for the 16 palette entries. Entry 0 is transparent and
/// renders as black when nothing shows through.
pub const PALETTE: [u32; 16] = [
    0xFF00_0000, // transparent
    0xFF00_0000, // black
    0xFF21_C842, // medium green
    0xFF5E_DC78, // light green
    0xFF54_55ED, // dark blue
    0xFF7D_76FC, // light blue
    0xFFD4_524D, // dark red
    0xFF42_EBF5, // cyan
    0xFFFC_5554, // medium red
    0xFFFF_7978, // light red
    0xFFD4_C154, // dark yellow
    0xFFE6_CE80, // light yellow
    0xFF21_B03B, // dark green
    0xFFC9_5BBA, // magenta
    0xFFCC_CCCC, // grey
    0xFFFF_FFFF, // white
];

const VRAM_SIZE: usize = 0x4000;
const ADDRESS_MASK: u16 = 0x3FFF;

/// Status register: frame flag.
pub const STATUS_F: u8 = 0x80;
/// Status register: fifth sprite on a line.
pub const STATUS_5S: u8 = 0x40;
/// Status register: sprite coincidence.
pub const STATUS_C: u8 = 0x20;

/// Display mode selected by M1/M2/M3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Graphics1,
    Graphics2,
    Multicolor,
    Text,
}

/// TMS9918A VDP.
pub struct Tms9918 {
    vram: Vec<u8>,
    regs: [u8; 8],
    status: u8,
    /// 14-bit VRAM address counter.
    address: u16,
    /// First byte of a two-byte control write.
    latch: Option<u8>,
    /// Read-ahead buffer for the data port.
    read_ahead: u8,
}

impl Tms9918 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            vram: vec![0; VRAM_SIZE],
            regs: [0; 8],
            status: 0,
            address: 0,
            latch: None,
            read_ahead: 0,
        }
    }

    /// Write to the control port (mode 1).
    ///
    /// The first write latches a byte. The second either sets the VRAM
    /// address (bit 7 clear; bit 6 set means write setup, clear means read
    /// setup with prefetch) or writes the latched byte into register
    /// `value & 7` (bit 7 set).
    pub fn write_control(&mut self, value: u8) {
        let Some(low) = self.latch.take() else {
            self.latch = Some(value);
            return;
        };

        if value & 0x80 != 0 {
            self.regs[usize::from(value & 0x07)] = low;
            return;
        }

        self.address = (u16::from(value & 0x3F) << 8) | u16::from(low);
        if value & 0x40 == 0 {
            self.prefetch();
        }
    }

    /// Read the status register (mode 1). Clears F, 5S, C and the control
    /// latch.
    pub fn read_status(&mut self) -> u8 {
        let value = self.status;
        self.status &= !(STATUS_F | STATUS_5S | STATUS_C);
        self.latch = None;
        value
    }

    /// Status register without the read side effects.
    #[must_use]
    pub fn peek_status(&self) -> u8 {
        self.status
    }

    /// Write to the data port (mode 0).
    pub fn write_data(&mut self, value: u8) {
        self.latch = None;
        self.vram[usize::from(self.address)] = value;
        self.read_ahead = value;
        self.address = (self.address + 1) & ADDRESS_MASK;
    }

    /// Read from the data port (mode 0). Returns the read-ahead byte and
    /// fetches the next one.
    pub fn read_data(&mut self) -> u8 {
        self.latch = None;
        let value = self.read_ahead;
        self.prefetch();
        value
    }

    fn prefetch(&mut self) {
        self.read_ahead = self.vram[usize::from(self.address)];
        self.address = (self.address + 1) & ADDRESS_MASK;
    }

    /// Register contents.
    #[must_use]
    pub fn register(&self, reg: usize) -> u8 {
        self.regs[reg & 7]
    }

    /// Current VRAM address counter.
    #[must_use]
    pub fn address(&self) -> u16 {
        self.address
    }

    /// Direct VRAM view (for debuggers and tests).
    #[must_use]
    pub fn vram(&self) -> &[u8] {
        &self.vram
    }

    /// R1 bit 5: raise /INT when F is set.
    #[must_use]
    pub fn frame_interrupt_enabled(&self) -> bool {
        self.regs[1] & 0x20 != 0
    }

    /// R1 bit 6: display active (clear = blank to backdrop).
    #[must_use]
    pub fn display_enabled(&self) -> bool {
        self.regs[1] & 0x40 != 0
    }

    /// The chip's /INT output.
    #[must_use]
    pub fn interrupt_pending(&self) -> bool {
        self.frame_interrupt_enabled() && self.status & STATUS_F != 0
    }

    /// Mark the end of the active display. Sets F.
    pub fn vblank(&mut self) {
        self.status |= STATUS_F;
    }

    /// Backdrop colour index (R7 low nibble).
    #[must_use]
    pub fn backdrop(&self) -> u8 {
        self.regs[7] & 0x0F
    }

    /// Display mode from M1 (R1.4), M2 (R1.3), M3 (R0.1).
    #[must_use]
    pub fn mode(&self) -> Mode {
        if self.regs[1] & 0x10 != 0 {
            Mode::Text
        } else if self.regs[1] & 0x08 != 0 {
            Mode::Multicolor
        } else if self.regs[0] & 0x02 != 0 {
            Mode::Graphics2
        } else {
            Mode::Graphics1
        }
    }

    /// Reset registers, status and the port state. VRAM is left alone.
    pub fn reset(&mut self) {
        self.regs = [0; 8];
        self.status = 0;
        self.address = 0;
        self.latch = None;
        self.read_ahead = 0;
    }
}

impl Default for Tms9918 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_reg(vdp: &mut Tms9918, reg: u8, value: u8) {
        vdp.write_control(value);
        vdp.write_control(0x80 | reg);
    }

    fn set_write_address(vdp: &mut Tms9918, address: u16) {
        vdp.write_control(address as u8);
        vdp.write_control(0x40 | ((address >> 8) as u8 & 0x3F));
    }

    fn set_read_address(vdp: &mut Tms9918, address: u16) {
        vdp.write_control(address as u8);
        vdp.write_control((address >> 8) as u8 & 0x3F);
    }

    #[test]
    fn register_write_through_control_port() {
        let mut vdp = Tms9918::new();
        set_reg(&mut vdp, 7, 0xF4);
        assert_eq!(vdp.register(7), 0xF4);
        assert_eq!(vdp.backdrop(), 4);
    }

    #[test]
    fn data_port_auto_increments() {
        let mut vdp = Tms9918::new();
        set_write_address(&mut vdp, 0x1000);
        vdp.write_data(0x11);
        vdp.write_data(0x22);
        assert_eq!(vdp.vram()[0x1000], 0x11);
        assert_eq!(vdp.vram()[0x1001], 0x22);
        assert_eq!(vdp.address(), 0x1002);
    }

    #[test]
    fn read_setup_prefetches() {
        let mut vdp = Tms9918::new();
        set_write_address(&mut vdp, 0x0200);
        vdp.write_data(0xAA);
        vdp.write_data(0xBB);

        set_read_address(&mut vdp, 0x0200);
        assert_eq!(vdp.read_data(), 0xAA);
        assert_eq!(vdp.read_data(), 0xBB);
    }

    #[test]
    fn address_wraps_at_16k() {
        let mut vdp = Tms9918::new();
        set_write_address(&mut vdp, 0x3FFF);
        vdp.write_data(1);
        vdp.write_data(2);
        assert_eq!(vdp.vram()[0x3FFF], 1);
        assert_eq!(vdp.vram()[0], 2);
    }

    #[test]
    fn status_read_clears_frame_flag_and_latch() {
        let mut vdp = Tms9918::new();
        vdp.vblank();
        vdp.write_control(0x12); // half a command
        assert_eq!(vdp.read_status() & STATUS_F, STATUS_F);
        assert_eq!(vdp.peek_status() & STATUS_F, 0, "F cleared by the read");

        // The latch was reset, so this pair is a fresh register write.
        set_reg(&mut vdp, 1, 0x60);
        assert_eq!(vdp.register(1), 0x60);
    }

    #[test]
    fn frame_interrupt_needs_enable_bit() {
        let mut vdp = Tms9918::new();
        vdp.vblank();
        assert!(!vdp.interrupt_pending(), "IE clear");
        set_reg(&mut vdp, 1, 0x20);
        assert!(vdp.frame_interrupt_enabled());
        assert!(vdp.interrupt_pending());
        let _ = vdp.read_status();
        assert!(!vdp.interrupt_pending());
    }

    #[test]
    fn mode_decode() {
        let mut vdp = Tms9918::new();
        assert_eq!(vdp.mode(), Mode::Graphics1);
        set_reg(&mut vdp, 0, 0x02);
        assert_eq!(vdp.mode(), Mode::Graphics2);
        set_reg(&mut vdp, 1, 0x08);
        assert_eq!(vdp.mode(), Mode::Multicolor);
        set_reg(&mut vdp, 1, 0x10);
        assert_eq!(vdp.mode(), Mode::Text);
    }
}
