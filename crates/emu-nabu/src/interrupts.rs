//! Interrupt priority network.
//!
//! Four level-triggered request lines are gated by the PSG's port A (the
//! enable mask), inverted, and fed into a 74LS148 8-to-3 priority
//! encoder. The encoder's outputs are wired back into the PSG's port B so
//! the interrupt service routine can read the cause, and its /GS output
//! drives the Z80's /INT. The low nibble of the port B value is what the
//! CPU sees on the data bus during the IM 2 acknowledge.
//!
//! # Wiring
//!
//! | Input | Mask bit | Source                        | Code |
//! |-------|----------|-------------------------------|------|
//! | I7    | 7        | serial (HCCA) receive ready   | 0    |
//! | I6    | 6        | serial (HCCA) transmit ready  | 1    |
//! | I5    | 5        | keyboard data ready           | 2    |
//! | I4    | 4        | video frame (VDP /INT)        | 3    |
//! | I3–I0 | 3–0      | expansion slots, never driven | 4–7  |
//!
//! Port B: bit 0 = EO, bits 1–3 = A0–A2.

/// A request line into the priority encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptLine {
    SerialReceive,
    SerialTransmit,
    Keyboard,
    Video,
}

impl InterruptLine {
    pub const ALL: [Self; 4] = [
        Self::SerialReceive,
        Self::SerialTransmit,
        Self::Keyboard,
        Self::Video,
    ];

    /// Bit position in the composite request word and the enable mask.
    #[must_use]
    pub const fn bit(self) -> u8 {
        match self {
            Self::SerialReceive => 0x80,
            Self::SerialTransmit => 0x40,
            Self::Keyboard => 0x20,
            Self::Video => 0x10,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SerialReceive => "serial_receive",
            Self::SerialTransmit => "serial_transmit",
            Self::Keyboard => "keyboard",
            Self::Video => "video",
        }
    }
}

/// Pin levels on the 74LS148 outputs (true = high).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderOutput {
    /// /GS: low when any input is active.
    pub gs: bool,
    /// A2..A0 as a 3-bit number.
    pub code: u8,
    /// EO: low only when enabled and no input is active.
    pub eo: bool,
}

impl EncoderOutput {
    /// Every output high: the chip's state with /EI high.
    pub const SATURATED: Self = Self {
        gs: true,
        code: 0b111,
        eo: true,
    };

    /// Enabled, nothing requesting.
    pub const QUIET: Self = Self {
        gs: true,
        code: 0b111,
        eo: false,
    };

    /// Port B value: EO in bit 0, A0–A2 in bits 1–3.
    #[must_use]
    pub const fn status(self) -> u8 {
        (self.eo as u8) | (self.code << 1)
    }

    /// True when /GS is low, i.e. some input is active.
    #[must_use]
    pub const fn requesting(self) -> bool {
        !self.gs
    }
}

/// 74LS148 priority encoder.
///
/// `inputs` carries pin levels /I0–/I7 (bit n = /In, low = active).
/// `ei_high` models the /EI pin held high, which disables the chip.
#[must_use]
pub fn encode(inputs: u8, ei_high: bool) -> EncoderOutput {
    if ei_high {
        return EncoderOutput::SATURATED;
    }
    if inputs == 0xFF {
        return EncoderOutput::QUIET;
    }
    for n in (0..8u8).rev() {
        if inputs & (1 << n) == 0 {
            return EncoderOutput {
                gs: false,
                code: 7 - n,
                eo: true,
            };
        }
    }
    // Unreachable for a consistent input word; settle to all-high rather
    // than leave the outputs undefined.
    EncoderOutput::SATURATED
}

/// The request lines, the PSG-supplied mask, and the encoder between them.
#[derive(Debug, Clone)]
pub struct InterruptController {
    lines: u8,
    mask: u8,
    output: EncoderOutput,
    request: Option<u8>,
    /// Number of times a new request was presented to the CPU.
    raised: u64,
}

impl InterruptController {
    /// Power-on state: nothing requesting, every source masked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: 0,
            mask: 0,
            output: EncoderOutput::QUIET,
            request: None,
            raised: 0,
        }
    }

    /// Drop every request line. The mask is left alone: it lives in the
    /// PSG, not here.
    pub fn clear_lines(&mut self) {
        self.lines = 0;
        self.recompute();
    }

    /// Assert or release one request line, then re-evaluate the encoder.
    pub fn set_line(&mut self, line: InterruptLine, asserted: bool) {
        if asserted {
            self.lines |= line.bit();
        } else {
            self.lines &= !line.bit();
        }
        self.recompute();
    }

    /// Load a new enable mask (PSG port A), then re-evaluate the encoder.
    pub fn set_mask(&mut self, mask: u8) {
        self.mask = mask;
        self.recompute();
    }

    /// Run the gated request word through the encoder and update the
    /// request presented to the CPU.
    pub fn recompute(&mut self) -> EncoderOutput {
        let inputs = !(self.lines & self.mask);
        self.output = encode(inputs, false);

        let request = self
            .output
            .requesting()
            .then_some(self.output.status() & 0x0F);
        if request.is_some() && request != self.request {
            self.raised += 1;
        }
        self.request = request;
        self.output
    }

    #[must_use]
    pub fn line(&self, line: InterruptLine) -> bool {
        self.lines & line.bit() != 0
    }

    /// Raw request word (asserted lines as set bits).
    #[must_use]
    pub fn lines(&self) -> u8 {
        self.lines
    }

    #[must_use]
    pub fn mask(&self) -> u8 {
        self.mask
    }

    #[must_use]
    pub fn output(&self) -> EncoderOutput {
        self.output
    }

    /// Value the encoder drives onto PSG port B.
    #[must_use]
    pub fn status(&self) -> u8 {
        self.output.status()
    }

    /// The /INT request for the CPU: acknowledge data byte, if any.
    #[must_use]
    pub fn request(&self) -> Option<u8> {
        self.request
    }

    #[must_use]
    pub fn raised_count(&self) -> u64 {
        self.raised
    }
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}
