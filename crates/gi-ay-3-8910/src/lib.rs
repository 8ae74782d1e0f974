//! General Instrument AY-3-8910 Programmable Sound Generator.
//!
//! Three square-wave tone generators, a shared noise generator, a shared
//! envelope generator, and two 8-bit I/O ports. On the NABU the ports are
//! not used for sound at all: port A is the interrupt enable mask and
//! port B carries the interrupt priority encoder's output back to the CPU.
//!
//! Output is a single mono channel of signed 16-bit samples, produced on
//! demand by [`Ay3_8910::sample`] at the configured sample rate.
//!
//! # Register map (addresses 0x00–0x1F)
//!
//! | Reg   | Name       | Bits |
//! |-------|------------|------|
//! | R0    | A fine     | 7-0  |
//! | R1    | A coarse   | 3-0  |
//! | R2    | B fine     | 7-0  |
//! | R3    | B coarse   | 3-0  |
//! | R4    | C fine     | 7-0  |
//! | R5    | C coarse   | 3-0  |
//! | R6    | Noise      | 4-0  |
//! | R7    | Mixer/IO   | 7-0  |
//! | R8    | A volume   | 4-0  |
//! | R9    | B volume   | 4-0  |
//! | R10   | C volume   | 4-0  |
//! | R11   | Env fine   | 7-0  |
//! | R12   | Env coarse | 7-0  |
//! | R13   | Env shape  | 3-0  |
//! | R14   | Port A     | 7-0  |
//! | R15   | Port B     | 7-0  |
//! | R16+  | (latched, no effect) |  |

/// Number of addressable register slots.
pub const REGISTER_COUNT: usize = 0x20;

/// Register index of I/O port A.
pub const PORT_A: u8 = 14;

/// Register index of I/O port B.
pub const PORT_B: u8 = 15;

/// Logarithmic DAC levels, scaled so three channels at full volume fit
/// comfortably in an `i16`.
const VOLUME_TABLE: [i32; 16] = [
    0, 137, 205, 291, 423, 618, 847, 1369, 1691, 2647, 3527, 4499, 5765, 7258, 8819, 10000,
];

/// Square wave with a 12-bit period.
#[derive(Clone, Copy)]
struct Tone {
    period: u16,
    counter: u16,
    high: bool,
}

impl Tone {
    const fn new() -> Self {
        Self {
            period: 0,
            counter: 0,
            high: false,
        }
    }

    /// One tick of the clock / 8 prescaler.
    fn clock(&mut self) {
        self.counter = self.counter.saturating_sub(1);
        if self.counter == 0 {
            self.counter = self.period.max(1);
            self.high = !self.high;
        }
    }
}

/// 17-bit LFSR with a 5-bit period.
struct Noise {
    period: u8,
    counter: u8,
    lfsr: u32,
}

impl Noise {
    const fn new() -> Self {
        Self {
            period: 0,
            counter: 0,
            lfsr: 1,
        }
    }

    fn clock(&mut self) {
        self.counter = self.counter.saturating_sub(1);
        if self.counter == 0 {
            self.counter = self.period.max(1);
            let feedback = (self.lfsr ^ (self.lfsr >> 3)) & 1;
            self.lfsr = (self.lfsr >> 1) | (feedback << 16);
        }
    }

    fn high(&self) -> bool {
        self.lfsr & 1 != 0
    }
}

/// Envelope generator: 16-bit period, 32 steps per ramp, 16 shapes.
struct Envelope {
    period: u16,
    counter: u16,
    step: u8,
    attack: bool,
    holding: bool,
    shape: u8,
}

impl Envelope {
    const fn new() -> Self {
        Self {
            period: 0,
            counter: 0,
            step: 0,
            attack: false,
            holding: true,
            shape: 0,
        }
    }

    /// Restart the envelope. Triggered by any write to R13.
    fn restart(&mut self, shape: u8) {
        self.shape = shape & 0x0F;
        self.step = 0;
        self.counter = self.period.max(1);
        self.holding = false;
        self.attack = self.shape & 0x04 != 0;
    }

    /// One tick of the clock / 16 prescaler.
    fn clock(&mut self) {
        if self.holding {
            return;
        }
        self.counter = self.counter.saturating_sub(1);
        if self.counter != 0 {
            return;
        }
        self.counter = self.period.max(1);

        self.step += 1;
        if self.step < 16 {
            return;
        }

        let cont = self.shape & 0x08 != 0;
        let alternate = self.shape & 0x02 != 0;
        let hold = self.shape & 0x01 != 0;

        if !cont {
            // Shapes 0-7 drop to zero and stay there.
            self.holding = true;
            self.attack = false;
            self.step = 15;
        } else if hold {
            self.holding = true;
            self.step = 15;
            if alternate {
                self.attack = !self.attack;
            }
        } else {
            self.step = 0;
            if alternate {
                self.attack = !self.attack;
            }
        }
    }

    /// Current 4-bit level.
    fn level(&self) -> u8 {
        let ramp = self.step.min(15);
        if self.holding {
            // A held envelope sits at the end of its last ramp.
            return if self.attack { 15 } else { 0 };
        }
        if self.attack { ramp } else { 15 - ramp }
    }
}

/// AY-3-8910 Programmable Sound Generator.
pub struct Ay3_8910 {
    regs: [u8; REGISTER_COUNT],
    selected: u8,

    tone: [Tone; 3],
    noise: Noise,
    envelope: Envelope,

    /// Input clock in Hz.
    clock_hz: u64,
    /// Output rate in Hz.
    sample_rate: u64,
    /// Fractional prescaler position, in units of `clock_hz`.
    phase: u64,
    /// Alternates the envelope's clock / 16 against the tone clock / 8.
    envelope_divider: bool,
}

impl Ay3_8910 {
    /// Create a PSG.
    ///
    /// `clock_hz` is the chip input clock (1,789,772 on the NABU).
    /// `sample_rate` is the rate at which [`sample`](Self::sample) will be
    /// called.
    #[must_use]
    pub fn new(clock_hz: u32, sample_rate: u32) -> Self {
        Self {
            regs: [0; REGISTER_COUNT],
            selected: 0,
            tone: [Tone::new(); 3],
            noise: Noise::new(),
            envelope: Envelope::new(),
            clock_hz: u64::from(clock_hz),
            sample_rate: u64::from(sample_rate.max(1)),
            phase: 0,
            envelope_divider: false,
        }
    }

    /// Pulse /RESET: clear every register and restart the generators.
    pub fn reset(&mut self) {
        self.regs = [0; REGISTER_COUNT];
        self.selected = 0;
        self.tone = [Tone::new(); 3];
        self.noise = Noise::new();
        self.envelope = Envelope::new();
        self.phase = 0;
        self.envelope_divider = false;
    }

    /// Latch a register address. Only A0–A4 are decoded.
    pub fn select_register(&mut self, reg: u8) {
        self.selected = reg & 0x1F;
    }

    /// Currently latched register address.
    #[must_use]
    pub fn selected_register(&self) -> u8 {
        self.selected
    }

    /// Write a value to the currently selected register.
    pub fn write_data(&mut self, value: u8) {
        self.write_register(self.selected, value);
    }

    /// Read the currently selected register.
    #[must_use]
    pub fn read_data(&self) -> u8 {
        self.read_register(self.selected)
    }

    /// Read a register directly, bypassing the address latch.
    #[must_use]
    pub fn read_register(&self, reg: u8) -> u8 {
        self.regs[usize::from(reg & 0x1F)]
    }

    /// Write a register directly, bypassing the address latch.
    pub fn write_register(&mut self, reg: u8, value: u8) {
        let reg = reg & 0x1F;
        self.regs[usize::from(reg)] = value;

        match reg {
            0..=5 => {
                let ch = usize::from(reg / 2);
                let fine = self.regs[ch * 2];
                let coarse = self.regs[ch * 2 + 1];
                self.tone[ch].period = u16::from(fine) | (u16::from(coarse & 0x0F) << 8);
            }
            6 => self.noise.period = value & 0x1F,
            11 | 12 => {
                self.envelope.period = u16::from_le_bytes([self.regs[11], self.regs[12]]);
            }
            13 => {
                self.envelope.period = u16::from_le_bytes([self.regs[11], self.regs[12]]);
                self.envelope.restart(value);
            }
            _ => {}
        }
    }

    /// Value driven onto I/O port A (register 14).
    #[must_use]
    pub fn port_a(&self) -> u8 {
        self.regs[usize::from(PORT_A)]
    }

    /// Drive I/O port B from outside the chip (register 15).
    pub fn set_port_b(&mut self, value: u8) {
        self.regs[usize::from(PORT_B)] = value;
    }

    /// Value latched on I/O port B.
    #[must_use]
    pub fn port_b(&self) -> u8 {
        self.regs[usize::from(PORT_B)]
    }

    /// Advance the chip by one output sample period and return the mixed
    /// mono sample.
    ///
    /// The generators run at `clock / 8`; every internal step inside the
    /// sample period is averaged, which is enough low-pass filtering to
    /// keep high tone periods from aliasing badly.
    pub fn sample(&mut self) -> i16 {
        let step = self.sample_rate * 8;
        self.phase += self.clock_hz;

        let mut sum = 0i32;
        let mut count = 0i32;
        while self.phase >= step {
            self.phase -= step;
            for tone in &mut self.tone {
                tone.clock();
            }
            self.noise.clock();
            self.envelope_divider = !self.envelope_divider;
            if self.envelope_divider {
                self.envelope.clock();
            }
            sum += self.mix();
            count += 1;
        }

        if count == 0 {
            return self.mix() as i16;
        }
        (sum / count) as i16
    }

    /// Fill `out` with consecutive samples.
    pub fn fill(&mut self, out: &mut [i16]) {
        for slot in out {
            *slot = self.sample();
        }
    }

    /// Mixer stage: tone AND noise gate per channel, scaled by the
    /// channel's fixed or envelope volume, centred around zero.
    fn mix(&self) -> i32 {
        let mixer = self.regs[7];
        let mut out = 0i32;

        for (ch, tone) in self.tone.iter().enumerate() {
            let tone_off = mixer & (1 << ch) != 0;
            let noise_off = mixer & (1 << (ch + 3)) != 0;
            let gate = (tone.high || tone_off) && (self.noise.high() || noise_off);

            let vol = self.regs[8 + ch];
            let level = if vol & 0x10 != 0 {
                self.envelope.level()
            } else {
                vol & 0x0F
            };
            let amplitude = VOLUME_TABLE[usize::from(level)];

            out += if gate { amplitude / 2 } else { -amplitude / 2 };
        }

        out
    }
}
