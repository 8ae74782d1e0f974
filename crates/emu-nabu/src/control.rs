//! Control register (port $00) and the parallel printer port ($B0).
//!
//! The control register is a write-only latch:
//!
//! | Bit | Function                                   |
//! |-----|--------------------------------------------|
//! | 0   | ROM disable                                |
//! | 1   | Video enable (clear = RF noise)            |
//! | 2   | Parallel strobe, rising edge prints a byte |
//! | 3   | Green LED (CHECK)                          |
//! | 4   | Red LED (ALERT)                            |
//! | 5   | Yellow LED (PAUSE)                         |

use std::io::Write;

use bitflags::bitflags;

bitflags! {
    /// Control register bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Control: u8 {
        const ROM_DISABLE = 0x01;
        const VIDEO_ENABLE = 0x02;
        const STROBE = 0x04;
        const LED_GREEN = 0x08;
        const LED_RED = 0x10;
        const LED_YELLOW = 0x20;
    }
}

/// Latch contents at power-on: video on, all three LEDs lit, ROM mapped.
pub const POWER_ON_CONTROL: u8 = 0x3A;

/// The latched control register.
#[derive(Debug, Clone, Copy)]
pub struct ControlRegister {
    bits: Control,
}

impl ControlRegister {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: Control::from_bits_retain(POWER_ON_CONTROL),
        }
    }

    /// Latch a new value. Returns true on a 0→1 edge of the strobe bit.
    pub fn write(&mut self, value: u8) -> bool {
        let next = Control::from_bits_retain(value);
        let rising = next.contains(Control::STROBE) && !self.bits.contains(Control::STROBE);
        self.bits = next;
        rising
    }

    /// Clear the latch, as the reset line does.
    pub fn clear(&mut self) {
        self.bits = Control::empty();
    }

    #[must_use]
    pub fn bits(&self) -> u8 {
        self.bits.bits()
    }

    #[must_use]
    pub fn rom_enabled(&self) -> bool {
        !self.bits.contains(Control::ROM_DISABLE)
    }

    #[must_use]
    pub fn video_enabled(&self) -> bool {
        self.bits.contains(Control::VIDEO_ENABLE)
    }

    /// LED states as (green, red, yellow).
    #[must_use]
    pub fn leds(&self) -> (bool, bool, bool) {
        (
            self.bits.contains(Control::LED_GREEN),
            self.bits.contains(Control::LED_RED),
            self.bits.contains(Control::LED_YELLOW),
        )
    }
}

impl Default for ControlRegister {
    fn default() -> Self {
        Self::new()
    }
}

/// Parallel port: an output latch plus an optional byte sink.
#[derive(Default)]
pub struct ParallelPort {
    data: u8,
    sink: Option<Box<dyn Write + Send>>,
}

impl ParallelPort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or detach) the stream that strobed bytes go to.
    pub fn set_sink(&mut self, sink: Option<Box<dyn Write + Send>>) {
        self.sink = sink;
    }

    #[must_use]
    pub fn has_sink(&self) -> bool {
        self.sink.is_some()
    }

    pub fn latch(&mut self, value: u8) {
        self.data = value;
    }

    #[must_use]
    pub fn data(&self) -> u8 {
        self.data
    }

    /// Emit the latched byte. A failing sink is dropped so the printer
    /// simply goes offline.
    pub fn strobe(&mut self) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        if let Err(e) = sink.write_all(&[self.data]).and_then(|()| sink.flush()) {
            tracing::warn!("parallel port output failed, detaching printer: {e}");
            self.sink = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Sink that records into a shared buffer.
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("capture lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn power_on_value() {
        let ctrl = ControlRegister::new();
        assert_eq!(ctrl.bits(), 0x3A);
        assert!(ctrl.rom_enabled());
        assert!(ctrl.video_enabled());
        assert_eq!(ctrl.leds(), (true, true, true));
    }

    #[test]
    fn rom_disable_bit_is_inverted() {
        let mut ctrl = ControlRegister::new();
        ctrl.write(0x01);
        assert!(!ctrl.rom_enabled());
        ctrl.write(0x00);
        assert!(ctrl.rom_enabled());
    }

    #[test]
    fn strobe_edge_detection() {
        let mut ctrl = ControlRegister::new();
        assert!(ctrl.write(0x04), "0→1 is an edge");
        assert!(!ctrl.write(0x04), "held high is not");
        assert!(!ctrl.write(0x00), "1→0 is not");
        assert!(ctrl.write(0x06));
    }

    #[test]
    fn unused_bits_are_retained() {
        let mut ctrl = ControlRegister::new();
        ctrl.write(0xC0);
        assert_eq!(ctrl.bits(), 0xC0);
    }

    #[test]
    fn strobe_writes_latched_byte() {
        let capture = Capture::default();
        let mut port = ParallelPort::new();
        port.set_sink(Some(Box::new(capture.clone())));
        port.latch(b'A');
        port.strobe();
        port.latch(b'B');
        port.strobe();
        assert_eq!(*capture.0.lock().expect("capture lock"), b"AB");
    }

    #[test]
    fn strobe_without_sink_is_ignored() {
        let mut port = ParallelPort::new();
        port.latch(0x42);
        port.strobe();
        assert_eq!(port.data(), 0x42);
        assert!(!port.has_sink());
    }
}
