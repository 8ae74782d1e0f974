//! PSG ownership across the audio boundary.
//!
//! The emulation thread only pokes registers; the host audio callback is
//! the one place the PSG is stepped. Both sides go through a
//! `parking_lot::Mutex`, held just long to do one register access or to
//! render one buffer.

use std::sync::Arc;

use gi_ay_3_8910::Ay3_8910;
use parking_lot::{Mutex, MutexGuard};

/// PSG input clock: the 3.58 MHz colourburst crystal divided by two.
pub const PSG_CLOCK_HZ: u32 = 1_789_772;

/// Handle to the PSG shared between the emulation and audio threads.
#[derive(Clone)]
pub struct SharedPsg {
    inner: Arc<Mutex<Ay3_8910>>,
}

impl SharedPsg {
    #[must_use]
    pub fn new(sample_rate: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Ay3_8910::new(PSG_CLOCK_HZ, sample_rate))),
        }
    }

    /// Lock the chip for register access.
    pub fn lock(&self) -> MutexGuard<'_, Ay3_8910> {
        self.inner.lock()
    }

    /// Render `out.len()` mono samples. Call from the audio callback.
    pub fn fill(&self, out: &mut [i16]) {
        self.inner.lock().fill(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_thread_renders_what_emulation_programs() {
        let psg = SharedPsg::new(44_100);
        {
            let mut chip = psg.lock();
            chip.write_register(0, 0x80);
            chip.write_register(7, 0b0011_1110);
            chip.write_register(8, 0x0F);
        }

        let audio = psg.clone();
        let handle = std::thread::spawn(move || {
            let mut buf = vec![0i16; 1024];
            audio.fill(&mut buf);
            buf
        });
        let buf = handle.join().expect("audio thread");
        assert!(buf.iter().any(|&s| s > 0) && buf.iter().any(|&s| s < 0));
    }
}
