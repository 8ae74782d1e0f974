//! Keyboard receive queue (ports $90/$91).
//!
//! The NABU keyboard is a separate microcontroller that sends bytes over
//! a serial line into an 8251. Host key events arrive asynchronously and
//! are parked here until the CPU reads them.
//!
//! The queue is a 256-byte ring with 8-bit read and write cursors that
//! wrap by unsigned overflow. Empty is "cursors equal", which means 256
//! unread bytes are indistinguishable from none: the write cursor laps
//! the read cursor and everything pending is lost. In practice only a
//! handful of bytes are ever queued.
//!
//! Besides key codes the keyboard sends two status bytes:
//! - `0x95` once after power-up.
//! - `0x94` as a keep-alive whenever it has been idle for a while. The
//!   ROM treats a silent keyboard as unplugged.

/// Sent once after power-up.
pub const POWER_UP: u8 = 0x95;

/// Keep-alive sent after a stretch of inactivity.
pub const WATCHDOG: u8 = 0x94;

/// Returned by [`KeyboardQueue::get`] when nothing is pending.
pub const EMPTY: u8 = 0xFF;

/// Ring buffer plus watchdog timer.
pub struct KeyboardQueue {
    buffer: [u8; 256],
    write: u8,
    read: u8,
    /// Consecutive scanlines the queue has been seen empty.
    idle_scanlines: u32,
    watchdog_threshold: u32,
}

impl KeyboardQueue {
    #[must_use]
    pub fn new(watchdog_threshold: u32) -> Self {
        Self {
            buffer: [0; 256],
            write: 0,
            read: 0,
            idle_scanlines: 0,
            watchdog_threshold,
        }
    }

    /// Append a byte. The caller must not queue 256 unread bytes.
    pub fn put(&mut self, byte: u8) {
        self.buffer[usize::from(self.write)] = byte;
        self.write = self.write.wrapping_add(1);
        if self.write == self.read {
            tracing::warn!("keyboard queue wrapped; pending bytes lost");
        }
    }

    /// Pop the oldest byte, or [`EMPTY`] if there is none.
    pub fn get(&mut self) -> u8 {
        if self.is_empty() {
            return EMPTY;
        }
        let byte = self.buffer[usize::from(self.read)];
        self.read = self.read.wrapping_add(1);
        byte
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.write == self.read
    }

    /// Number of unread bytes, modulo 256.
    #[must_use]
    pub fn len(&self) -> u8 {
        self.write.wrapping_sub(self.read)
    }

    /// Drop everything pending and restart the watchdog.
    pub fn clear(&mut self) {
        self.read = self.write;
        self.idle_scanlines = 0;
    }

    /// Once-per-scanline keep-alive check. Returns true if the watchdog
    /// byte was queued.
    pub fn tick_watchdog(&mut self) -> bool {
        if !self.is_empty() {
            self.idle_scanlines = 0;
            return false;
        }
        self.idle_scanlines += 1;
        if self.idle_scanlines >= self.watchdog_threshold {
            self.idle_scanlines = 0;
            self.put(WATCHDOG);
            return true;
        }
        false
    }

    #[must_use]
    pub fn idle_scanlines(&self) -> u32 {
        self.idle_scanlines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_queue() -> KeyboardQueue {
        KeyboardQueue::new(58_000)
    }

    #[test]
    fn fifo_order() {
        let mut q = make_queue();
        for b in [1u8, 2, 3, 0xE0] {
            q.put(b);
        }
        assert_eq!(q.len(), 4);
        assert_eq!(q.get(), 1);
        assert_eq!(q.get(), 2);
        assert_eq!(q.get(), 3);
        assert_eq!(q.get(), 0xE0);
        assert!(q.is_empty());
    }

    #[test]
    fn empty_returns_sentinel() {
        let mut q = make_queue();
        assert_eq!(q.get(), EMPTY);
        q.put(7);
        assert_eq!(q.get(), 7);
        assert_eq!(q.get(), EMPTY);
    }

    #[test]
    fn cursors_wrap_around_the_ring() {
        let mut q = make_queue();
        for round in 0..600u32 {
            q.put(round as u8);
            assert_eq!(q.get(), round as u8);
        }
        assert!(q.is_empty());
    }

    #[test]
    fn full_ring_aliases_to_empty() {
        // 256 unread bytes put the write cursor back on the read cursor.
        // The queue then reports empty and the bytes are unreachable. This
        // is how the hardware-facing ring has always behaved.
        let mut q = make_queue();
        for b in 0..=255u8 {
            q.put(b);
        }
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        assert_eq!(q.get(), EMPTY);

        // One more byte makes exactly that byte visible.
        q.put(0xAA);
        assert_eq!(q.get(), 0xAA);
    }

    #[test]
    fn watchdog_fires_after_threshold() {
        let mut q = KeyboardQueue::new(5);
        for _ in 0..4 {
            assert!(!q.tick_watchdog());
        }
        assert!(q.tick_watchdog(), "fifth idle scanline queues the keep-alive");
        assert_eq!(q.get(), WATCHDOG);
        assert_eq!(q.idle_scanlines(), 0);
    }

    #[test]
    fn pending_bytes_reset_the_watchdog() {
        let mut q = KeyboardQueue::new(5);
        for _ in 0..3 {
            q.tick_watchdog();
        }
        q.put(b'a');
        assert!(!q.tick_watchdog());
        assert_eq!(q.idle_scanlines(), 0);
        let _ = q.get();
        for _ in 0..4 {
            assert!(!q.tick_watchdog(), "count restarted from zero");
        }
        assert!(q.tick_watchdog());
    }

    #[test]
    fn clear_discards_pending() {
        let mut q = make_queue();
        q.put(POWER_UP);
        q.put(b'x');
        q.clear();
        assert!(q.is_empty());
    }
}
