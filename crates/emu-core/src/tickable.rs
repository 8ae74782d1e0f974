//! Trait for components advanced by the machine's timing quantum.

/// A component that is advanced once per timing quantum.
///
/// On the NABU the quantum is one scanline (228 T-states); peripherals
/// that need a sense of elapsed time (the floppy's rotating index hole)
/// count these.
pub trait Tickable {
    /// Advance the component by one quantum.
    fn tick(&mut self);

    /// Advance by `count` quanta. Overrides must match `count` calls to
    /// `tick()` exactly.
    fn tick_n(&mut self, count: u32) {
        for _ in 0..count {
            self.tick();
        }
    }
}
