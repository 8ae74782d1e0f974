//! CPU core trait.

use crate::IoBus;

/// A CPU core driven one instruction at a time.
///
/// The bus is passed in, not owned, so the platform keeps ownership of
/// every device and can inspect them between steps.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Execute one instruction (or one interrupt acknowledge) and return
    /// the number of T-states it took.
    fn step<B: IoBus>(&mut self, bus: &mut B) -> u32;

    /// Cumulative T-state counter since power-on.
    ///
    /// Must be monotonic. `reset()` does not rewind it.
    fn cycles(&self) -> u64;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Drive the maskable interrupt line.
    ///
    /// `Some(data)` holds /INT low with `data` on the bus during the
    /// acknowledge cycle. `None` releases the line.
    fn set_interrupt(&mut self, request: Option<u8>);

    /// Request a non-maskable interrupt.
    fn nmi(&mut self);

    /// Reset the CPU to its initial state.
    fn reset(&mut self);
}
