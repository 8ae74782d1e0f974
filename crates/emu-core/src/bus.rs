//! Memory and I/O bus interface.

/// Memory side of the bus.
///
/// The CPU core calls back into this for every memory cycle. The platform
/// decides which device answers (ROM overlay, RAM).
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);
}

/// Port side of the bus (Z80 `IN`/`OUT`).
///
/// The full 16-bit port address is passed through; machines that only
/// decode A0–A7 mask it themselves.
pub trait IoBus: Bus {
    /// Handle an `IN` from the given port.
    fn read_io(&mut self, port: u16) -> u8;

    /// Handle an `OUT` to the given port.
    fn write_io(&mut self, port: u16, value: u8);
}
