//! Memory and I/O bus interface.

/// Memory and I/O bus interface.
///
/// The X16 is fully memory-mapped. The CPU reaches RAM, ROM and every
/// I/O chip through this trait; the bus handles address decoding.
pub trait Bus {
    /// Read a byte, applying any read side effects of the addressed device.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Read a byte without side effects.
    ///
    /// Used by debuggers and state dumps: reading an I/O register this way
    /// must never acknowledge an interrupt or advance a device.
    fn peek(&mut self, address: u16) -> u8;
}
