//! Trait abstraction for serial port operations to enable testing

use std::io;

/// Trait for the byte-level serial operations the camera client needs
///
/// The control tick busy-polls, so every call is synchronous and
/// `read_byte` is only issued after `bytes_available` reported data.
pub trait SerialPortIO: Send {
    /// Number of received bytes waiting to be read
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read one received byte
    fn read_byte(&mut self) -> io::Result<u8>;

    /// Write all data to the port
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Flush the output buffer
    fn flush(&mut self) -> io::Result<()>;
}
