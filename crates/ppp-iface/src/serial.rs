//! Serial port stream adapter

use std::io;
use std::time::Duration;

use ppp_link::{is_timeout, StreamAdapter};
use serialport::SerialPort;
use tracing::debug;

use crate::error::PppError;

/// A serial port carrying the PPP link
pub struct SerialStream {
    port: Box<dyn SerialPort>,
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("port", &self.port.name())
            .finish()
    }
}

impl SerialStream {
    /// Open `path` at `baud_rate`
    pub fn open(path: &str, baud_rate: u32) -> Result<Self, PppError> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(100))
            .open()?;
        debug!("Opened {} at {} baud", path, baud_rate);
        Ok(Self { port })
    }

    /// Wrap an already opened port
    pub fn from_port(port: Box<dyn SerialPort>) -> Self {
        Self { port }
    }

    /// Port name, if the platform reports one
    pub fn name(&self) -> Option<String> {
        self.port.name()
    }
}

/// A zero timeout means "only what is already buffered"
fn nothing_to_read(timeout: Duration, pending: u32) -> bool {
    timeout.is_zero() && pending == 0
}

/// Treat an expired timeout as an empty transfer
fn timeout_as_empty(result: io::Result<usize>) -> io::Result<usize> {
    match result {
        Err(e) if is_timeout(&e) => Ok(0),
        other => other,
    }
}

impl StreamAdapter for SerialStream {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        if nothing_to_read(timeout, self.port.bytes_to_read()?) {
            return Ok(0);
        }
        self.port.set_timeout(timeout)?;
        timeout_as_empty(io::Read::read(&mut self.port, buf))
    }

    fn write(&mut self, data: &[u8], timeout: Duration) -> io::Result<usize> {
        self.port.set_timeout(timeout)?;
        timeout_as_empty(io::Write::write(&mut self.port, data))
    }
}

// Reads and writes against a real port are only exercised on hardware.
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timeout_skips_empty_port() {
        assert!(nothing_to_read(Duration::ZERO, 0));
        assert!(!nothing_to_read(Duration::ZERO, 3));
        assert!(!nothing_to_read(Duration::from_millis(5), 0));
    }

    #[test]
    fn test_timeouts_read_as_empty() {
        for kind in [io::ErrorKind::TimedOut, io::ErrorKind::WouldBlock] {
            assert_eq!(timeout_as_empty(Err(kind.into())).unwrap(), 0);
        }
        assert_eq!(timeout_as_empty(Ok(7)).unwrap(), 7);

        let err = timeout_as_empty(Err(io::ErrorKind::BrokenPipe.into())).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
