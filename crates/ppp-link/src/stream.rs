//! Duplex byte stream contract

use std::io;
use std::time::Duration;

/// Duplex byte channel carrying the PPP link, typically a serial port
///
/// A read that times out with nothing available returns `Ok(0)`; it is not an
/// error. A zero timeout asks for whatever is already buffered.
pub trait StreamAdapter {
    /// Read up to `buf.len()` bytes, waiting at most `timeout`
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Write as much of `data` as possible within `timeout`
    fn write(&mut self, data: &[u8], timeout: Duration) -> io::Result<usize>;
}

impl<T: StreamAdapter + ?Sized> StreamAdapter for &mut T {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read(buf, timeout)
    }

    fn write(&mut self, data: &[u8], timeout: Duration) -> io::Result<usize> {
        (**self).write(data, timeout)
    }
}

impl<T: StreamAdapter + ?Sized> StreamAdapter for Box<T> {
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        (**self).read(buf, timeout)
    }

    fn write(&mut self, data: &[u8], timeout: Duration) -> io::Result<usize> {
        (**self).write(data, timeout)
    }
}

/// True for error kinds that only mean "nothing happened before the timeout"
pub fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
