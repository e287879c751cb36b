//! Transport trait - raw byte access to the token

use crate::error::TransportError;

/// Byte-level access to the line the token is attached to.
///
/// Reads block for at most the line's fixed per-read timeout. Every error
/// is a transport fault: callers never retry and the session is closed.
pub trait Transport: Send {
    /// Write all of `bytes` to the line.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Read whatever arrived within one per-read timeout.
    ///
    /// Returns `Ok(0)` when the timeout expired without data.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Discard buffered input until a read comes back empty.
    ///
    /// Returns the number of stale bytes dropped.
    fn drain(&mut self) -> Result<usize, TransportError> {
        let mut buf = [0u8; 1024];
        let mut dropped = 0;
        loop {
            let n = self.read_chunk(&mut buf)?;
            if n == 0 {
                return Ok(dropped);
            }
            dropped += n;
        }
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write_all(bytes)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        (**self).read_chunk(buf)
    }

    fn drain(&mut self) -> Result<usize, TransportError> {
        (**self).drain()
    }
}
