use crate::error::Result;

/// A bidirectional byte stream the protocol engine can poll.
///
/// `bytes_available` must never block. `read_up_to` may block briefly but
/// is only called by the engine after `bytes_available` reported data, so
/// well-behaved implementations return immediately.
pub trait ByteStream {
    /// Number of bytes that can be read without blocking.
    ///
    /// Returns `Err(TransportError::Closed)` once the peer has gone away and
    /// nothing is left to read.
    fn bytes_available(&mut self) -> Result<usize>;

    /// Read up to `buf.len()` bytes, returning how many were read.
    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write the whole buffer.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Flush buffered output, if the stream buffers at all.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<T: ByteStream + ?Sized> ByteStream for &mut T {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_up_to(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<T: ByteStream + ?Sized> ByteStream for Box<T> {
    fn bytes_available(&mut self) -> Result<usize> {
        (**self).bytes_available()
    }

    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read_up_to(buf)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        (**self).write_all(bytes)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}
