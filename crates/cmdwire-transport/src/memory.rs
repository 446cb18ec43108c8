use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{Result, TransportError};
use crate::traits::ByteStream;

#[derive(Debug, Default)]
struct Pipe {
    data: VecDeque<u8>,
    closed: bool,
}

/// One end of an in-memory duplex byte stream.
///
/// Both ends are `Send`, so a test can drive the peer from another thread
/// while the engine polls this end.
#[derive(Debug)]
pub struct MemoryStream {
    rx: Arc<Mutex<Pipe>>,
    tx: Arc<Mutex<Pipe>>,
}

impl MemoryStream {
    /// Create two connected ends. Bytes written to one are readable from the other.
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Mutex::new(Pipe::default()));
        let b_to_a = Arc::new(Mutex::new(Pipe::default()));
        let a = Self {
            rx: Arc::clone(&b_to_a),
            tx: Arc::clone(&a_to_b),
        };
        let b = Self {
            rx: a_to_b,
            tx: b_to_a,
        };
        (a, b)
    }

    /// Read everything currently buffered for this end.
    pub fn drain(&mut self) -> Vec<u8> {
        lock(&self.rx).data.drain(..).collect()
    }
}

impl ByteStream for MemoryStream {
    fn bytes_available(&mut self) -> Result<usize> {
        let pipe = lock(&self.rx);
        if pipe.data.is_empty() && pipe.closed {
            return Err(TransportError::Closed);
        }
        Ok(pipe.data.len())
    }

    fn read_up_to(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut pipe = lock(&self.rx);
        let n = pipe.data.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(pipe.data.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut pipe = lock(&self.tx);
        if pipe.closed {
            return Err(TransportError::Closed);
        }
        pipe.data.extend(bytes.iter().copied());
        Ok(())
    }
}

impl Drop for MemoryStream {
    fn drop(&mut self) {
        lock(&self.tx).closed = true;
        lock(&self.rx).closed = true;
    }
}

fn lock(pipe: &Mutex<Pipe>) -> MutexGuard<'_, Pipe> {
    pipe.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_flow_between_ends() {
        let (mut left, mut right) = MemoryStream::pair();

        left.write_all(b"5,hi;").unwrap();
        assert_eq!(right.bytes_available().unwrap(), 5);
        assert_eq!(left.bytes_available().unwrap(), 0);

        let mut buf = [0u8; 3];
        assert_eq!(right.read_up_to(&mut buf).unwrap(), 3);
        assert_eq!(&buf, b"5,h");
        assert_eq!(right.drain(), b"i;");
    }

    #[test]
    fn read_with_nothing_buffered_returns_zero() {
        let (_left, mut right) = MemoryStream::pair();
        let mut buf = [0u8; 8];
        assert_eq!(right.read_up_to(&mut buf).unwrap(), 0);
    }

    #[test]
    fn closed_after_peer_drop_once_drained() {
        let (mut left, mut right) = MemoryStream::pair();
        left.write_all(b"x").unwrap();
        drop(left);

        assert_eq!(right.bytes_available().unwrap(), 1);
        assert_eq!(right.drain(), b"x");
        assert!(matches!(
            right.bytes_available(),
            Err(TransportError::Closed)
        ));
        assert!(matches!(right.write_all(b"y"), Err(TransportError::Closed)));
    }

    #[test]
    fn usable_across_threads() {
        let (mut left, mut right) = MemoryStream::pair();
        let writer = std::thread::spawn(move || {
            left.write_all(b"9;").unwrap();
            left
        });
        let _left = writer.join().unwrap();
        assert_eq!(right.drain(), b"9;");
    }
}
