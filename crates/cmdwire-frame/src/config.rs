use crate::error::{FrameError, Result};
use crate::escape::Separators;

/// Default receive buffer size in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 192;

/// Smallest receive buffer that can hold a one-byte frame plus bookkeeping.
pub const MIN_BUFFER_CAPACITY: usize = 4;

/// Configuration for the frame parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    /// Field, command, and escape bytes. Default: `,` `;` `/`.
    pub separators: Separators,
    /// Receive buffer size. Frames longer than `buffer_capacity - 2` raw
    /// bytes are discarded. Default: 192.
    pub buffer_capacity: usize,
}

impl FrameConfig {
    /// Validate separators and capacity.
    pub fn validate(&self) -> Result<()> {
        self.separators.validate()?;
        if self.buffer_capacity < MIN_BUFFER_CAPACITY {
            return Err(FrameError::InvalidCapacity {
                capacity: self.buffer_capacity,
                min: MIN_BUFFER_CAPACITY,
            });
        }
        Ok(())
    }

    /// Longest raw frame (escape bytes included) the parser will accept.
    pub fn max_frame_len(&self) -> usize {
        self.buffer_capacity.saturating_sub(2)
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            separators: Separators::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}
