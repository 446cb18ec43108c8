use std::time::Duration;

use cmdwire_frame::FrameConfig;

use crate::error::{MessengerError, Result};

/// Default acknowledgment timeout.
pub const DEFAULT_ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Command id awaited when an acknowledgment names none.
pub const DEFAULT_ACK_COMMAND: u8 = 1;

/// Upper bound on bytes pulled from the stream per read.
pub const DEFAULT_READ_CHUNK: usize = 512;

/// Configuration for a [`crate::Messenger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessengerConfig {
    /// Separators and receive buffer size.
    pub frame: FrameConfig,
    /// Timeout used by acknowledgments that do not set their own.
    pub ack_timeout: Duration,
    /// Command id awaited by [`crate::Messenger::default_ack`].
    pub default_ack_command: u8,
    /// Write `\r\n` after every command.
    pub append_newline: bool,
    /// Bytes read from the stream per call.
    pub read_chunk_size: usize,
    /// Sleep between polls in the async acknowledgment wait.
    pub poll_interval: Duration,
}

impl MessengerConfig {
    pub fn validate(&self) -> Result<()> {
        self.frame.validate()?;
        if self.read_chunk_size == 0 {
            return Err(MessengerError::InvalidConfig(
                "read_chunk_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            ack_timeout: DEFAULT_ACK_TIMEOUT,
            default_ack_command: DEFAULT_ACK_COMMAND,
            append_newline: false,
            read_chunk_size: DEFAULT_READ_CHUNK,
            poll_interval: Duration::from_millis(1),
        }
    }
}
