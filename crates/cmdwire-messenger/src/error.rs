/// Errors that can occur in messenger operations.
#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] cmdwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] cmdwire_frame::FrameError),

    /// Argument read failed.
    #[error("argument error: {0}")]
    Argument(#[from] cmdwire_frame::ArgumentError),

    /// `begin` was called while another command is still being composed.
    #[error("command {0} is still being composed")]
    CommandInProgress(u8),

    /// An argument or `end` was issued outside `begin`/`end`.
    #[error("no command in progress")]
    NoCommandInProgress,

    /// Messenger configuration rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A handler reported failure.
    #[error("handler failed: {0}")]
    Handler(String),
}

pub type Result<T> = std::result::Result<T, MessengerError>;
