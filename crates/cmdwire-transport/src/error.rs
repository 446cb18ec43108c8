use std::io;
use std::path::PathBuf;

/// Failures of the link underneath the command protocol.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("cannot listen on {path}: {source}")]
    Bind { path: PathBuf, source: io::Error },

    #[error("cannot reach {path}: {source}")]
    Connect { path: PathBuf, source: io::Error },

    #[error("accept failed: {0}")]
    Accept(io::Error),

    /// Read, write, or availability query failed.
    #[error("stream I/O failed: {0}")]
    Io(#[from] io::Error),

    /// `sun_path` cannot hold the requested path.
    #[error("socket path is {len} bytes, limit is {max}: {path}")]
    PathTooLong {
        path: PathBuf,
        len: usize,
        max: usize,
    },

    /// Peer hung up and every byte it sent has been read.
    #[error("peer closed the stream")]
    Closed,
}

impl TransportError {
    /// Whether the peer went away cleanly, as opposed to a hard failure.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
