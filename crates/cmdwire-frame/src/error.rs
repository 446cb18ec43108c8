/// Errors raised while configuring or running the frame parser.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Separator bytes must be pairwise distinct and non-null.
    #[error("invalid separators (field {field:#04x}, command {command:#04x}, escape {escape:#04x}): {reason}")]
    InvalidSeparators {
        field: u8,
        command: u8,
        escape: u8,
        reason: &'static str,
    },

    /// The receive buffer is too small to hold any frame.
    #[error("buffer capacity {capacity} below minimum {min}")]
    InvalidCapacity { capacity: usize, min: usize },

    /// A frame outgrew the receive buffer and was discarded.
    ///
    /// The parser has already recovered; the next frame parses normally.
    #[error("frame exceeded buffer capacity of {capacity} bytes and was discarded")]
    FrameTooLarge { capacity: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;

/// What a typed argument read was trying to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeKind {
    Integer,
    Float,
    CommandId,
}

/// Errors from typed argument reads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// No further argument in the current frame.
    #[error("argument missing")]
    Missing,

    /// The argument is present but could not be converted.
    #[error("cannot decode {kind:?} argument from {token:?}")]
    Decode { kind: DecodeKind, token: String },

    /// A binary argument is shorter than the requested payload width.
    #[error("binary argument too short ({actual} bytes, need {expected})")]
    ShortBinary { expected: usize, actual: usize },

    /// A string argument is not valid UTF-8.
    #[error("argument is not valid UTF-8")]
    Utf8,
}

impl ArgumentError {
    pub(crate) fn decode(kind: DecodeKind, token: &[u8]) -> Self {
        Self::Decode {
            kind,
            token: String::from_utf8_lossy(token).into_owned(),
        }
    }
}
