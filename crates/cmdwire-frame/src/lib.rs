//! Escape-aware, delimiter-framed command protocol.
//!
//! A command on the wire is a run of text fields:
//!
//! ```text
//! 5,a/,b,42;
//! │ │    │  └─ command separator (ends the frame)
//! │ │    └──── second argument: "42"
//! │ └───────── first argument: "a,b" (the comma is escaped with '/')
//! └─────────── command id
//! ```
//!
//! Separator and escape bytes are configurable per connection
//! ([`Separators`]). This crate holds everything that touches bytes:
//! the escape rules, the incremental [`FrameParser`], the lazy argument
//! tokenizer ([`Arguments`]), and the outbound encoders in [`writer`].

pub mod args;
#[cfg(feature = "async")]
pub mod codec;
pub mod config;
pub mod error;
pub mod escape;
pub mod format;
pub mod parser;
pub mod tokenizer;
pub mod writer;

pub use args::{BinaryArg, FromArgument};
#[cfg(feature = "async")]
pub use codec::{CommandCodec, CommandFrame, CommandFrameBuilder};
pub use config::{FrameConfig, DEFAULT_BUFFER_CAPACITY, MIN_BUFFER_CAPACITY};
pub use error::{ArgumentError, DecodeKind, FrameError, Result};
pub use escape::{
    is_escaped, needs_escape, put_escaped, put_escaped_slice, unescape_in_place, EscapeState,
    Separators,
};
pub use format::{format_scientific, EscapedWriter, Fixed, Scientific, ToArgument, MAX_SCI_DIGITS};
pub use parser::{FrameParser, ParseState, PushSummary};
pub use tokenizer::{ArgCursor, Arguments};
