//! Incremental frame parser.
//!
//! Bytes are pushed one at a time. An unescaped command separator completes
//! a frame; everything else accumulates into a fixed-size receive buffer.
//! A frame that would overflow the buffer is dropped whole: the parser
//! ignores bytes until the next unescaped command separator and then
//! resumes normally.

use tracing::{trace, warn};

use crate::config::FrameConfig;
use crate::error::{FrameError, Result};
use crate::escape::{EscapeState, Separators};
use crate::tokenizer::{ArgCursor, Arguments};

/// Where the parser stands after the last pushed byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseState {
    /// Collecting bytes of a frame (or waiting for the first one).
    #[default]
    Accumulating,
    /// The last byte completed a non-empty frame.
    FrameComplete,
    /// Arguments of the completed frame are being read.
    ReadingArguments,
}

/// Totals from [`FrameParser::push_slice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PushSummary {
    pub frames: usize,
    pub overflows: usize,
}

/// Byte-at-a-time frame assembler with a bounded receive buffer.
#[derive(Debug)]
pub struct FrameParser {
    buf: Box<[u8]>,
    len: usize,
    frame_len: usize,
    state: ParseState,
    escape: EscapeState,
    discarding: bool,
    separators: Separators,
    overflows: u64,
    cursor: ArgCursor,
}

impl FrameParser {
    pub fn new(config: &FrameConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            buf: vec![0u8; config.buffer_capacity].into_boxed_slice(),
            len: 0,
            frame_len: 0,
            state: ParseState::Accumulating,
            escape: EscapeState::new(),
            discarding: false,
            separators: config.separators,
            overflows: 0,
            cursor: ArgCursor::new(),
        })
    }

    pub fn separators(&self) -> Separators {
        self.separators
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Frames dropped for exceeding the buffer since construction.
    pub fn overflow_count(&self) -> u64 {
        self.overflows
    }

    /// Bytes of the frame currently being assembled.
    pub fn pending_len(&self) -> usize {
        self.len
    }

    /// Push one raw byte.
    ///
    /// Returns [`ParseState::FrameComplete`] when `byte` ended a non-empty
    /// frame; the frame stays readable through [`Self::arguments`] until the
    /// next push. An empty frame (a lone command separator) is skipped.
    ///
    /// # Errors
    ///
    /// [`FrameError::FrameTooLarge`] when the current frame no longer fits.
    /// The parser has already switched to discarding the rest of it.
    pub fn push_byte(&mut self, byte: u8) -> Result<ParseState> {
        self.state = ParseState::Accumulating;
        let escaped = self.escape.step(byte, self.separators.escape);

        if byte == self.separators.command && !escaped {
            if self.discarding {
                trace!("end of discarded frame");
                self.discarding = false;
            } else if self.len > 0 {
                self.buf[self.len] = 0;
                self.frame_len = self.len;
                self.state = ParseState::FrameComplete;
                self.cursor.reset();
                trace!(len = self.frame_len, "frame complete");
            }
            self.len = 0;
            return Ok(self.state);
        }

        if self.discarding {
            return Ok(self.state);
        }

        self.buf[self.len] = byte;
        self.len += 1;
        if self.len >= self.buf.len() - 1 {
            let capacity = self.buf.len();
            // An escape in the last slot still covers the byte after it.
            let escape = self.escape;
            self.reset();
            self.escape = escape;
            self.discarding = true;
            self.overflows += 1;
            warn!(capacity, "frame exceeded receive buffer, discarding");
            return Err(FrameError::FrameTooLarge { capacity });
        }
        Ok(self.state)
    }

    /// Arguments of the frame completed by the last push, if any.
    ///
    /// The first argument is the command id. Reads resume where the previous
    /// borrow left off.
    pub fn arguments(&mut self) -> Option<Arguments<'_>> {
        match self.state {
            ParseState::FrameComplete | ParseState::ReadingArguments => {
                self.state = ParseState::ReadingArguments;
                Some(Arguments::new(
                    &mut self.buf[..self.frame_len],
                    &mut self.cursor,
                    self.separators,
                ))
            }
            ParseState::Accumulating => None,
        }
    }

    /// Raw (still escaped) bytes of the completed frame.
    pub fn frame(&self) -> Option<&[u8]> {
        match self.state {
            ParseState::FrameComplete | ParseState::ReadingArguments => {
                Some(&self.buf[..self.frame_len])
            }
            ParseState::Accumulating => None,
        }
    }

    /// Push every byte of `bytes`, calling `on_frame` for each completed frame.
    ///
    /// Overflows are counted rather than returned.
    pub fn push_slice<F>(&mut self, bytes: &[u8], mut on_frame: F) -> PushSummary
    where
        F: FnMut(&mut Arguments<'_>),
    {
        let mut summary = PushSummary::default();
        for &byte in bytes {
            match self.push_byte(byte) {
                Ok(ParseState::FrameComplete) => {
                    summary.frames += 1;
                    if let Some(mut args) = self.arguments() {
                        on_frame(&mut args);
                    }
                }
                Ok(_) => {}
                Err(_) => summary.overflows += 1,
            }
        }
        summary
    }

    /// Drop any partial frame and escape state.
    pub fn reset(&mut self) {
        self.len = 0;
        self.frame_len = 0;
        self.escape = EscapeState::new();
        self.discarding = false;
        self.state = ParseState::Accumulating;
        self.buf.fill(0);
        self.cursor.reset();
    }
}
