//! Byte-level escape rules shared by the parser, the tokenizer, and the writers.
//!
//! A byte is escaped iff the raw byte before it was the escape character and
//! that escape character was not itself escaped. `//` is therefore a literal
//! `/`, and `///,` is a literal `/` followed by a literal `,`.

use bytes::BufMut;

use crate::error::{FrameError, Result};

/// The three single-byte markers of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Separators {
    /// Ends an argument. Default `,`.
    pub field: u8,
    /// Ends a command. Default `;`.
    pub command: u8,
    /// Marks the next byte as literal. Default `/`.
    pub escape: u8,
}

impl Separators {
    /// Build a validated separator set.
    pub fn new(field: u8, command: u8, escape: u8) -> Result<Self> {
        let separators = Self {
            field,
            command,
            escape,
        };
        separators.validate()?;
        Ok(separators)
    }

    /// Check that the bytes are pairwise distinct and non-null.
    pub fn validate(&self) -> Result<()> {
        let reason = if self.field == 0 || self.command == 0 || self.escape == 0 {
            Some("the null byte is reserved")
        } else if self.field == self.command
            || self.field == self.escape
            || self.command == self.escape
        {
            Some("separators must be pairwise distinct")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(FrameError::InvalidSeparators {
                field: self.field,
                command: self.command,
                escape: self.escape,
                reason,
            }),
            None => Ok(()),
        }
    }
}

impl Default for Separators {
    fn default() -> Self {
        Self {
            field: b',',
            command: b';',
            escape: b'/',
        }
    }
}

/// Escape tracking carried from one raw byte to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscapeState {
    pending: bool,
}

impl EscapeState {
    /// Fresh state: the next byte is not escaped.
    pub const fn new() -> Self {
        Self { pending: false }
    }

    /// Advance over `byte`, returning whether it is escaped.
    pub fn step(&mut self, byte: u8, escape: u8) -> bool {
        let (escaped, next) = is_escaped(byte, *self, escape);
        *self = next;
        escaped
    }

    /// Whether the previous byte was an unescaped escape character.
    pub fn is_pending(&self) -> bool {
        self.pending
    }
}

/// Decide whether `byte` is escaped given the state left by the previous byte.
///
/// Returns the verdict and the state to use for the following byte.
pub fn is_escaped(byte: u8, previous: EscapeState, escape: u8) -> (bool, EscapeState) {
    let escaped = previous.pending;
    let next = EscapeState {
        pending: byte == escape && !escaped,
    };
    (escaped, next)
}

/// Whether `byte` must be preceded by the escape character on the wire.
pub fn needs_escape(byte: u8, separators: &Separators) -> bool {
    byte == separators.field || byte == separators.command || byte == separators.escape || byte == 0
}

/// Remove escape characters from `token` in place.
///
/// Bytes after each escape character shift left; the vacated tail is
/// zero-filled. A trailing lone escape character is dropped. Returns the
/// unescaped length.
pub fn unescape_in_place(token: &mut [u8], escape: u8) -> usize {
    let mut read = 0;
    let mut write = 0;
    while read < token.len() {
        if token[read] == escape {
            read += 1;
            if read == token.len() {
                break;
            }
        }
        token[write] = token[read];
        write += 1;
        read += 1;
    }
    token[write..].fill(0);
    write
}

/// Append `byte` to `dst`, preceded by the escape character when required.
pub fn put_escaped<B: BufMut>(byte: u8, separators: &Separators, dst: &mut B) {
    if needs_escape(byte, separators) {
        dst.put_u8(separators.escape);
    }
    dst.put_u8(byte);
}

/// Append every byte of `bytes` with [`put_escaped`].
pub fn put_escaped_slice<B: BufMut>(bytes: &[u8], separators: &Separators, dst: &mut B) {
    for &byte in bytes {
        put_escaped(byte, separators, dst);
    }
}
