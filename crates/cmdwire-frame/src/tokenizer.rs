//! Pull-based, escape-aware argument access over one completed frame.
//!
//! Tokens are pulled lazily. A pulled token stays *current* until a typed
//! read claims it; only then does the next read pull a fresh one. This is
//! what makes [`Arguments::available`] a peek and what lets
//! [`Arguments::compare_string`] leave a non-matching token for another read.

use crate::args::{decode_binary, parse_integer_prefix, BinaryArg, FromArgument};
use crate::error::{ArgumentError, DecodeKind};
use crate::escape::{unescape_in_place, EscapeState, Separators};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Token {
    start: usize,
    end: usize,
    /// Unescaped length, once the token has been unescaped in place.
    unescaped: Option<usize>,
}

/// Tokenizer position within the current frame.
///
/// Lives outside [`Arguments`] so a session can resume reading the same
/// frame across several `Arguments` borrows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgCursor {
    /// Where the next pull starts; `None` once the frame is exhausted.
    next: Option<usize>,
    current: Option<Token>,
    claimed: bool,
    arg_ok: bool,
}

impl ArgCursor {
    /// A cursor positioned at the start of a frame.
    pub fn new() -> Self {
        Self {
            next: Some(0),
            current: None,
            claimed: true,
            arg_ok: false,
        }
    }

    /// Rewind for a freshly completed frame.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ArgCursor {
    fn default() -> Self {
        Self::new()
    }
}

/// Typed, lazy access to the arguments of one frame.
///
/// Borrowed string and byte views are valid only while this borrow lives;
/// copy them out ([`Arguments::read_string`], [`Arguments::copy_string`]) to
/// keep them past the current frame.
#[derive(Debug)]
pub struct Arguments<'a> {
    frame: &'a mut [u8],
    cursor: &'a mut ArgCursor,
    separators: Separators,
}

impl<'a> Arguments<'a> {
    /// Tokenize `frame` (raw, still escaped, without its command separator).
    pub fn new(frame: &'a mut [u8], cursor: &'a mut ArgCursor, separators: Separators) -> Self {
        Self {
            frame,
            cursor,
            separators,
        }
    }

    /// Whether another argument is available. Does not consume it.
    pub fn available(&mut self) -> bool {
        self.fetch()
    }

    /// Whether the last typed read found an argument.
    ///
    /// This reports presence only; a present but undecodable argument still
    /// reports `true` and surfaces as [`ArgumentError::Decode`] from the read.
    pub fn is_arg_ok(&self) -> bool {
        self.cursor.arg_ok
    }

    /// Read the next argument as `T`.
    pub fn read<T: FromArgument>(&mut self) -> Result<T, ArgumentError> {
        let range = self.claim()?;
        T::from_argument(&self.frame[range])
    }

    pub fn read_i16(&mut self) -> Result<i16, ArgumentError> {
        self.read()
    }

    pub fn read_i32(&mut self) -> Result<i32, ArgumentError> {
        self.read()
    }

    pub fn read_bool(&mut self) -> Result<bool, ArgumentError> {
        self.read()
    }

    pub fn read_f32(&mut self) -> Result<f32, ArgumentError> {
        self.read()
    }

    pub fn read_f64(&mut self) -> Result<f64, ArgumentError> {
        self.read()
    }

    /// First byte of the next argument, or 0 if it is empty.
    pub fn read_char(&mut self) -> Result<u8, ArgumentError> {
        let range = self.claim()?;
        Ok(self.frame[range].first().copied().unwrap_or(0))
    }

    /// The next argument's unescaped bytes, borrowed from the receive buffer.
    pub fn read_bytes(&mut self) -> Result<&[u8], ArgumentError> {
        let range = self.claim()?;
        Ok(&self.frame[range])
    }

    /// The next argument as borrowed UTF-8 text.
    pub fn read_str(&mut self) -> Result<&str, ArgumentError> {
        let range = self.claim()?;
        std::str::from_utf8(&self.frame[range]).map_err(|_| ArgumentError::Utf8)
    }

    /// The next argument as an owned string.
    pub fn read_string(&mut self) -> Result<String, ArgumentError> {
        self.read()
    }

    /// Copy the next argument into `dst`, truncating to fit and always
    /// null-terminating within `dst`. Returns the number of bytes copied
    /// before the terminator.
    ///
    /// When no argument is left, `dst` (if non-empty) is set to an empty
    /// string and [`ArgumentError::Missing`] is returned.
    pub fn copy_string(&mut self, dst: &mut [u8]) -> Result<usize, ArgumentError> {
        let range = match self.claim() {
            Ok(range) => range,
            Err(err) => {
                if let Some(first) = dst.first_mut() {
                    *first = 0;
                }
                return Err(err);
            }
        };
        let Some(room) = dst.len().checked_sub(1) else {
            return Ok(0);
        };
        let token = &self.frame[range];
        let n = token.len().min(room);
        dst[..n].copy_from_slice(&token[..n]);
        dst[n] = 0;
        Ok(n)
    }

    /// Compare the next argument with `expected`.
    ///
    /// On a match the argument is consumed. On a mismatch it stays current,
    /// so the next read sees it again, and [`Self::is_arg_ok`] reports `false`.
    pub fn compare_string(&mut self, expected: impl AsRef<[u8]>) -> bool {
        if !self.fetch() {
            self.cursor.arg_ok = false;
            return false;
        }
        let range = self.unescape_current();
        if &self.frame[range] == expected.as_ref() {
            self.cursor.claimed = true;
            self.cursor.arg_ok = true;
            true
        } else {
            self.cursor.arg_ok = false;
            false
        }
    }

    /// Read the next argument as a fixed-width binary payload.
    pub fn read_binary<T: BinaryArg>(&mut self) -> Result<T, ArgumentError> {
        let range = self.claim()?;
        decode_binary(&self.frame[range])
    }

    /// Read the command id slot: a decimal integer in `0..=255`.
    pub fn read_command_id(&mut self) -> Result<u8, ArgumentError> {
        let range = self.claim()?;
        let token = &self.frame[range];
        parse_integer_prefix(token)
            .and_then(|value| u8::try_from(value).ok())
            .ok_or_else(|| ArgumentError::decode(DecodeKind::CommandId, token))
    }

    /// Pull a token if the previous one was claimed. Returns whether a token
    /// is current.
    fn fetch(&mut self) -> bool {
        if self.cursor.claimed {
            match self.pull() {
                Some(token) => {
                    self.cursor.current = Some(token);
                    self.cursor.claimed = false;
                }
                // Nothing new: stay claimed so later calls keep reporting absence.
                None => self.cursor.current = None,
            }
        }
        self.cursor.current.is_some() && !self.cursor.claimed
    }

    fn claim(&mut self) -> Result<std::ops::Range<usize>, ArgumentError> {
        if !self.fetch() {
            self.cursor.arg_ok = false;
            return Err(ArgumentError::Missing);
        }
        let range = self.unescape_current();
        self.cursor.claimed = true;
        self.cursor.arg_ok = true;
        Ok(range)
    }

    fn unescape_current(&mut self) -> std::ops::Range<usize> {
        let Some(token) = self.cursor.current.as_mut() else {
            return 0..0;
        };
        let len = match token.unescaped {
            Some(len) => len,
            None => {
                let len =
                    unescape_in_place(&mut self.frame[token.start..token.end], self.separators.escape);
                token.unescaped = Some(len);
                len
            }
        };
        token.start..token.start + len
    }

    fn pull(&mut self) -> Option<Token> {
        let start = self.cursor.next?;
        if start >= self.frame.len() {
            self.cursor.next = None;
            return None;
        }

        let mut state = EscapeState::new();
        let mut end = start;
        let mut at_separator = false;
        while end < self.frame.len() {
            let byte = self.frame[end];
            let escaped = state.step(byte, self.separators.escape);
            if !escaped && byte == self.separators.field {
                at_separator = true;
                break;
            }
            if !escaped && byte == 0 {
                break;
            }
            end += 1;
        }

        if end == start && !at_separator {
            self.cursor.next = None;
            return None;
        }

        self.cursor.next = if at_separator { Some(end + 1) } else { None };
        Some(Token {
            start,
            end,
            unescaped: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_args<R>(frame: &[u8], f: impl FnOnce(&mut Arguments<'_>) -> R) -> R {
        let mut buf = frame.to_vec();
        let mut cursor = ArgCursor::new();
        let mut args = Arguments::new(&mut buf, &mut cursor, Separators::default());
        f(&mut args)
    }

    #[test]
    fn reads_typed_arguments_in_order() {
        with_args(b"5,a/,b,42", |args| {
            assert_eq!(args.read_command_id(), Ok(5));
            assert_eq!(args.read_str(), Ok("a,b"));
            assert_eq!(args.read_i32(), Ok(42));
            assert_eq!(args.read_i32(), Err(ArgumentError::Missing));
            assert!(!args.is_arg_ok());
        });
    }

    #[test]
    fn escaped_escape_unescapes_to_single() {
        with_args(b"1,a//b", |args| {
            assert_eq!(args.read_command_id(), Ok(1));
            assert_eq!(args.read_bytes(), Ok(&b"a/b"[..]));
        });
    }

    #[test]
    fn escaped_escape_does_not_escape_separator() {
        // "a//" ends with a literal '/', so the comma after it splits.
        with_args(b"1,a//,b", |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_string(), Ok("a/".to_string()));
            assert_eq!(args.read_string(), Ok("b".to_string()));
        });
    }

    #[test]
    fn empty_tokens_are_yielded() {
        with_args(b"3,,x", |args| {
            assert_eq!(args.read_command_id(), Ok(3));
            assert_eq!(args.read_str(), Ok(""));
            assert!(args.is_arg_ok());
            assert_eq!(args.read_str(), Ok("x"));
            assert_eq!(args.read_str(), Err(ArgumentError::Missing));
        });
    }

    #[test]
    fn trailing_separator_yields_no_extra_token() {
        with_args(b"3,x,", |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_str(), Ok("x"));
            assert!(!args.available());
        });
    }

    #[test]
    fn available_is_a_peek() {
        with_args(b"1,7,8", |args| {
            args.read_command_id().unwrap();
            assert!(args.available());
            assert!(args.available());
            assert_eq!(args.read_i16(), Ok(7));
            assert_eq!(args.read_i16(), Ok(8));
            assert!(!args.available());
        });
    }

    #[test]
    fn missing_stays_missing() {
        with_args(b"1", |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_f64(), Err(ArgumentError::Missing));
            assert_eq!(args.read_bool(), Err(ArgumentError::Missing));
            assert!(!args.available());
        });
    }

    #[test]
    fn decode_error_still_reports_present() {
        with_args(b"1,abc,2", |args| {
            args.read_command_id().unwrap();
            assert!(matches!(
                args.read_i32(),
                Err(ArgumentError::Decode { .. })
            ));
            assert!(args.is_arg_ok());
            assert_eq!(args.read_i32(), Ok(2));
        });
    }

    #[test]
    fn compare_string_match_consumes() {
        with_args(b"1,on,5", |args| {
            args.read_command_id().unwrap();
            assert!(args.compare_string("on"));
            assert!(args.is_arg_ok());
            assert_eq!(args.read_i32(), Ok(5));
        });
    }

    #[test]
    fn compare_string_mismatch_leaves_token() {
        with_args(b"1,o/,n,5", |args| {
            args.read_command_id().unwrap();
            assert!(!args.compare_string("off"));
            assert!(!args.is_arg_ok());
            // Unescaped once only, even though it was inspected twice.
            assert!(args.compare_string("o,n"));
            assert_eq!(args.read_i32(), Ok(5));
        });
    }

    #[test]
    fn compare_string_without_token() {
        with_args(b"1", |args| {
            args.read_command_id().unwrap();
            assert!(!args.compare_string(""));
            assert!(!args.is_arg_ok());
        });
    }

    #[test]
    fn char_reads_first_byte_or_zero() {
        with_args(b"1,xyz,", |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_char(), Ok(b'x'));
        });
        with_args(b"1,,z", |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_char(), Ok(0));
            assert_eq!(args.read_char(), Ok(b'z'));
        });
    }

    #[test]
    fn copy_string_truncates_and_terminates() {
        with_args(b"1,hello,hi", |args| {
            args.read_command_id().unwrap();
            let mut small = [0xAAu8; 4];
            assert_eq!(args.copy_string(&mut small), Ok(3));
            assert_eq!(&small, b"hel\0");

            let mut big = [0xAAu8; 8];
            assert_eq!(args.copy_string(&mut big), Ok(2));
            assert_eq!(&big[..3], b"hi\0");

            let mut missing = [0xAAu8; 2];
            assert_eq!(args.copy_string(&mut missing), Err(ArgumentError::Missing));
            assert_eq!(missing[0], 0);

            assert_eq!(args.copy_string(&mut []), Err(ArgumentError::Missing));
        });
    }

    #[test]
    fn binary_payload_with_escaped_bytes() {
        // 0x2C2C is ",," and must travel escaped.
        let mut wire = b"1,".to_vec();
        wire.extend_from_slice(b"/,/,");
        with_args(&wire, |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_binary::<u16>(), Ok(0x2C2C));
        });
    }

    #[test]
    fn short_binary_is_reported() {
        with_args(b"1,ab", |args| {
            args.read_command_id().unwrap();
            assert_eq!(
                args.read_binary::<u32>(),
                Err(ArgumentError::ShortBinary {
                    expected: 4,
                    actual: 2
                })
            );
        });
    }

    #[test]
    fn escaped_null_is_data_unescaped_null_ends_frame() {
        with_args(&[b'1', b',', b'/', 0, b'a', b',', b'b'], |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_bytes(), Ok(&[0u8, b'a'][..]));
            assert_eq!(args.read_str(), Ok("b"));
        });
        with_args(&[b'1', b',', b'a', 0, b',', b'b'], |args| {
            args.read_command_id().unwrap();
            assert_eq!(args.read_str(), Ok("a"));
            assert!(!args.available());
        });
    }

    #[test]
    fn command_id_range_checked() {
        with_args(b"256", |args| {
            assert!(matches!(
                args.read_command_id(),
                Err(ArgumentError::Decode {
                    kind: DecodeKind::CommandId,
                    ..
                })
            ));
        });
        with_args(b"x", |args| {
            assert!(args.read_command_id().is_err());
        });
    }

    #[test]
    fn cursor_resumes_across_borrows() {
        let mut buf = b"2,first,second".to_vec();
        let mut cursor = ArgCursor::new();
        {
            let mut args = Arguments::new(&mut buf, &mut cursor, Separators::default());
            assert_eq!(args.read_command_id(), Ok(2));
            assert_eq!(args.read_str(), Ok("first"));
        }
        let mut args = Arguments::new(&mut buf, &mut cursor, Separators::default());
        assert_eq!(args.read_str(), Ok("second"));
    }

    #[test]
    fn custom_separators() {
        let mut buf = b"4|x\\|y|9".to_vec();
        let mut cursor = ArgCursor::new();
        let seps = Separators::new(b'|', b'#', b'\\').unwrap();
        let mut args = Arguments::new(&mut buf, &mut cursor, seps);
        assert_eq!(args.read_command_id(), Ok(4));
        assert_eq!(args.read_str(), Ok("x|y"));
        assert_eq!(args.read_i32(), Ok(9));
    }
}
