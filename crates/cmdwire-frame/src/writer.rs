//! Outbound frame encoding.
//!
//! A command is written as its decimal id, then one field separator plus
//! escaped text per argument, then the command separator:
//!
//! ```
//! use bytes::BytesMut;
//! use cmdwire_frame::{writer, Separators};
//!
//! let seps = Separators::default();
//! let mut out = BytesMut::new();
//! writer::put_command_id(5, &mut out);
//! writer::put_argument("a,b", &seps, &mut out);
//! writer::put_argument(&42, &seps, &mut out);
//! writer::put_terminator(&seps, false, &mut out);
//! assert_eq!(&out[..], b"5,a/,b,42;");
//! ```

use std::io::Write as _;

use bytes::BufMut;

use crate::args::BinaryArg;
use crate::escape::{put_escaped_slice, Separators};
use crate::format::{EscapedWriter, ToArgument};

/// Write the command id in decimal. Ids are never escaped.
pub fn put_command_id<B: BufMut>(id: u8, dst: &mut B) {
    let mut digits = [0u8; 3];
    let mut cursor = &mut digits[..];
    // Three bytes always hold a u8 in decimal.
    let _ = write!(cursor, "{id}");
    let written = 3 - cursor.len();
    dst.put_slice(&digits[..written]);
}

/// Write a field separator followed by `value` as escaped text.
pub fn put_argument<T, B>(value: &T, separators: &Separators, dst: &mut B)
where
    T: ToArgument + ?Sized,
    B: BufMut,
{
    dst.put_u8(separators.field);
    value.write_argument(&mut EscapedWriter::new(dst, separators));
}

/// Write a field separator followed by the escaped little-endian bytes of `value`.
pub fn put_binary_argument<T, B>(value: &T, separators: &Separators, dst: &mut B)
where
    T: BinaryArg,
    B: BufMut,
{
    dst.put_u8(separators.field);
    put_escaped_slice(value.to_wire().as_ref(), separators, dst);
}

/// Write the command separator, plus `\r\n` when `append_newline` is set.
pub fn put_terminator<B: BufMut>(separators: &Separators, append_newline: bool, dst: &mut B) {
    dst.put_u8(separators.command);
    if append_newline {
        dst.put_slice(b"\r\n");
    }
}
