//! Token → typed value conversion.
//!
//! Numeric parsing is deliberately permissive, like C's `atoi`/`strtod`:
//! leading whitespace and a sign are accepted, anything after the longest
//! valid numeric prefix is ignored, and integer overflow wraps. A token with
//! no numeric prefix at all is a [`ArgumentError::Decode`].

use crate::error::{ArgumentError, DecodeKind};

/// A value that can be decoded from one unescaped text argument.
pub trait FromArgument: Sized {
    fn from_argument(token: &[u8]) -> Result<Self, ArgumentError>;
}

macro_rules! int_from_argument {
    ($($t:ty),*) => {$(
        impl FromArgument for $t {
            fn from_argument(token: &[u8]) -> Result<Self, ArgumentError> {
                parse_integer_prefix(token)
                    .map(|value| value as $t)
                    .ok_or_else(|| ArgumentError::decode(DecodeKind::Integer, token))
            }
        }
    )*};
}

int_from_argument!(i16, i32, i64);

impl FromArgument for bool {
    fn from_argument(token: &[u8]) -> Result<Self, ArgumentError> {
        i16::from_argument(token).map(|value| value != 0)
    }
}

impl FromArgument for f64 {
    fn from_argument(token: &[u8]) -> Result<Self, ArgumentError> {
        parse_float_prefix(token).ok_or_else(|| ArgumentError::decode(DecodeKind::Float, token))
    }
}

impl FromArgument for f32 {
    fn from_argument(token: &[u8]) -> Result<Self, ArgumentError> {
        f64::from_argument(token).map(|value| value as f32)
    }
}

impl FromArgument for String {
    fn from_argument(token: &[u8]) -> Result<Self, ArgumentError> {
        std::str::from_utf8(token)
            .map(str::to_owned)
            .map_err(|_| ArgumentError::Utf8)
    }
}

impl FromArgument for Vec<u8> {
    fn from_argument(token: &[u8]) -> Result<Self, ArgumentError> {
        Ok(token.to_vec())
    }
}

/// A fixed-width value sent as raw (escaped) little-endian bytes.
pub trait BinaryArg: Sized {
    /// Payload width in bytes.
    const WIDTH: usize;
    type Wire: AsRef<[u8]>;

    fn to_wire(&self) -> Self::Wire;

    /// Decode from exactly [`Self::WIDTH`] bytes.
    fn from_wire(bytes: &[u8]) -> Self;
}

macro_rules! numeric_binary_arg {
    ($($t:ty),*) => {$(
        impl BinaryArg for $t {
            const WIDTH: usize = std::mem::size_of::<$t>();
            type Wire = [u8; std::mem::size_of::<$t>()];

            fn to_wire(&self) -> Self::Wire {
                self.to_le_bytes()
            }

            fn from_wire(bytes: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(&bytes[..Self::WIDTH]);
                <$t>::from_le_bytes(raw)
            }
        }
    )*};
}

numeric_binary_arg!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl BinaryArg for bool {
    const WIDTH: usize = 1;
    type Wire = [u8; 1];

    fn to_wire(&self) -> Self::Wire {
        [u8::from(*self)]
    }

    fn from_wire(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl<const N: usize> BinaryArg for [u8; N] {
    const WIDTH: usize = N;
    type Wire = [u8; N];

    fn to_wire(&self) -> Self::Wire {
        *self
    }

    fn from_wire(bytes: &[u8]) -> Self {
        let mut raw = [0u8; N];
        raw.copy_from_slice(&bytes[..N]);
        raw
    }
}

/// Decode a binary payload, checking the token is wide enough.
pub fn decode_binary<T: BinaryArg>(token: &[u8]) -> Result<T, ArgumentError> {
    if token.len() < T::WIDTH {
        return Err(ArgumentError::ShortBinary {
            expected: T::WIDTH,
            actual: token.len(),
        });
    }
    Ok(T::from_wire(&token[..T::WIDTH]))
}

fn is_c_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | 0x0b | 0x0c | b'\r')
}

fn skip_space(token: &[u8]) -> usize {
    token.iter().take_while(|&&b| is_c_space(b)).count()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Parse the longest `[space][sign]digits` prefix, wrapping on overflow.
pub fn parse_integer_prefix(token: &[u8]) -> Option<i64> {
    let mut i = skip_space(token);
    let negative = match token.get(i) {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let digits = count_digits(&token[i..]);
    if digits == 0 {
        return None;
    }

    let value = token[i..i + digits].iter().fold(0i64, |acc, &d| {
        acc.wrapping_mul(10).wrapping_add(i64::from(d - b'0'))
    });
    Some(if negative { value.wrapping_neg() } else { value })
}

/// Parse the longest decimal/exponential (or `inf`/`nan`) prefix.
pub fn parse_float_prefix(token: &[u8]) -> Option<f64> {
    let start = skip_space(token);
    let mut i = start;
    if matches!(token.get(i), Some(b'+' | b'-')) {
        i += 1;
    }

    let rest = &token[i..];
    for word in ["infinity", "inf", "nan"] {
        if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word.as_bytes()) {
            return parse_ascii(&token[start..i + word.len()]);
        }
    }

    let int_digits = count_digits(&token[i..]);
    i += int_digits;
    let mut frac_digits = 0;
    if token.get(i) == Some(&b'.') {
        frac_digits = count_digits(&token[i + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            i += 1 + frac_digits;
        }
    }
    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    if matches!(token.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(token.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exp_digits = count_digits(&token[j.min(token.len())..]);
        if exp_digits > 0 {
            i = j + exp_digits;
        }
    }

    parse_ascii(&token[start..i])
}

fn parse_ascii(text: &[u8]) -> Option<f64> {
    std::str::from_utf8(text).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_parse_permissively() {
        assert_eq!(i32::from_argument(b"42"), Ok(42));
        assert_eq!(i32::from_argument(b"  -17"), Ok(-17));
        assert_eq!(i32::from_argument(b"+8"), Ok(8));
        assert_eq!(i32::from_argument(b"12abc"), Ok(12));
        assert_eq!(i16::from_argument(b"007"), Ok(7));
    }

    #[test]
    fn integer_without_digits_is_decode_error() {
        for token in [&b""[..], b"abc", b"-", b" +x"] {
            let err = i32::from_argument(token).unwrap_err();
            assert!(matches!(
                err,
                ArgumentError::Decode {
                    kind: DecodeKind::Integer,
                    ..
                }
            ));
        }
    }

    #[test]
    fn integer_overflow_wraps() {
        assert_eq!(i16::from_argument(b"32768"), Ok(i16::MIN));
        assert_eq!(i16::from_argument(b"65537"), Ok(1));
        assert_eq!(i32::from_argument(b"2147483648"), Ok(i32::MIN));
    }

    #[test]
    fn booleans_are_nonzero_integers() {
        assert_eq!(bool::from_argument(b"1"), Ok(true));
        assert_eq!(bool::from_argument(b"-3"), Ok(true));
        assert_eq!(bool::from_argument(b"0"), Ok(false));
        assert!(bool::from_argument(b"true").is_err());
    }

    #[test]
    fn floats_parse_decimal_and_exponent_forms() {
        assert_eq!(f64::from_argument(b"3.5"), Ok(3.5));
        assert_eq!(f64::from_argument(b"-0.25"), Ok(-0.25));
        assert_eq!(f64::from_argument(b".5"), Ok(0.5));
        assert_eq!(f64::from_argument(b"5."), Ok(5.0));
        assert_eq!(f64::from_argument(b"1.25E+3"), Ok(1250.0));
        assert_eq!(f64::from_argument(b"2e-2"), Ok(0.02));
        assert_eq!(f32::from_argument(b"1.5"), Ok(1.5f32));
    }

    #[test]
    fn float_trailing_garbage_ignored() {
        assert_eq!(f64::from_argument(b"2.5volts"), Ok(2.5));
        // Exponent marker without digits is not part of the number.
        assert_eq!(f64::from_argument(b"4e"), Ok(4.0));
        assert_eq!(f64::from_argument(b"4e+"), Ok(4.0));
    }

    #[test]
    fn float_special_values() {
        assert_eq!(f64::from_argument(b"INF"), Ok(f64::INFINITY));
        assert_eq!(f64::from_argument(b"-INF"), Ok(f64::NEG_INFINITY));
        assert_eq!(f64::from_argument(b"infinity"), Ok(f64::INFINITY));
        assert!(f64::from_argument(b"NaN").unwrap().is_nan());
    }

    #[test]
    fn float_without_digits_is_decode_error() {
        for token in [&b""[..], b".", b"-.", b"volts", b"e5"] {
            assert!(matches!(
                f64::from_argument(token),
                Err(ArgumentError::Decode {
                    kind: DecodeKind::Float,
                    ..
                })
            ));
        }
    }

    #[test]
    fn strings_require_utf8() {
        assert_eq!(String::from_argument(b"hello"), Ok("hello".to_string()));
        assert_eq!(
            String::from_argument(&[0xff, 0xfe]),
            Err(ArgumentError::Utf8)
        );
        assert_eq!(Vec::<u8>::from_argument(&[0xff]), Ok(vec![0xff]));
    }

    #[test]
    fn binary_decode_checks_width() {
        assert_eq!(decode_binary::<u16>(&[0x34, 0x12]), Ok(0x1234));
        assert_eq!(decode_binary::<u16>(&[0x34, 0x12, 0x99]), Ok(0x1234));
        assert_eq!(
            decode_binary::<u32>(&[1, 2]),
            Err(ArgumentError::ShortBinary {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn binary_wire_is_little_endian() {
        assert_eq!(0x0102_0304u32.to_wire(), [4, 3, 2, 1]);
        assert_eq!(f32::from_wire(&1.5f32.to_le_bytes()), 1.5);
        assert!(bool::from_wire(&[7]));
        assert_eq!(<[u8; 3]>::from_wire(b"abc"), *b"abc");
    }
}
