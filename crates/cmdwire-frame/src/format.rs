//! Typed value → outbound argument text.

use std::fmt::{self, Write as _};

use bytes::BufMut;

use crate::escape::{put_escaped_slice, Separators};

/// Maximum fractional digits for [`format_scientific`].
pub const MAX_SCI_DIGITS: u32 = 6;

/// Sink that escapes everything written through it.
pub struct EscapedWriter<'a, B: BufMut> {
    dst: &'a mut B,
    separators: &'a Separators,
}

impl<'a, B: BufMut> EscapedWriter<'a, B> {
    pub fn new(dst: &'a mut B, separators: &'a Separators) -> Self {
        Self { dst, separators }
    }

    /// Write raw bytes, escaping delimiters.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        put_escaped_slice(bytes, self.separators, self.dst);
    }
}

impl<B: BufMut> fmt::Write for EscapedWriter<'_, B> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

/// A value that can be sent as one text argument.
pub trait ToArgument {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>);
}

macro_rules! display_to_argument {
    ($($t:ty),*) => {$(
        impl ToArgument for $t {
            fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
                // Writing into an EscapedWriter cannot fail.
                let _ = write!(out, "{}", self);
            }
        }
    )*};
}

display_to_argument!(u8, i8, u16, i16, u32, i32, u64, i64, usize, isize, f32, f64, char);

impl ToArgument for bool {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        out.write_bytes(if *self { b"1" } else { b"0" });
    }
}

impl ToArgument for str {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        out.write_bytes(self.as_bytes());
    }
}

impl ToArgument for String {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        out.write_bytes(self.as_bytes());
    }
}

impl ToArgument for [u8] {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        out.write_bytes(self);
    }
}

impl ToArgument for Vec<u8> {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        out.write_bytes(self);
    }
}

impl<T: ToArgument + ?Sized> ToArgument for &T {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        (**self).write_argument(out);
    }
}

impl ToArgument for fmt::Arguments<'_> {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        let _ = out.write_fmt(*self);
    }
}

/// A float sent with a fixed number of decimals, e.g. `Fixed(3.14159, 2)` → `3.14`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fixed(pub f64, pub usize);

impl ToArgument for Fixed {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        let _ = write!(out, "{:.*}", self.1, self.0);
    }
}

/// A float sent in scientific notation, see [`format_scientific`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scientific(pub f64, pub u32);

impl ToArgument for Scientific {
    fn write_argument<B: BufMut>(&self, out: &mut EscapedWriter<'_, B>) {
        out.write_bytes(format_scientific(self.0, self.1).as_bytes());
    }
}

/// Format `value` as `d.fffE±x` with `digits` fractional digits (at most 6).
///
/// The mantissa is normalized into `[1, 10)`; a fraction that rounds up to
/// `10^digits` carries into the mantissa and, if needed, the exponent.
/// Infinities print as `INF`/`-INF`, NaN as `NaN`. With `digits == 0` the
/// fraction and its dot are omitted.
pub fn format_scientific(value: f64, digits: u32) -> String {
    let mut out = String::new();
    if value.is_nan() {
        out.push_str("NaN");
        return out;
    }

    let mut f = value;
    if f < 0.0 {
        out.push('-');
        f = -f;
    }
    if f.is_infinite() {
        out.push_str("INF");
        return out;
    }

    let digits = digits.min(MAX_SCI_DIGITS);
    let multiplier = 10u64.pow(digits);

    let mut whole = 0u64;
    let mut part = 0u64;
    let mut exponent = 0i32;
    if f != 0.0 {
        exponent = f.log10().floor() as i32;
        let mut g = scale_down(f, exponent);
        while g >= 10.0 {
            g /= 10.0;
            exponent += 1;
        }
        while g < 1.0 {
            g *= 10.0;
            exponent -= 1;
        }

        whole = g as u64;
        part = ((g - whole as f64) * multiplier as f64 + 0.5) as u64;
        if part >= multiplier {
            whole += 1;
            part -= multiplier;
        }
        if whole >= 10 {
            whole /= 10;
            exponent += 1;
        }
    }

    if digits == 0 {
        let _ = write!(out, "{whole}E{exponent:+}");
    } else {
        let _ = write!(
            out,
            "{whole}.{part:0width$}E{exponent:+}",
            width = digits as usize
        );
    }
    out
}

/// `f / 10^exponent`, split in two steps so tiny values do not overflow the divisor.
fn scale_down(f: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        f / 10f64.powi(exponent)
    } else {
        let half = -exponent / 2;
        f * 10f64.powi(half) * 10f64.powi(-exponent - half)
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    fn render<T: ToArgument + ?Sized>(value: &T) -> Vec<u8> {
        let seps = Separators::default();
        let mut buf = BytesMut::new();
        value.write_argument(&mut EscapedWriter::new(&mut buf, &seps));
        buf.to_vec()
    }

    #[test]
    fn numbers_render_as_decimal_text() {
        assert_eq!(render(&42i32), b"42");
        assert_eq!(render(&-7i16), b"-7");
        assert_eq!(render(&255u8), b"255");
        assert_eq!(render(&2.5f64), b"2.5");
        assert_eq!(render(&true), b"1");
        assert_eq!(render(&false), b"0");
    }

    #[test]
    fn text_is_escaped() {
        assert_eq!(render("a,b"), b"a/,b");
        assert_eq!(render(&String::from("x;y/z")), b"x/;y//z");
        assert_eq!(render(&b"\0"[..]), b"/\0");
        assert_eq!(render(&format_args!("{},{}", 1, 2)), b"1/,2");
    }

    #[test]
    fn fixed_precision() {
        assert_eq!(render(&Fixed(3.14159, 2)), b"3.14");
        assert_eq!(render(&Fixed(2.0, 0)), b"2");
    }

    #[test]
    fn scientific_basic() {
        assert_eq!(format_scientific(1250.0, 2), "1.25E+3");
        assert_eq!(format_scientific(-2.5, 1), "-2.5E+0");
        assert_eq!(format_scientific(0.015625, 3), "1.563E-2");
        assert_eq!(format_scientific(0.0, 6), "0.000000E+0");
    }

    #[test]
    fn scientific_rounding_carries() {
        assert_eq!(format_scientific(9.9999, 2), "1.00E+1");
        assert_eq!(format_scientific(1.96, 1), "2.0E+0");
    }

    #[test]
    fn scientific_digit_limits() {
        assert_eq!(format_scientific(1250.0, 0), "1E+3");
        assert_eq!(format_scientific(1.5, 12), "1.500000E+0");
    }

    #[test]
    fn scientific_special_values() {
        assert_eq!(format_scientific(f64::INFINITY, 3), "INF");
        assert_eq!(format_scientific(f64::NEG_INFINITY, 3), "-INF");
        assert_eq!(format_scientific(f64::NAN, 3), "NaN");
    }

    #[test]
    fn scientific_extremes_stay_finite() {
        let tiny = format_scientific(f64::MIN_POSITIVE, 2);
        assert!(tiny.ends_with("E-308"), "{tiny}");
        let huge = format_scientific(f64::MAX, 2);
        assert!(huge.starts_with("1.80E+308"), "{huge}");
    }

    #[test]
    fn scientific_parses_back() {
        let text = format_scientific(-6.02e23, 4);
        assert_eq!(text, "-6.0200E+23");
        let back = crate::args::parse_float_prefix(text.as_bytes()).unwrap();
        assert!((back - -6.02e23).abs() / 6.02e23 < 1e-4);
    }
}
