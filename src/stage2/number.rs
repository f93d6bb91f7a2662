//! JSON number parsing.
//!
//! Numbers are classified per RFC 8259 grammar and materialized as one of
//! three tape representations: any number with a fraction or exponent
//! becomes a `d` double, negative integers become `l`, and non-negative
//! integers become `l` when they fit `i64` and `u` otherwise. Overflow in
//! either direction is an error rather than a silent fallback to a double.

use core::str;

use crate::error::Error;

/// A classified, materialized number.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum ParsedNumber {
    Int64(i64),
    UInt64(u64),
    Double(f64),
}

const fn terminator_table() -> [bool; 256] {
    let mut table = [false; 256];
    // NUL covers the zeroed padding at the end of the buffer
    table[0] = true;
    table[b' ' as usize] = true;
    table[b'\t' as usize] = true;
    table[b'\n' as usize] = true;
    table[b'\r' as usize] = true;
    table[b'{' as usize] = true;
    table[b'}' as usize] = true;
    table[b'[' as usize] = true;
    table[b']' as usize] = true;
    table[b',' as usize] = true;
    table[b':' as usize] = true;
    table
}

/// Bytes that legally follow a number, literal, or other scalar token.
const TERMINATOR: [bool; 256] = terminator_table();

#[inline]
pub(crate) fn is_terminator(byte: u8) -> bool {
    TERMINATOR[byte as usize]
}

/// Parse the number starting at `offset`.
///
/// `buf` is the padded backing storage, so a terminator byte is always
/// reachable before the end of the slice.
pub(crate) fn parse_number(buf: &[u8], offset: usize) -> Result<ParsedNumber, Error> {
    let bytes = &buf[offset..];
    let mut i = 0;

    let negative = bytes[0] == b'-';
    if negative {
        i += 1;
    }

    let digits_start = i;
    while bytes[i].is_ascii_digit() {
        i += 1;
    }
    let digit_count = i - digits_start;
    if digit_count == 0 {
        // lone minus, leading plus, leading dot, or not a number at all
        return Err(Error::NumberError);
    }
    if bytes[digits_start] == b'0' && digit_count > 1 {
        return Err(Error::NumberError);
    }

    let mut is_double = false;
    if bytes[i] == b'.' {
        is_double = true;
        i += 1;
        let fraction_start = i;
        while bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == fraction_start {
            return Err(Error::NumberError);
        }
    }
    if bytes[i] == b'e' || bytes[i] == b'E' {
        is_double = true;
        i += 1;
        if bytes[i] == b'+' || bytes[i] == b'-' {
            i += 1;
        }
        let exponent_start = i;
        while bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exponent_start {
            return Err(Error::NumberError);
        }
    }
    if !is_terminator(bytes[i]) {
        return Err(Error::NumberError);
    }

    if is_double {
        let text = str::from_utf8(&bytes[..i]).map_err(|_| Error::NumberError)?;
        let value: f64 = text.parse().map_err(|_| Error::NumberError)?;
        if value.is_infinite() {
            return Err(Error::NumberError);
        }
        return Ok(ParsedNumber::Double(value));
    }

    let mut magnitude: u64 = 0;
    for &digit in &bytes[digits_start..i] {
        magnitude = magnitude
            .checked_mul(10)
            .and_then(|m| m.checked_add((digit - b'0') as u64))
            .ok_or(Error::NumberError)?;
    }

    if negative {
        const I64_MIN_MAGNITUDE: u64 = i64::MAX as u64 + 1;
        if magnitude > I64_MIN_MAGNITUDE {
            return Err(Error::NumberError);
        }
        if magnitude == I64_MIN_MAGNITUDE {
            return Ok(ParsedNumber::Int64(i64::MIN));
        }
        Ok(ParsedNumber::Int64(-(magnitude as i64)))
    } else if magnitude <= i64::MAX as u64 {
        Ok(ParsedNumber::Int64(magnitude as i64))
    } else {
        Ok(ParsedNumber::UInt64(magnitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::padded::PaddedBytes;

    fn parse(text: &str) -> Result<ParsedNumber, Error> {
        let padded = PaddedBytes::from(text);
        parse_number(padded.storage(), 0)
    }

    #[test]
    fn test_small_integers() {
        assert_eq!(parse("0"), Ok(ParsedNumber::Int64(0)));
        assert_eq!(parse("42"), Ok(ParsedNumber::Int64(42)));
        assert_eq!(parse("-17"), Ok(ParsedNumber::Int64(-17)));
        assert_eq!(parse("-0"), Ok(ParsedNumber::Int64(0)));
    }

    #[test]
    fn test_int64_boundaries() {
        assert_eq!(
            parse("9223372036854775807"),
            Ok(ParsedNumber::Int64(i64::MAX))
        );
        assert_eq!(
            parse("-9223372036854775808"),
            Ok(ParsedNumber::Int64(i64::MIN))
        );
        // one past i64::MAX becomes unsigned
        assert_eq!(
            parse("9223372036854775808"),
            Ok(ParsedNumber::UInt64(9_223_372_036_854_775_808))
        );
        assert_eq!(
            parse("18446744073709551615"),
            Ok(ParsedNumber::UInt64(u64::MAX))
        );
    }

    #[test]
    fn test_integer_overflow() {
        assert_eq!(parse("18446744073709551616"), Err(Error::NumberError));
        assert_eq!(parse("-9223372036854775809"), Err(Error::NumberError));
    }

    #[test]
    fn test_doubles() {
        assert_eq!(parse("2.5"), Ok(ParsedNumber::Double(2.5)));
        assert_eq!(parse("0.0e0"), Ok(ParsedNumber::Double(0.0)));
        assert_eq!(parse("-1.5e3"), Ok(ParsedNumber::Double(-1500.0)));
        assert_eq!(parse("1E+2"), Ok(ParsedNumber::Double(100.0)));
        assert_eq!(parse("1e-2"), Ok(ParsedNumber::Double(0.01)));
    }

    #[test]
    fn test_double_round_to_nearest() {
        // nearest representable double to the literal
        assert_eq!(parse("0.1"), Ok(ParsedNumber::Double(0.1)));
        assert_eq!(
            parse("2.2250738585072014e-308"),
            Ok(ParsedNumber::Double(2.2250738585072014e-308))
        );
    }

    #[test]
    fn test_huge_exponent_rejected() {
        assert_eq!(parse("1e400"), Err(Error::NumberError));
        assert_eq!(parse("-1e400"), Err(Error::NumberError));
    }

    #[test]
    fn test_tiny_exponent_underflows_to_zero() {
        assert_eq!(parse("1e-400"), Ok(ParsedNumber::Double(0.0)));
    }

    #[test]
    fn test_leading_zeros_rejected() {
        assert_eq!(parse("01"), Err(Error::NumberError));
        assert_eq!(parse("-01"), Err(Error::NumberError));
        assert_eq!(parse("007"), Err(Error::NumberError));
        // a single zero with a fraction is fine
        assert_eq!(parse("0.5"), Ok(ParsedNumber::Double(0.5)));
    }

    #[test]
    fn test_malformed_numbers_rejected() {
        assert_eq!(parse("-"), Err(Error::NumberError));
        assert_eq!(parse("+1"), Err(Error::NumberError));
        assert_eq!(parse("1."), Err(Error::NumberError));
        assert_eq!(parse(".5"), Err(Error::NumberError));
        assert_eq!(parse("1e"), Err(Error::NumberError));
        assert_eq!(parse("1e+"), Err(Error::NumberError));
        assert_eq!(parse("1.2.3"), Err(Error::NumberError));
        assert_eq!(parse("1x"), Err(Error::NumberError));
    }

    #[test]
    fn test_structural_terminators_accepted() {
        let padded = PaddedBytes::from("123,");
        assert_eq!(
            parse_number(padded.storage(), 0),
            Ok(ParsedNumber::Int64(123))
        );
        let padded = PaddedBytes::from("[123]");
        assert_eq!(
            parse_number(padded.storage(), 1),
            Ok(ParsedNumber::Int64(123))
        );
    }

    #[test]
    fn test_negative_zero_double_keeps_sign() {
        match parse("-0.0") {
            Ok(ParsedNumber::Double(value)) => {
                assert_eq!(value, 0.0);
                assert!(value.is_sign_negative());
            }
            other => panic!("expected double, got {other:?}"),
        }
    }
}
