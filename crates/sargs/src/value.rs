//! Conversions from flag value strings to numbers.

use std::str::FromStr;

use crate::error::{Error, Result};

/// Parse an integer the way C's `strtol(.., 0)` picks a base: `0x`/`0X` is
/// hexadecimal, a leading `0` is octal, anything else decimal. A leading sign
/// is accepted; the value must then fit `T`.
pub(crate) fn parse_integer<T>(raw: &str, target: &'static str) -> Result<T>
where
    T: TryFrom<i128>,
{
    let invalid = || Error::InvalidValue {
        value: raw.to_string(),
        target,
    };
    let out_of_range = || Error::OutOfRange {
        value: raw.to_string(),
        target,
    };

    let text = raw.trim();
    let (negative, unsigned) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (radix, digits) = if let Some(hex) = unsigned
        .strip_prefix("0x")
        .or_else(|| unsigned.strip_prefix("0X"))
    {
        (16, hex)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, &unsigned[1..])
    } else {
        (10, unsigned)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(invalid());
    }

    let magnitude = u128::from_str_radix(digits, radix).map_err(|_| out_of_range())?;
    let magnitude = i128::try_from(magnitude).map_err(|_| out_of_range())?;
    let value = if negative { -magnitude } else { magnitude };
    T::try_from(value).map_err(|_| out_of_range())
}

/// Floating point types accepted by the float accessors.
pub(crate) trait FloatValue: FromStr + Copy {
    fn is_infinite(self) -> bool;
}

impl FloatValue for f32 {
    fn is_infinite(self) -> bool {
        f32::is_infinite(self)
    }
}

impl FloatValue for f64 {
    fn is_infinite(self) -> bool {
        f64::is_infinite(self)
    }
}

/// Parse a float. Finite input that overflows `T` is a range error; an
/// explicit `inf` is accepted.
pub(crate) fn parse_float<T: FloatValue>(raw: &str, target: &'static str) -> Result<T> {
    let text = raw.trim();
    let value: T = text.parse().map_err(|_| Error::InvalidValue {
        value: raw.to_string(),
        target,
    })?;
    if value.is_infinite() && !text.to_ascii_lowercase().contains("inf") {
        return Err(Error::OutOfRange {
            value: raw.to_string(),
            target,
        });
    }
    Ok(value)
}
