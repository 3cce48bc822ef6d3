//! Exact Fixed-Point Decimal
//!
//! The wire DECIMAL is a 16-byte sign-magnitude integer carrying
//! `value x 10^12`: the top bit of byte 0 is the sign, the rest of the field
//! is the unsigned magnitude, and the all-but-sign-zero pattern
//! (`0x80 00 .. 00`) is the NULL sentinel. Values are kept as a native
//! 128-bit unscaled integer plus a scale, so encode/decode never touches
//! binary floating point.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::error::{VoltResult, WireError};
use super::types::{
    DEFAULT_DECIMAL_SCALE, MAX_DECIMAL_PRECISION, MAX_DECIMAL_WHOLE_DIGITS, NULL_DECIMAL_INDICATOR,
};

/// An exact decimal: `unscaled x 10^-scale`.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    unscaled: i128,
    scale: u32,
}

impl Decimal {
    pub fn new(unscaled: i128, scale: u32) -> Self {
        Self { unscaled, scale }
    }

    pub fn from_i64(v: i64) -> Self {
        Self {
            unscaled: v as i128,
            scale: 0,
        }
    }

    pub fn unscaled(&self) -> i128 {
        self.unscaled
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn is_negative(&self) -> bool {
        self.unscaled < 0
    }

    fn digit_count(mut magnitude: u128) -> u32 {
        if magnitude == 0 {
            return 1;
        }
        let mut digits = 0;
        while magnitude > 0 {
            magnitude /= 10;
            digits += 1;
        }
        digits
    }

    /// Limits enforced on the text form: at most 12 fractional digits and 38
    /// significant digits in total.
    pub(crate) fn check_string_limits(&self) -> VoltResult<()> {
        if self.scale > DEFAULT_DECIMAL_SCALE {
            return Err(WireError::Domain(format!(
                "scale of this decimal is {} and the max is {}",
                self.scale, DEFAULT_DECIMAL_SCALE
            )));
        }
        let precision = Self::digit_count(self.unscaled.unsigned_abs());
        if precision > MAX_DECIMAL_PRECISION {
            return Err(WireError::Domain(format!(
                "precision of this decimal is {precision} and the max is {MAX_DECIMAL_PRECISION}"
            )));
        }
        Ok(())
    }

    /// Encode as the 16-byte wire form.
    ///
    /// The unscaled value is brought to scale 12 and its magnitude serialized
    /// big-endian across the low 127 bits of the field; the top bit of byte 0
    /// carries the sign alone.
    pub(crate) fn to_wire_bytes(&self) -> VoltResult<[u8; 16]> {
        if self.scale > DEFAULT_DECIMAL_SCALE {
            return Err(WireError::Domain(format!(
                "scale of this decimal is {} and the max is {}",
                self.scale, DEFAULT_DECIMAL_SCALE
            )));
        }
        let precision = Self::digit_count(self.unscaled.unsigned_abs());
        let whole_digits = precision as i64 - self.scale as i64;
        if whole_digits > MAX_DECIMAL_WHOLE_DIGITS as i64 {
            return Err(WireError::Domain(format!(
                "{whole_digits} digits left of the decimal point and the max is {MAX_DECIMAL_WHOLE_DIGITS}"
            )));
        }
        let factor = 10i128.pow(DEFAULT_DECIMAL_SCALE - self.scale);
        let scaled = self.unscaled.checked_mul(factor).ok_or_else(|| {
            WireError::Domain("decimal magnitude does not fit the wire format".to_string())
        })?;
        let magnitude = scaled.unsigned_abs();
        // the magnitude may not reach into the sign bit; this also keeps any
        // legal value distinct from the NULL sentinel
        if magnitude >> 127 != 0 {
            return Err(WireError::Domain(
                "decimal magnitude does not fit the wire format".to_string(),
            ));
        }
        let mut out = magnitude.to_be_bytes();
        if self.unscaled < 0 {
            out[0] |= 0x80;
        }
        Ok(out)
    }

    /// Decode the 16-byte wire form; the NULL sentinel yields `None`.
    ///
    /// Byte 0's low seven bits belong to the magnitude and must survive the
    /// sign-bit mask.
    pub(crate) fn from_wire_bytes(raw: &[u8; 16]) -> VoltResult<Option<Decimal>> {
        if raw == &NULL_DECIMAL_INDICATOR {
            return Ok(None);
        }
        let negative = raw[0] & 0x80 != 0;
        let mut magnitude_bytes = *raw;
        magnitude_bytes[0] &= 0x7F;
        let magnitude = u128::from_be_bytes(magnitude_bytes);
        let unscaled = if negative {
            -(magnitude as i128)
        } else {
            magnitude as i128
        };
        Ok(Some(Decimal::new(unscaled, DEFAULT_DECIMAL_SCALE)))
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        if self.scale == other.scale {
            return self.unscaled == other.unscaled;
        }
        // compare at the larger scale; an overflow there means the rescaled
        // magnitude exceeds anything the other side can hold
        let (small, large) = if self.scale < other.scale {
            (self, other)
        } else {
            (other, self)
        };
        match small
            .unscaled
            .checked_mul(10i128.pow(large.scale - small.scale))
        {
            Some(rescaled) => rescaled == large.unscaled,
            None => false,
        }
    }
}

impl Eq for Decimal {}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.unscaled);
        }
        let magnitude = self.unscaled.unsigned_abs();
        let pow = 10u128.pow(self.scale);
        let whole = magnitude / pow;
        let frac = magnitude % pow;
        let sign = if self.unscaled < 0 { "-" } else { "" };
        write!(f, "{sign}{whole}.{frac:0width$}", width = self.scale as usize)
    }
}

/// Failure to parse a decimal literal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid decimal literal: {reason}")]
pub struct ParseDecimalError {
    reason: &'static str,
}

impl ParseDecimalError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

impl FromStr for Decimal {
    type Err = ParseDecimalError;

    /// Accepts `[+|-]digits[.digits]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, rest) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, f),
            None => (rest, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(ParseDecimalError::new("no digits"));
        }
        if frac_part.len() > MAX_DECIMAL_PRECISION as usize {
            return Err(ParseDecimalError::new("too many fractional digits"));
        }
        let mut unscaled: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            let digit = c
                .to_digit(10)
                .ok_or_else(|| ParseDecimalError::new("unexpected character"))?;
            unscaled = unscaled
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit as i128))
                .ok_or_else(|| ParseDecimalError::new("magnitude overflows 128 bits"))?;
        }
        if negative {
            unscaled = -unscaled;
        }
        Ok(Decimal::new(unscaled, frac_part.len() as u32))
    }
}
