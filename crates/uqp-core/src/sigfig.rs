//! Significant-figure rounding on exact decimal digits.
//!
//! Values are rounded through their decimal rendering rather than through
//! binary scaling, so `0.01501` keeps two significant figures as `0.015`
//! without accumulating representation error. Ties round half away from
//! zero.

use crate::errors::UqpError;
use crate::numeric::Numeric;

/// Sign, digit string and decimal exponent of a finite value.
///
/// The value equals `d0.d1d2... x 10^exponent`. Leading and trailing zeros are
/// stripped, so zero is represented by an empty digit list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecimalDigits {
    negative: bool,
    digits: Vec<u8>,
    exponent: i32,
}

impl DecimalDigits {
    fn zero() -> Self {
        Self {
            negative: false,
            digits: Vec::new(),
            exponent: 0,
        }
    }

    /// Parses a plain (`0.01501`) or scientific (`1.501e-2`) literal.
    ///
    /// Returns `None` for anything that is not a finite decimal literal, such
    /// as `inf` or `NaN`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, body) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (mantissa, shift) = match body.find(|c: char| c == 'e' || c == 'E') {
            Some(idx) => (&body[..idx], body[idx + 1..].parse::<i32>().ok()?),
            None => (body, 0),
        };
        let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return None;
        }

        let mut digits: Vec<u8> = int_part
            .bytes()
            .chain(frac_part.bytes())
            .map(|b| b - b'0')
            .collect();
        let leading = digits.iter().take_while(|d| **d == 0).count();
        digits.drain(..leading);
        while digits.last() == Some(&0) {
            digits.pop();
        }
        if digits.is_empty() {
            return Some(Self::zero());
        }
        let exponent = int_part.len() as i32 - 1 + shift - leading as i32;
        Some(Self {
            negative,
            digits,
            exponent,
        })
    }

    /// Reads the digits of a numeric value, `None` when it is not finite.
    pub fn of<N: Numeric>(value: &N) -> Option<Self> {
        Self::parse(&value.to_decimal_string())
    }

    /// Decimal exponent of the first significant digit (zero for zero).
    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    /// Significant digits, most significant first.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Returns `true` when the value is zero.
    pub fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    /// Leading significant digit, zero for zero.
    pub fn leading_digit(&self) -> u8 {
        self.digits.first().copied().unwrap_or(0)
    }

    /// Rounds half away from zero so that no digit right of `position` survives.
    ///
    /// Positive positions count places right of the decimal point, so
    /// position `2` keeps hundredths and position `-1` keeps tens.
    pub fn round_at(&self, position: i32) -> Self {
        if self.is_zero() {
            return self.clone();
        }
        let keep = self.exponent + position + 1;
        if keep >= self.digits.len() as i32 {
            return self.clone();
        }
        if keep < 0 {
            return Self::zero();
        }

        let keep = keep as usize;
        let round_up = self.digits[keep] >= 5;
        let mut digits = self.digits[..keep].to_vec();
        let mut exponent = self.exponent;
        if round_up {
            let mut idx = digits.len();
            loop {
                if idx == 0 {
                    digits.insert(0, 1);
                    exponent += 1;
                    break;
                }
                idx -= 1;
                if digits[idx] == 9 {
                    digits[idx] = 0;
                } else {
                    digits[idx] += 1;
                    break;
                }
            }
        }
        while digits.last() == Some(&0) {
            digits.pop();
        }
        if digits.is_empty() {
            return Self::zero();
        }
        Self {
            negative: self.negative,
            digits,
            exponent,
        }
    }

    /// Scientific rendering accepted by every backend's `parse_decimal`.
    pub fn to_scientific(&self) -> String {
        if self.is_zero() {
            return "0".to_string();
        }
        let mut out = String::new();
        if self.negative {
            out.push('-');
        }
        out.push(char::from(b'0' + self.digits[0]));
        if self.digits.len() > 1 {
            out.push('.');
            out.extend(self.digits[1..].iter().map(|d| char::from(b'0' + d)));
        }
        out.push('e');
        out.push_str(&self.exponent.to_string());
        out
    }
}

/// Decimal position of the `n`-th significant digit of `value`.
///
/// Positions right of the decimal point are positive: the first significant
/// digit of `0.015` sits at position 2, that of `24.1` at position -1.
pub fn decimal_position_of_nth_sigfig<N: Numeric>(value: &N, n: i32) -> i32 {
    let exponent = DecimalDigits::of(value).map_or(0, |digits| digits.exponent());
    n - 1 - exponent
}

/// Rounds `value` to `n` significant figures. `n < 1` leaves it untouched.
///
/// Non-finite values are returned unchanged.
pub fn round_to_sigfigs<N: Numeric>(value: &N, n: i32) -> Result<N, UqpError> {
    if n < 1 {
        return Ok(value.clone());
    }
    let Some(digits) = DecimalDigits::of(value) else {
        return Ok(value.clone());
    };
    let position = n - 1 - digits.exponent();
    N::parse_decimal(&digits.round_at(position).to_scientific())
}

/// Quantizes `value` to the given decimal position.
pub fn round_at_decimal_position<N: Numeric>(value: &N, position: i32) -> Result<N, UqpError> {
    let Some(digits) = DecimalDigits::of(value) else {
        return Ok(value.clone());
    };
    N::parse_decimal(&digits.round_at(position).to_scientific())
}

/// Leading significant digit of `value`, zero for zero and non-finite values.
pub fn leading_digit<N: Numeric>(value: &N) -> u8 {
    DecimalDigits::of(value).map_or(0, |digits| digits.leading_digit())
}
