//! Numeric backends usable as quantity magnitudes.
//!
//! Propagation only needs field arithmetic plus a handful of transcendental
//! helpers. Significant-figure rounding goes through the decimal string
//! representation returned by [`Numeric::to_decimal_string`], so a backend
//! decides for itself how exactly its values are rendered.

use std::fmt::{Debug, Display};
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::errors::{ErrorInfo, UqpError};

/// Magnitude type carried by quantities.
pub trait Numeric:
    Clone
    + Debug
    + Display
    + PartialEq
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
{
    /// Additive identity.
    fn zero() -> Self;
    /// Multiplicative identity.
    fn one() -> Self;
    /// Converts a finite `f64` constant (unit scales, correlation coefficients).
    ///
    /// Backends without a representation for non-finite values saturate:
    /// NaN maps to zero and infinities map to the extreme finite values.
    fn from_f64(value: f64) -> Self;
    /// Converts an integer count.
    fn from_i64(value: i64) -> Self;
    /// Lossy conversion used for reports and statistical comparisons.
    fn to_f64(&self) -> f64;
    /// Absolute value.
    fn abs(&self) -> Self;
    /// Square root, failing for negative inputs.
    fn sqrt(&self) -> Result<Self, UqpError>;
    /// Integer power.
    fn powi(&self, exp: i32) -> Result<Self, UqpError>;
    /// Real power.
    fn powf(&self, exp: &Self) -> Result<Self, UqpError>;
    /// Sine of an angle in radians.
    fn sin(&self) -> Result<Self, UqpError>;
    /// Cosine of an angle in radians.
    fn cos(&self) -> Result<Self, UqpError>;
    /// Tangent of an angle in radians.
    fn tan(&self) -> Result<Self, UqpError>;
    /// Inverse sine in radians; the input must lie in `[-1, 1]`.
    fn asin(&self) -> Result<Self, UqpError>;
    /// Inverse cosine in radians; the input must lie in `[-1, 1]`.
    fn acos(&self) -> Result<Self, UqpError>;
    /// Inverse tangent in radians.
    fn atan(&self) -> Result<Self, UqpError>;
    /// Natural exponential.
    fn exp(&self) -> Result<Self, UqpError>;
    /// Natural logarithm of a positive value.
    fn ln(&self) -> Result<Self, UqpError>;
    /// Decimal rendering (plain or scientific) that parses back to the same value.
    fn to_decimal_string(&self) -> String;
    /// Parses a plain or scientific decimal literal.
    fn parse_decimal(text: &str) -> Result<Self, UqpError>;

    /// Returns `true` when the value equals [`Numeric::zero`].
    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Returns `true` when the value is strictly below zero.
    fn is_negative(&self) -> bool {
        *self < Self::zero()
    }
}

fn numeric_error(code: &str, message: impl Into<String>) -> UqpError {
    UqpError::Numeric(ErrorInfo::new(code, message))
}

fn domain_error(function: &str, value: impl Display) -> UqpError {
    UqpError::Numeric(
        ErrorInfo::new("domain", format!("{function} is undefined at {value}"))
            .with_context("function", function),
    )
}

fn literal_error(text: &str, reason: impl Display) -> UqpError {
    UqpError::Parse(
        ErrorInfo::new("invalid-number", format!("cannot parse '{text}' as a number"))
            .with_context("reason", reason.to_string()),
    )
}

macro_rules! float_numeric {
    ($float:ty) => {
        impl Numeric for $float {
            fn zero() -> Self {
                0.0
            }

            fn one() -> Self {
                1.0
            }

            fn from_f64(value: f64) -> Self {
                value as $float
            }

            fn from_i64(value: i64) -> Self {
                value as $float
            }

            fn to_f64(&self) -> f64 {
                f64::from(*self)
            }

            fn abs(&self) -> Self {
                <$float>::abs(*self)
            }

            fn sqrt(&self) -> Result<Self, UqpError> {
                if *self < 0.0 {
                    return Err(numeric_error(
                        "negative-sqrt",
                        format!("square root of negative value {self}"),
                    ));
                }
                Ok(<$float>::sqrt(*self))
            }

            fn powi(&self, exp: i32) -> Result<Self, UqpError> {
                Ok(<$float>::powi(*self, exp))
            }

            fn powf(&self, exp: &Self) -> Result<Self, UqpError> {
                let value = <$float>::powf(*self, *exp);
                if value.is_nan() && !self.is_nan() && !exp.is_nan() {
                    return Err(numeric_error(
                        "invalid-power",
                        format!("{self} raised to {exp} is not a real number"),
                    ));
                }
                Ok(value)
            }

            fn sin(&self) -> Result<Self, UqpError> {
                Ok(<$float>::sin(*self))
            }

            fn cos(&self) -> Result<Self, UqpError> {
                Ok(<$float>::cos(*self))
            }

            fn tan(&self) -> Result<Self, UqpError> {
                Ok(<$float>::tan(*self))
            }

            fn asin(&self) -> Result<Self, UqpError> {
                if <$float>::abs(*self) > 1.0 {
                    return Err(domain_error("asin", self));
                }
                Ok(<$float>::asin(*self))
            }

            fn acos(&self) -> Result<Self, UqpError> {
                if <$float>::abs(*self) > 1.0 {
                    return Err(domain_error("acos", self));
                }
                Ok(<$float>::acos(*self))
            }

            fn atan(&self) -> Result<Self, UqpError> {
                Ok(<$float>::atan(*self))
            }

            fn exp(&self) -> Result<Self, UqpError> {
                let value = <$float>::exp(*self);
                if value.is_infinite() && self.is_finite() {
                    return Err(numeric_error("overflow", format!("exp({self}) overflows")));
                }
                Ok(value)
            }

            fn ln(&self) -> Result<Self, UqpError> {
                if *self <= 0.0 {
                    return Err(domain_error("ln", self));
                }
                Ok(<$float>::ln(*self))
            }

            fn to_decimal_string(&self) -> String {
                // Shortest round-trip digits, so 0.015 renders as 1.5e-2 and not its binary expansion.
                format!("{self:e}")
            }

            fn parse_decimal(text: &str) -> Result<Self, UqpError> {
                text.trim()
                    .parse::<$float>()
                    .map_err(|err| literal_error(text, err))
            }
        }
    };
}

float_numeric!(f64);
float_numeric!(f32);

#[cfg(feature = "decimal")]
mod decimal_backend {
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    use rust_decimal::{Decimal, MathematicalOps};

    use super::{domain_error, literal_error, numeric_error, Numeric};
    use crate::errors::UqpError;

    fn checked(value: Option<Decimal>, function: &str, input: &Decimal) -> Result<Decimal, UqpError> {
        value.ok_or_else(|| domain_error(function, input))
    }

    // Taylor series, converges fast once |x| <= tan(pi/16).
    fn atan_series(x: Decimal) -> Decimal {
        let square = x * x;
        let mut power = x;
        let mut sum = x;
        for n in 1..100u32 {
            power = -power * square;
            let term = power / Decimal::from(2 * n + 1);
            if term.is_zero() {
                break;
            }
            sum += term;
        }
        sum
    }

    fn atan(x: Decimal) -> Result<Decimal, UqpError> {
        if Decimal::abs(&x) > Decimal::ONE {
            let inner = atan(Decimal::ONE / x)?;
            let quarter_turn = if x.is_sign_negative() {
                -Decimal::HALF_PI
            } else {
                Decimal::HALF_PI
            };
            return Ok(quarter_turn - inner);
        }
        // atan(x) = 2 atan(x / (1 + sqrt(1 + x^2)))
        let mut reduced = x;
        for _ in 0..2 {
            let root = checked(
                MathematicalOps::sqrt(&(Decimal::ONE + reduced * reduced)),
                "atan",
                &x,
            )?;
            reduced /= Decimal::ONE + root;
        }
        Ok(atan_series(reduced) * Decimal::from(4))
    }

    fn asin(x: Decimal) -> Result<Decimal, UqpError> {
        let magnitude = Decimal::abs(&x);
        if magnitude > Decimal::ONE {
            return Err(domain_error("asin", x));
        }
        if magnitude == Decimal::ONE {
            return Ok(if x.is_sign_negative() {
                -Decimal::HALF_PI
            } else {
                Decimal::HALF_PI
            });
        }
        let cosine = checked(MathematicalOps::sqrt(&(Decimal::ONE - x * x)), "asin", &x)?;
        atan(x / cosine)
    }

    impl Numeric for Decimal {
        fn zero() -> Self {
            Decimal::ZERO
        }

        fn one() -> Self {
            Decimal::ONE
        }

        fn from_f64(value: f64) -> Self {
            if value.is_nan() {
                return Decimal::ZERO;
            }
            <Decimal as FromPrimitive>::from_f64(value).unwrap_or(if value > 0.0 {
                Decimal::MAX
            } else {
                Decimal::MIN
            })
        }

        fn from_i64(value: i64) -> Self {
            Decimal::from(value)
        }

        fn to_f64(&self) -> f64 {
            <Decimal as ToPrimitive>::to_f64(self).unwrap_or(f64::NAN)
        }

        fn abs(&self) -> Self {
            Decimal::abs(self)
        }

        fn sqrt(&self) -> Result<Self, UqpError> {
            MathematicalOps::sqrt(self).ok_or_else(|| {
                numeric_error("negative-sqrt", format!("square root of negative value {self}"))
            })
        }

        fn powi(&self, exp: i32) -> Result<Self, UqpError> {
            MathematicalOps::checked_powi(self, i64::from(exp)).ok_or_else(|| {
                numeric_error("overflow", format!("{self} raised to {exp} overflows"))
            })
        }

        fn powf(&self, exp: &Self) -> Result<Self, UqpError> {
            MathematicalOps::checked_powd(self, *exp).ok_or_else(|| {
                numeric_error(
                    "invalid-power",
                    format!("{self} raised to {exp} is not representable"),
                )
            })
        }

        fn sin(&self) -> Result<Self, UqpError> {
            checked(MathematicalOps::checked_sin(self), "sin", self)
        }

        fn cos(&self) -> Result<Self, UqpError> {
            checked(MathematicalOps::checked_cos(self), "cos", self)
        }

        fn tan(&self) -> Result<Self, UqpError> {
            checked(MathematicalOps::checked_tan(self), "tan", self)
        }

        fn asin(&self) -> Result<Self, UqpError> {
            asin(*self)
        }

        fn acos(&self) -> Result<Self, UqpError> {
            Ok(Decimal::HALF_PI - asin(*self)?)
        }

        fn atan(&self) -> Result<Self, UqpError> {
            atan(*self)
        }

        fn exp(&self) -> Result<Self, UqpError> {
            MathematicalOps::checked_exp(self)
                .ok_or_else(|| numeric_error("overflow", format!("exp({self}) overflows")))
        }

        fn ln(&self) -> Result<Self, UqpError> {
            checked(MathematicalOps::checked_ln(self), "ln", self)
        }

        fn to_decimal_string(&self) -> String {
            self.normalize().to_string()
        }

        fn parse_decimal(text: &str) -> Result<Self, UqpError> {
            let trimmed = text.trim();
            let parsed = if trimmed.contains(|c: char| c == 'e' || c == 'E') {
                Decimal::from_scientific(trimmed)
            } else {
                trimmed.parse::<Decimal>()
            };
            parsed.map_err(|err| literal_error(text, err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "decimal")]
    #[test]
    fn decimal_inverse_trig_matches_f64() {
        use rust_decimal::Decimal;

        for value in [-2.5_f64, -1.0, -0.3, 0.0, 0.2, 0.5, 0.99, 3.0] {
            let x = <Decimal as Numeric>::from_f64(value);
            let atan = Numeric::atan(&x).unwrap().to_f64();
            assert!((atan - value.atan()).abs() < 1e-12, "atan({value})");
            if value.abs() <= 1.0 {
                let asin = Numeric::asin(&x).unwrap().to_f64();
                let acos = Numeric::acos(&x).unwrap().to_f64();
                assert!((asin - value.asin()).abs() < 1e-12, "asin({value})");
                assert!((acos - value.acos()).abs() < 1e-12, "acos({value})");
            }
        }
        assert!(Numeric::asin(&Decimal::TWO).is_err());
    }

    #[test]
    fn f64_rejects_negative_sqrt() {
        let err = Numeric::sqrt(&-4.0_f64).unwrap_err();
        assert_eq!(err.code(), "negative-sqrt");
        assert_eq!(Numeric::sqrt(&9.0_f64).unwrap(), 3.0);
    }

    #[test]
    fn f64_decimal_string_is_shortest() {
        assert_eq!(0.01501_f64.to_decimal_string(), "1.501e-2");
        assert_eq!(120.0_f64.to_decimal_string(), "1.2e2");
        assert_eq!(f64::parse_decimal(" 1.5e-2 ").unwrap(), 0.015);
    }

    #[test]
    fn f32_rounds_through_its_own_digits() {
        assert_eq!(0.1_f32.to_decimal_string(), "1e-1");
        assert_eq!(<f32 as Numeric>::from_i64(3), 3.0);
    }

    #[test]
    fn inverse_trig_checks_its_domain() {
        let err = Numeric::asin(&1.5_f64).unwrap_err();
        assert_eq!(err.family(), "Numeric");
        assert_eq!(err.code(), "domain");
        assert!(Numeric::ln(&0.0_f64).is_err());
        let half_pi = Numeric::acos(&0.0_f64).unwrap();
        assert!((half_pi - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
    }

    #[test]
    fn f64_parse_reports_literal() {
        let err = f64::parse_decimal("abc").unwrap_err();
        assert_eq!(err.family(), "Parse");
        assert_eq!(err.code(), "invalid-number");
    }
}
