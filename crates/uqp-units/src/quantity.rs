//! Magnitudes paired with units.
//!
//! Conversions apply the affine map of both units. Addition and subtraction
//! follow the usual temperature rules: two absolute offset readings cannot be
//! added, and the difference of two absolute readings is a delta quantity.
//! Products and quotients first express offset readings on the absolute
//! SI scale.

use std::fmt;
use std::ops::{Div, Mul, Neg};

use uqp_core::{ErrorInfo, Numeric, UqpError};

use crate::parser::{parse_unit, split_number};
use crate::unit::Unit;

/// A magnitude expressed in a [`Unit`].
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity<N: Numeric> {
    magnitude: N,
    unit: Unit,
}

fn dimensionality_error(code: &str, message: String, lhs: &Unit, rhs: &Unit) -> UqpError {
    UqpError::Dimensionality(
        ErrorInfo::new(code, message)
            .with_context("lhs", format!("{} [{}]", lhs.symbol(), lhs.dimension()))
            .with_context("rhs", format!("{} [{}]", rhs.symbol(), rhs.dimension())),
    )
}

impl<N: Numeric> Quantity<N> {
    /// Creates a quantity.
    pub fn new(magnitude: N, unit: Unit) -> Self {
        Self { magnitude, unit }
    }

    /// Creates a pure number.
    pub fn dimensionless(magnitude: N) -> Self {
        Self::new(magnitude, Unit::dimensionless())
    }

    /// Parses `"<number> [unit expression]"`, e.g. `"9.81 m/s^2"`.
    pub fn parse(text: &str) -> Result<Self, UqpError> {
        let text = text.trim();
        let (number, rest) = split_number(text).ok_or_else(|| {
            UqpError::Parse(
                ErrorInfo::new("quantity", "expected a leading number")
                    .with_context("input", text),
            )
        })?;
        Ok(Self::new(N::parse_decimal(number)?, parse_unit(rest)?))
    }

    /// Magnitude in [`Quantity::unit`].
    pub fn magnitude(&self) -> &N {
        &self.magnitude
    }

    /// Consumes the quantity, returning its magnitude.
    pub fn into_magnitude(self) -> N {
        self.magnitude
    }

    /// Unit of the magnitude.
    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    /// Returns `true` when the magnitude is zero.
    pub fn is_zero(&self) -> bool {
        self.magnitude.is_zero()
    }

    fn magnitude_in(&self, target: &Unit) -> N {
        if self.unit.scale() == target.scale() && self.unit.offset() == target.offset() {
            return self.magnitude.clone();
        }
        let affine = !self.unit.is_delta()
            && !target.is_delta()
            && (self.unit.has_offset() || target.has_offset());
        if affine {
            let base = self.magnitude.clone() * N::from_f64(self.unit.scale())
                + N::from_f64(self.unit.offset());
            (base - N::from_f64(target.offset())) / N::from_f64(target.scale())
        } else {
            self.magnitude.clone() * N::from_f64(self.unit.scale() / target.scale())
        }
    }

    fn difference_in(&self, target: &Unit) -> N {
        if self.unit.scale() == target.scale() {
            return self.magnitude.clone();
        }
        self.magnitude.clone() * N::from_f64(self.unit.scale() / target.scale())
    }

    /// Converts to a compatible unit.
    pub fn to(&self, target: &Unit) -> Result<Self, UqpError> {
        if !self.unit.is_compatible(target) {
            return Err(dimensionality_error(
                "incompatible-units",
                format!("cannot convert '{}' to '{}'", self.unit, target),
                &self.unit,
                target,
            ));
        }
        let unit = if self.unit.is_delta() && target.has_offset() {
            target.delta()
        } else {
            target.clone()
        };
        Ok(Self::new(self.magnitude_in(target), unit))
    }

    /// Converts in place.
    pub fn ito(&mut self, target: &Unit) -> Result<(), UqpError> {
        *self = self.to(target)?;
        Ok(())
    }

    /// Expression in the coherent SI unit of the dimension.
    pub fn to_base(&self) -> Self {
        let base = Unit::base(self.unit.dimension());
        let unit = if self.unit.is_delta() {
            base.clone().as_delta()
        } else {
            base.clone()
        };
        Self::new(self.magnitude_in(&base), unit)
    }

    /// Reinterprets an absolute offset reading as a difference in the same scale.
    pub fn as_difference(&self) -> Self {
        if self.unit.is_absolute_offset() {
            Self::new(self.magnitude.clone(), self.unit.delta())
        } else {
            self.clone()
        }
    }

    fn to_absolute(&self) -> Self {
        if self.unit.is_absolute_offset() {
            self.to_base()
        } else {
            self.clone()
        }
    }

    fn ensure_compatible(&self, rhs: &Self, operation: &str) -> Result<(), UqpError> {
        if self.unit.is_compatible(&rhs.unit) {
            return Ok(());
        }
        Err(dimensionality_error(
            "incompatible-units",
            format!(
                "cannot {operation} '{}' and '{}'",
                self.unit.symbol(),
                rhs.unit.symbol()
            ),
            &self.unit,
            &rhs.unit,
        ))
    }

    /// Sum in the unit of `self`.
    pub fn checked_add(&self, rhs: &Self) -> Result<Self, UqpError> {
        self.ensure_compatible(rhs, "add")?;
        if self.unit.is_absolute_offset() && rhs.unit.is_absolute_offset() {
            return Err(dimensionality_error(
                "offset-addition",
                format!(
                    "ambiguous addition of absolute '{}' and '{}' readings",
                    self.unit.symbol(),
                    rhs.unit.symbol()
                ),
                &self.unit,
                &rhs.unit,
            ));
        }
        if !self.unit.is_absolute_offset() && rhs.unit.is_absolute_offset() {
            return rhs.checked_add(self);
        }
        let shifted = self.magnitude.clone() + rhs.difference_in(&self.unit);
        Ok(Self::new(shifted, self.unit.clone()))
    }

    /// Difference in the unit of `self`; absolute readings yield a delta unit.
    pub fn checked_sub(&self, rhs: &Self) -> Result<Self, UqpError> {
        self.ensure_compatible(rhs, "subtract")?;
        let both_readings = !self.unit.is_delta()
            && !rhs.unit.is_delta()
            && (self.unit.has_offset() || rhs.unit.has_offset());
        if both_readings {
            let difference = self.magnitude.clone() - rhs.magnitude_in(&self.unit);
            return Ok(Self::new(difference, self.unit.delta()));
        }
        if self.unit.is_delta() && rhs.unit.is_absolute_offset() {
            return Err(dimensionality_error(
                "offset-subtraction",
                format!(
                    "cannot subtract absolute '{}' from difference '{}'",
                    rhs.unit.symbol(),
                    self.unit.symbol()
                ),
                &self.unit,
                &rhs.unit,
            ));
        }
        let difference = self.magnitude.clone() - rhs.difference_in(&self.unit);
        Ok(Self::new(difference, self.unit.clone()))
    }

    /// Multiplies the magnitude by a pure number.
    pub fn scaled(&self, factor: &N) -> Self {
        let base = self.to_absolute();
        Self::new(base.magnitude * factor.clone(), base.unit)
    }

    /// Absolute value.
    pub fn abs(&self) -> Self {
        Self::new(self.magnitude.abs(), self.unit.clone())
    }

    /// Integer power.
    pub fn powi(&self, exp: i32) -> Result<Self, UqpError> {
        let base = self.to_absolute();
        Ok(Self::new(base.magnitude.powi(exp)?, base.unit.powi(exp)))
    }

    /// Real power; the unit must admit the exponent.
    pub fn powf(&self, exp: &N) -> Result<Self, UqpError> {
        let base = self.to_absolute();
        let unit = base.unit.powf(exp.to_f64()).ok_or_else(|| {
            UqpError::Dimensionality(
                ErrorInfo::new(
                    "fractional-dimension",
                    format!("'{}' cannot be raised to {exp}", base.unit.symbol()),
                )
                .with_context("dimension", base.unit.dimension().to_string()),
            )
        })?;
        Ok(Self::new(base.magnitude.powf(exp)?, unit))
    }

    fn pure_number(&self, function: &str) -> Result<N, UqpError> {
        if !self.unit.is_dimensionless() {
            return Err(UqpError::Dimensionality(
                ErrorInfo::new(
                    "not-dimensionless",
                    format!("{function} needs a pure number or angle, got '{}'", self.unit.symbol()),
                )
                .with_context("dimension", self.unit.dimension().to_string()),
            ));
        }
        Ok(self.to_base().into_magnitude())
    }

    fn dimensionless_function(
        &self,
        function: &str,
        op: impl FnOnce(&N) -> Result<N, UqpError>,
    ) -> Result<Self, UqpError> {
        let radians = self.pure_number(function)?;
        Ok(Self::dimensionless(op(&radians)?))
    }

    fn inverse_angle_function(
        &self,
        function: &str,
        op: impl FnOnce(&N) -> Result<N, UqpError>,
    ) -> Result<Self, UqpError> {
        let ratio = self.pure_number(function)?;
        Ok(Self::new(op(&ratio)?, Unit::parse("rad")?))
    }

    /// Sine of an angle in any angle unit.
    pub fn sin(&self) -> Result<Self, UqpError> {
        self.dimensionless_function("sin", N::sin)
    }

    /// Cosine of an angle in any angle unit.
    pub fn cos(&self) -> Result<Self, UqpError> {
        self.dimensionless_function("cos", N::cos)
    }

    /// Tangent of an angle in any angle unit.
    pub fn tan(&self) -> Result<Self, UqpError> {
        self.dimensionless_function("tan", N::tan)
    }

    /// Inverse sine, in radians.
    pub fn asin(&self) -> Result<Self, UqpError> {
        self.inverse_angle_function("asin", N::asin)
    }

    /// Inverse cosine, in radians.
    pub fn acos(&self) -> Result<Self, UqpError> {
        self.inverse_angle_function("acos", N::acos)
    }

    /// Inverse tangent, in radians.
    pub fn atan(&self) -> Result<Self, UqpError> {
        self.inverse_angle_function("atan", N::atan)
    }

    /// Natural exponential of a pure number.
    pub fn exp(&self) -> Result<Self, UqpError> {
        self.dimensionless_function("exp", N::exp)
    }

    /// Natural logarithm of a pure number.
    pub fn ln(&self) -> Result<Self, UqpError> {
        self.dimensionless_function("ln", N::ln)
    }

    /// Square root; every dimension exponent must be even.
    pub fn sqrt(&self) -> Result<Self, UqpError> {
        let base = self.to_absolute();
        let unit = base.unit.powf(0.5).ok_or_else(|| {
            UqpError::Dimensionality(
                ErrorInfo::new(
                    "fractional-dimension",
                    format!("square root of '{}'", base.unit.symbol()),
                )
                .with_context("dimension", base.unit.dimension().to_string()),
            )
        })?;
        Ok(Self::new(base.magnitude.sqrt()?, unit))
    }
}

impl<N: Numeric> Neg for Quantity<N> {
    type Output = Quantity<N>;

    fn neg(self) -> Quantity<N> {
        Quantity::new(-self.magnitude, self.unit)
    }
}

impl<'a, N: Numeric> Neg for &'a Quantity<N> {
    type Output = Quantity<N>;

    fn neg(self) -> Quantity<N> {
        Quantity::new(-self.magnitude.clone(), self.unit.clone())
    }
}

macro_rules! product_ops {
    ($trait:ident, $method:ident, $unit_op:ident) => {
        impl<'a, 'b, N: Numeric> $trait<&'b Quantity<N>> for &'a Quantity<N> {
            type Output = Quantity<N>;

            fn $method(self, rhs: &'b Quantity<N>) -> Quantity<N> {
                let lhs = self.to_absolute();
                let rhs = rhs.to_absolute();
                Quantity::new(
                    $trait::$method(lhs.magnitude, rhs.magnitude),
                    lhs.unit.$unit_op(&rhs.unit),
                )
            }
        }

        impl<N: Numeric> $trait<Quantity<N>> for Quantity<N> {
            type Output = Quantity<N>;

            fn $method(self, rhs: Quantity<N>) -> Quantity<N> {
                $trait::$method(&self, &rhs)
            }
        }

        impl<'b, N: Numeric> $trait<&'b Quantity<N>> for Quantity<N> {
            type Output = Quantity<N>;

            fn $method(self, rhs: &'b Quantity<N>) -> Quantity<N> {
                $trait::$method(&self, rhs)
            }
        }

        impl<'a, N: Numeric> $trait<Quantity<N>> for &'a Quantity<N> {
            type Output = Quantity<N>;

            fn $method(self, rhs: Quantity<N>) -> Quantity<N> {
                $trait::$method(self, &rhs)
            }
        }

        impl<'a> $trait<f64> for &'a Quantity<f64> {
            type Output = Quantity<f64>;

            fn $method(self, rhs: f64) -> Quantity<f64> {
                $trait::$method(self, &Quantity::dimensionless(rhs))
            }
        }

        impl $trait<f64> for Quantity<f64> {
            type Output = Quantity<f64>;

            fn $method(self, rhs: f64) -> Quantity<f64> {
                $trait::$method(&self, &Quantity::dimensionless(rhs))
            }
        }

        impl<'b> $trait<&'b Quantity<f64>> for f64 {
            type Output = Quantity<f64>;

            fn $method(self, rhs: &'b Quantity<f64>) -> Quantity<f64> {
                $trait::$method(&Quantity::dimensionless(self), rhs)
            }
        }

        impl $trait<Quantity<f64>> for f64 {
            type Output = Quantity<f64>;

            fn $method(self, rhs: Quantity<f64>) -> Quantity<f64> {
                $trait::$method(&Quantity::dimensionless(self), &rhs)
            }
        }
    };
}

product_ops!(Mul, mul, mul);
product_ops!(Div, div, div);

impl<N: Numeric> fmt::Display for Quantity<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.symbol().is_empty() {
            write!(f, "{}", self.magnitude)
        } else {
            write!(f, "{} {}", self.magnitude, self.unit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(text: &str) -> Quantity<f64> {
        Quantity::parse(text).unwrap()
    }

    #[test]
    fn converts_between_scales() {
        let length = q("1 cm").to(&Unit::parse("m").unwrap()).unwrap();
        assert!((length.magnitude() - 0.01).abs() < 1e-15);
        assert_eq!(length.unit().symbol(), "m");
    }

    #[test]
    fn affine_temperature_conversion() {
        let boiling = q("212 degF").to(&Unit::parse("K").unwrap()).unwrap();
        assert!((boiling.magnitude() - 373.15).abs() < 1e-9);
        let celsius = q("300 K").to(&Unit::parse("degC").unwrap()).unwrap();
        assert!((celsius.magnitude() - 26.85).abs() < 1e-9);
    }

    #[test]
    fn delta_conversion_ignores_offsets() {
        let step = q("1 delta_degC").to(&Unit::parse("degF").unwrap()).unwrap();
        assert!((step.magnitude() - 1.8).abs() < 1e-12);
        assert_eq!(step.unit().symbol(), "delta_degF");
    }

    #[test]
    fn readings_subtract_to_deltas() {
        let diff = q("30 degC").checked_sub(&q("20 degC")).unwrap();
        assert_eq!(*diff.magnitude(), 10.0);
        assert!(diff.unit().is_delta());
        let shifted = q("20 degC").checked_add(&diff).unwrap();
        assert_eq!(*shifted.magnitude(), 30.0);
        assert_eq!(shifted.unit().symbol(), "degC");
        assert_eq!(
            q("20 degC").checked_add(&q("5 degC")).unwrap_err().code(),
            "offset-addition"
        );
    }

    #[test]
    fn incompatible_addition_is_rejected() {
        let err = q("1 m").checked_add(&q("1 s")).unwrap_err();
        assert_eq!(err.family(), "Dimensionality");
        assert!(q("1 m").to(&Unit::parse("s").unwrap()).is_err());
    }

    #[test]
    fn products_compose_units() {
        let speed = q("65 mile") / q("1 hr");
        assert_eq!(speed.unit().symbol(), "mile/hr");
        let si = speed.to(&Unit::parse("m/s").unwrap()).unwrap();
        assert!((si.magnitude() - 29.0576).abs() < 1e-9);
        let doubled = &q("1.5 m") * 2.0;
        assert_eq!(*doubled.magnitude(), 3.0);
    }

    #[test]
    fn roots_need_even_dimensions() {
        let side = q("4 m^2").sqrt().unwrap();
        assert_eq!(*side.magnitude(), 2.0);
        assert_eq!(side.unit().dimension(), crate::Dimension::LENGTH);
        assert_eq!(q("4 m").sqrt().unwrap_err().code(), "fractional-dimension");
    }

    #[test]
    fn trig_takes_any_angle_unit() {
        let half = q("30 deg").sin().unwrap();
        assert!((half.magnitude() - 0.5).abs() < 1e-12);
        assert!(half.unit().is_dimensionless());
        let angle = q("0.5").asin().unwrap();
        assert_eq!(angle.unit().symbol(), "rad");
        assert!((angle.magnitude() - std::f64::consts::FRAC_PI_6).abs() < 1e-12);
        let err = q("1 m").cos().unwrap_err();
        assert_eq!(err.family(), "Dimensionality");
        assert_eq!(err.code(), "not-dimensionless");
        assert_eq!(q("2").asin().unwrap_err().code(), "domain");
    }
}
