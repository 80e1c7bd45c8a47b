use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::rc::Rc;

use uqp_core::{
    decimal_position_of_nth_sigfig, leading_digit, round_at_decimal_position, round_to_sigfigs,
    ErrorInfo, Numeric, UqpError,
};
use uqp_units::{Quantity, Unit};

use crate::convention::{BinaryOp, UncertaintyConvention};
use crate::ids::QuantityId;
use crate::operand::Operand;
use crate::registry::SharedRegistry;
use crate::report::MeasurementSummary;

struct Identity {
    id: QuantityId,
    registry: Rc<SharedRegistry>,
}

impl Drop for Identity {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

/// A nominal value with an uncertainty, tracked by a correlation registry.
///
/// Clones share one identity and the registry entry is released when the
/// last clone is dropped. Arithmetic goes through the owning
/// [`UncertaintyConvention`], so every derived value records its correlation
/// with the inputs it came from.
pub struct UncertainQuantity<N: Numeric> {
    nominal: Quantity<N>,
    uncertainty: Quantity<N>,
    identity: Rc<Identity>,
    convention: UncertaintyConvention<N>,
}

impl<N: Numeric> Clone for UncertainQuantity<N> {
    fn clone(&self) -> Self {
        Self {
            nominal: self.nominal.clone(),
            uncertainty: self.uncertainty.clone(),
            identity: Rc::clone(&self.identity),
            convention: self.convention.clone(),
        }
    }
}

impl<N: Numeric> fmt::Debug for UncertainQuantity<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UncertainQuantity")
            .field("id", &self.identity.id)
            .field("nominal", &self.nominal)
            .field("uncertainty", &self.uncertainty)
            .finish()
    }
}

impl<N: Numeric> UncertainQuantity<N> {
    /// Registers a new identity for values that are already consistent.
    pub(crate) fn register(
        convention: &UncertaintyConvention<N>,
        nominal: Quantity<N>,
        uncertainty: Quantity<N>,
    ) -> Self {
        let registry = convention.registry_handle();
        let id = registry.write().register();
        Self {
            nominal,
            uncertainty,
            identity: Rc::new(Identity { id, registry }),
            convention: convention.clone(),
        }
    }

    /// Validates units and expresses the uncertainty in the nominal's delta unit.
    pub(crate) fn from_parts(
        convention: &UncertaintyConvention<N>,
        nominal: Quantity<N>,
        uncertainty: Quantity<N>,
    ) -> Result<Self, UqpError> {
        if !uncertainty.unit().is_compatible(nominal.unit()) {
            return Err(UqpError::Dimensionality(
                ErrorInfo::new(
                    "incompatible-uncertainty",
                    format!(
                        "uncertainty in '{}' does not match nominal in '{}'",
                        uncertainty.unit(),
                        nominal.unit()
                    ),
                )
                .with_hint("express the uncertainty in a unit of the same dimension"),
            ));
        }
        let uncertainty = uncertainty
            .as_difference()
            .to(&nominal.unit().delta())?
            .abs();
        Ok(Self::register(convention, nominal, uncertainty))
    }

    /// Nominal value.
    pub fn nominal(&self) -> &Quantity<N> {
        &self.nominal
    }

    /// Non-negative uncertainty in the delta companion of the nominal unit.
    pub fn uncertainty(&self) -> &Quantity<N> {
        &self.uncertainty
    }

    /// Unit of the nominal value.
    pub fn unit(&self) -> &Unit {
        self.nominal.unit()
    }

    /// Registry identity shared by all clones.
    pub fn id(&self) -> QuantityId {
        self.identity.id
    }

    /// Convention this quantity is bound to.
    pub fn convention(&self) -> &UncertaintyConvention<N> {
        &self.convention
    }

    /// `nominal + uncertainty`.
    pub fn upper(&self) -> Result<Quantity<N>, UqpError> {
        self.nominal.checked_add(&self.uncertainty)
    }

    /// `nominal - uncertainty`.
    pub fn lower(&self) -> Result<Quantity<N>, UqpError> {
        self.nominal.checked_sub(&self.uncertainty)
    }

    /// Full width of the interval, twice the uncertainty.
    pub fn interval(&self) -> Quantity<N> {
        self.uncertainty.scaled(&N::from_i64(2))
    }

    /// Uncertainty relative to the nominal value, as a pure number.
    pub fn relative_uncertainty(&self) -> Result<N, UqpError> {
        let nominal = self.nominal.to_base();
        if nominal.is_zero() {
            return Err(UqpError::Numeric(ErrorInfo::new(
                "zero-nominal",
                "relative uncertainty of a zero nominal value",
            )));
        }
        let uncertainty = self.uncertainty.to_base();
        Ok(uncertainty.into_magnitude() / nominal.into_magnitude().abs())
    }

    /// Records a correlation coefficient with `other`.
    pub fn correlated(&self, other: &UncertainQuantity<N>, r: f64) -> bool {
        self.convention.correlated(&self.into(), &other.into(), r)
    }

    /// Correlation coefficient with `other` (1 for the same identity, 0 when unrecorded).
    pub fn correlation(&self, other: &UncertainQuantity<N>) -> f64 {
        self.convention.correlation(&self.into(), &other.into())
    }

    /// Same values under a fresh identity with no recorded correlations.
    pub fn independent_copy(&self) -> Self {
        Self::register(
            &self.convention,
            self.nominal.clone(),
            self.uncertainty.clone(),
        )
    }

    /// Converted copy, correlated with `self` like any derived value.
    pub fn to(&self, target: &Unit) -> Result<Self, UqpError> {
        let target = target.clone();
        self.convention
            .unary(&self.into(), move |q: &Quantity<N>| q.to(&target))
    }

    /// Converts in place, keeping the identity.
    pub fn ito(&mut self, target: &Unit) -> Result<(), UqpError> {
        let nominal = self.nominal.to(target)?;
        let uncertainty = self.uncertainty.to(&target.delta())?;
        self.nominal = nominal;
        self.uncertainty = uncertainty;
        Ok(())
    }

    fn rounded_parts(&self, sigfigs: Option<usize>) -> Result<Option<(N, N)>, UqpError> {
        let uncertainty = self.uncertainty.magnitude();
        if uncertainty.is_zero() {
            return Ok(None);
        }
        let config = self.convention.config();
        let figures = match sigfigs {
            Some(0) => return Ok(None),
            Some(n) => n as i32,
            None => {
                let base = config.default_sigfigs as i32;
                let wide = round_to_sigfigs(uncertainty, base + 1)?;
                if config.widen_leading_one && leading_digit(&wide) == 1 {
                    base + 1
                } else {
                    base
                }
            }
        };
        let rounded = round_to_sigfigs(uncertainty, figures)?;
        let position = decimal_position_of_nth_sigfig(&rounded, figures);
        let nominal = round_at_decimal_position(self.nominal.magnitude(), position)?;
        Ok(Some((nominal, rounded)))
    }

    /// Rounds the uncertainty to `sigfigs` figures (the convention rule when
    /// `None`) and the nominal to the same decimal position, in place.
    ///
    /// A zero uncertainty leaves both values untouched.
    pub fn normalize(&mut self, sigfigs: Option<usize>) -> Result<(), UqpError> {
        if let Some((nominal, uncertainty)) = self.rounded_parts(sigfigs)? {
            self.nominal = Quantity::new(nominal, self.nominal.unit().clone());
            self.uncertainty = Quantity::new(uncertainty, self.uncertainty.unit().clone());
        }
        Ok(())
    }

    /// Normalized copy under a new identity fully correlated with `self`.
    pub fn rounded(&self, sigfigs: Option<usize>) -> Result<Self, UqpError> {
        let (nominal, uncertainty) = match self.rounded_parts(sigfigs)? {
            Some((nominal, uncertainty)) => (
                Quantity::new(nominal, self.nominal.unit().clone()),
                Quantity::new(uncertainty, self.uncertainty.unit().clone()),
            ),
            None => (self.nominal.clone(), self.uncertainty.clone()),
        };
        let copy = Self::register(&self.convention, nominal, uncertainty);
        copy.correlated(self, 1.0);
        Ok(copy)
    }

    /// Absolute value; correlated ±1 with `self` depending on the sign.
    pub fn abs(&self) -> Result<Self, UqpError> {
        self.convention
            .unary(&self.into(), |q: &Quantity<N>| Ok(q.abs()))
    }

    /// Integer power.
    pub fn powi(&self, exp: i32) -> Result<Self, UqpError> {
        self.convention
            .unary(&self.into(), move |q: &Quantity<N>| q.powi(exp))
    }

    /// Real power.
    pub fn powf(&self, exp: &N) -> Result<Self, UqpError> {
        let exp = exp.clone();
        self.convention
            .unary(&self.into(), move |q: &Quantity<N>| q.powf(&exp))
    }

    /// Square root.
    pub fn sqrt(&self) -> Result<Self, UqpError> {
        self.convention
            .unary(&self.into(), |q: &Quantity<N>| q.sqrt())
    }

    /// Sine; the nominal must be an angle.
    pub fn sin(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::sin)
    }

    /// Cosine; the nominal must be an angle.
    pub fn cos(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::cos)
    }

    /// Tangent; the nominal must be an angle.
    pub fn tan(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::tan)
    }

    /// Inverse sine in radians.
    pub fn asin(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::asin)
    }

    /// Inverse cosine in radians.
    pub fn acos(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::acos)
    }

    /// Inverse tangent in radians.
    pub fn atan(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::atan)
    }

    /// Natural exponential of a pure number.
    pub fn exp(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::exp)
    }

    /// Natural logarithm of a pure number.
    pub fn ln(&self) -> Result<Self, UqpError> {
        self.convention.unary(&self.into(), Quantity::ln)
    }

    /// Serializable snapshot of the rendered values.
    pub fn summary(&self) -> MeasurementSummary {
        MeasurementSummary {
            nominal: self.nominal.magnitude().to_string(),
            uncertainty: self.uncertainty.magnitude().to_string(),
            unit: self.nominal.unit().symbol().to_string(),
        }
    }
}

impl<N: Numeric> fmt::Display for UncertainQuantity<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} +/- {}",
            self.nominal.magnitude(),
            self.uncertainty.magnitude()
        )?;
        let symbol = self.nominal.unit().symbol();
        if !symbol.is_empty() {
            write!(f, " {symbol}")?;
        }
        Ok(())
    }
}

impl<'a, N: Numeric> Neg for &'a UncertainQuantity<N> {
    type Output = Result<UncertainQuantity<N>, UqpError>;

    fn neg(self) -> Self::Output {
        self.convention
            .unary(&self.into(), |q: &Quantity<N>| Ok(-q))
    }
}

impl<N: Numeric> Neg for UncertainQuantity<N> {
    type Output = Result<UncertainQuantity<N>, UqpError>;

    fn neg(self) -> Self::Output {
        -&self
    }
}

macro_rules! uncertain_ops {
    ($trait:ident, $method:ident, $op:expr) => {
        impl<'a, 'b, N: Numeric> $trait<&'b UncertainQuantity<N>> for &'a UncertainQuantity<N> {
            type Output = Result<UncertainQuantity<N>, UqpError>;

            fn $method(self, rhs: &'b UncertainQuantity<N>) -> Self::Output {
                self.convention.combine(&self.into(), &rhs.into(), $op)
            }
        }

        impl<N: Numeric> $trait<UncertainQuantity<N>> for UncertainQuantity<N> {
            type Output = Result<UncertainQuantity<N>, UqpError>;

            fn $method(self, rhs: UncertainQuantity<N>) -> Self::Output {
                self.convention.combine(&self.clone().into(), &rhs.into(), $op)
            }
        }

        impl<'a, 'b, N: Numeric> $trait<&'b Quantity<N>> for &'a UncertainQuantity<N> {
            type Output = Result<UncertainQuantity<N>, UqpError>;

            fn $method(self, rhs: &'b Quantity<N>) -> Self::Output {
                self.convention.combine(&self.into(), &rhs.into(), $op)
            }
        }

        impl<'a, 'b, N: Numeric> $trait<&'b UncertainQuantity<N>> for &'a Quantity<N> {
            type Output = Result<UncertainQuantity<N>, UqpError>;

            fn $method(self, rhs: &'b UncertainQuantity<N>) -> Self::Output {
                rhs.convention.combine(&self.into(), &rhs.into(), $op)
            }
        }

        impl<'a> $trait<f64> for &'a UncertainQuantity<f64> {
            type Output = Result<UncertainQuantity<f64>, UqpError>;

            fn $method(self, rhs: f64) -> Self::Output {
                self.convention
                    .combine(&self.into(), &Operand::scalar(rhs), $op)
            }
        }

        impl<'b> $trait<&'b UncertainQuantity<f64>> for f64 {
            type Output = Result<UncertainQuantity<f64>, UqpError>;

            fn $method(self, rhs: &'b UncertainQuantity<f64>) -> Self::Output {
                rhs.convention
                    .combine(&Operand::scalar(self), &rhs.into(), $op)
            }
        }
    };
}

uncertain_ops!(Add, add, BinaryOp::Add);
uncertain_ops!(Sub, sub, BinaryOp::Sub);
uncertain_ops!(Mul, mul, BinaryOp::Mul);
uncertain_ops!(Div, div, BinaryOp::Div);
