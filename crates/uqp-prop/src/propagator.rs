use tracing::trace;
use uqp_core::{Numeric, UqpError};
use uqp_units::Quantity;

use crate::operand::{Arguments, Operand, ParamKey};

/// Change of the result caused by perturbing one argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Contribution<N: Numeric> {
    /// Perturbed argument.
    pub key: ParamKey,
    /// Signed change of the result, in the delta unit of the nominal result.
    pub delta: Quantity<N>,
}

/// Nominal result plus one contribution per argument.
#[derive(Debug, Clone, PartialEq)]
pub struct Propagation<N: Numeric> {
    /// Result at the nominal arguments.
    pub nominal: Quantity<N>,
    /// Contributions in argument order (positional first).
    pub contributions: Vec<Contribution<N>>,
}

/// Computes per-argument contributions for a function of quantities.
pub trait ErrorPropagator<N: Numeric> {
    /// Evaluates `f` at the nominal arguments and derives one contribution per argument.
    fn propagate<F, E>(&self, f: F, args: &Arguments<Operand<N>>) -> Result<Propagation<N>, E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>;
}

/// One-sided finite differences at each argument's upper bound.
///
/// Each argument in turn is replaced by `nominal + uncertainty` while the
/// others stay nominal, so the contribution is `f(.., x_i + dx_i, ..) - f(..)`.
/// The function is called `1 + args.len()` times, exact arguments included.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpperBoundPropagator;

impl<N: Numeric> ErrorPropagator<N> for UpperBoundPropagator {
    fn propagate<F, E>(&self, f: F, args: &Arguments<Operand<N>>) -> Result<Propagation<N>, E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
    {
        let nominals = args.try_map(|operand| Ok::<_, UqpError>(operand.nominal().clone()))?;
        let nominal = f(&nominals)?;

        let mut contributions = Vec::with_capacity(args.len());
        for key in args.keys() {
            let Some(operand) = args.get(&key) else {
                continue;
            };
            let perturbed = nominals.replaced(&key, operand.upper()?);
            let shifted = f(&perturbed)?;
            let delta = shifted.checked_sub(&nominal)?;
            trace!(parameter = %key, delta = %delta, "evaluated upper bound");
            contributions.push(Contribution { key, delta });
        }
        Ok(Propagation {
            nominal,
            contributions,
        })
    }
}
