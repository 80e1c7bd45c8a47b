use tracing::debug;
use uqp_core::{ErrorInfo, Numeric, UqpError};
use uqp_units::Quantity;

use crate::convention::UncertaintyConvention;
use crate::operand::Operand;
use crate::uncertain::UncertainQuantity;

impl<N: Numeric> UncertaintyConvention<N> {
    /// Mean of `samples` with the standard error of the mean as uncertainty.
    ///
    /// Uses the unbiased (N - 1) standard deviation, so at least two samples
    /// are required. Samples are expressed in the unit of the first one.
    pub fn calc_uncertain_quantity(
        &self,
        samples: &[Quantity<N>],
    ) -> Result<UncertainQuantity<N>, UqpError> {
        let Some(first) = samples.first() else {
            return Err(too_few_samples(0));
        };
        if samples.len() < 2 {
            return Err(too_few_samples(samples.len()));
        }
        let unit = first.unit().clone();
        let mut values = Vec::with_capacity(samples.len());
        for sample in samples {
            values.push(sample.to(&unit)?.into_magnitude());
        }

        let count = N::from_i64(values.len() as i64);
        let mean = values
            .iter()
            .fold(N::zero(), |acc, value| acc + value.clone())
            / count.clone();
        let squares = values.iter().fold(N::zero(), |acc, value| {
            let deviation = value.clone() - mean.clone();
            acc + deviation.clone() * deviation
        });
        let variance = squares / (count.clone() - N::one());
        let standard_error = variance.sqrt()? / count.sqrt()?;
        debug!(samples = values.len(), mean = %mean, standard_error = %standard_error, "estimated from samples");

        self.uncertain(
            Quantity::new(mean, unit.clone()),
            Quantity::new(standard_error, unit.delta()),
        )
    }

    /// [`UncertaintyConvention::calc_uncertain_quantity`] followed by `normalize`.
    pub fn calc_uncertain_quantity_rounded(
        &self,
        samples: &[Quantity<N>],
    ) -> Result<UncertainQuantity<N>, UqpError> {
        let mut estimate = self.calc_uncertain_quantity(samples)?;
        estimate.normalize(None)?;
        Ok(estimate)
    }

    /// `(nominal(a) - nominal(b)) / sqrt(unc(a)^2 + unc(b)^2)`.
    ///
    /// A zero denominator gives 0 for equal nominals and an infinity of the
    /// difference's sign otherwise.
    pub fn z_score(&self, a: &Operand<N>, b: &Operand<N>) -> Result<f64, UqpError> {
        let difference = a.nominal().checked_sub(b.nominal())?;
        let delta_unit = difference.unit().clone();
        let spread_a = a.uncertainty().to(&delta_unit)?.into_magnitude().to_f64();
        let spread_b = b.uncertainty().to(&delta_unit)?.into_magnitude().to_f64();
        let difference = difference.into_magnitude().to_f64();
        let denominator = spread_a.hypot(spread_b);
        if denominator == 0.0 {
            return Ok(if difference == 0.0 {
                0.0
            } else {
                f64::INFINITY.copysign(difference)
            });
        }
        Ok(difference / denominator)
    }

    /// `|z| <= agreement_threshold`.
    pub fn consistent(&self, a: &Operand<N>, b: &Operand<N>) -> Result<bool, UqpError> {
        Ok(self.z_score(a, b)?.abs() <= self.config().agreement_threshold)
    }

    /// `z < -agreement_threshold`.
    pub fn significantly_less(&self, a: &Operand<N>, b: &Operand<N>) -> Result<bool, UqpError> {
        Ok(self.z_score(a, b)? < -self.config().agreement_threshold)
    }

    /// `z > agreement_threshold`.
    pub fn significantly_greater(&self, a: &Operand<N>, b: &Operand<N>) -> Result<bool, UqpError> {
        Ok(self.z_score(a, b)? > self.config().agreement_threshold)
    }

    /// `(measured - actual) / actual * 100` on nominal values.
    pub fn percent_error(&self, actual: &Operand<N>, measured: &Operand<N>) -> Result<f64, UqpError> {
        let actual_value = actual.nominal().magnitude().to_f64();
        if actual_value == 0.0 {
            return Err(UqpError::Numeric(ErrorInfo::new(
                "zero-reference",
                "percent error against a zero reference value",
            )));
        }
        let measured_value = measured
            .nominal()
            .to(actual.nominal().unit())?
            .into_magnitude()
            .to_f64();
        Ok((measured_value - actual_value) / actual_value * 100.0)
    }
}

fn too_few_samples(count: usize) -> UqpError {
    UqpError::Arguments(
        ErrorInfo::new(
            "too-few-samples",
            format!("need at least two samples, got {count}"),
        )
        .with_hint("the standard error of one sample is undefined"),
    )
}
