use serde::{Deserialize, Serialize};
use uqp_core::{ErrorInfo, UqpError};

/// Signed contribution of one argument to a propagated uncertainty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionEntry {
    /// Parameter name, or `#<index>` for positional arguments.
    pub parameter: String,
    /// Signed change of the result at the argument's upper bound.
    pub contribution: f64,
    /// Fraction of the total removed when this argument is left out.
    pub relative_share: f64,
}

/// Breakdown of a propagated result, contributions sorted by magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationReport {
    /// Nominal result.
    pub nominal: f64,
    /// Total uncertainty.
    pub uncertainty: f64,
    /// Unit symbol of the result.
    pub unit: String,
    /// Per-argument contributions.
    pub contributions: Vec<ContributionEntry>,
}

impl PropagationReport {
    /// Largest contribution by magnitude.
    pub fn dominant(&self) -> Option<&ContributionEntry> {
        self.contributions.first()
    }

    /// Serializes to JSON.
    pub fn to_json(&self) -> Result<String, UqpError> {
        serde_json::to_string(self).map_err(|err| {
            UqpError::Parse(ErrorInfo::new("serialize", err.to_string()))
        })
    }
}

/// Rendered nominal, uncertainty and unit of a measurement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementSummary {
    /// Nominal magnitude.
    pub nominal: String,
    /// Uncertainty magnitude.
    pub uncertainty: String,
    /// Unit symbol.
    pub unit: String,
}
