use serde::{Deserialize, Serialize};
use uqp_core::{ErrorInfo, UqpError};

/// Rounding and comparison settings bound to an [`UncertaintyConvention`](crate::UncertaintyConvention).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConventionConfig {
    /// Significant figures kept on an uncertainty by `normalize`.
    #[serde(default = "default_sigfigs")]
    pub default_sigfigs: usize,
    /// Keep one extra figure when the rounded uncertainty starts with a 1.
    #[serde(default = "default_widen_leading_one")]
    pub widen_leading_one: bool,
    /// Figures assumed for exact arguments of auto-error wrapped functions.
    #[serde(default = "default_auto_error_sigfigs")]
    pub auto_error_sigfigs: usize,
    /// z-score beyond which two measurements disagree.
    #[serde(default = "default_agreement_threshold")]
    pub agreement_threshold: f64,
}

fn default_sigfigs() -> usize {
    1
}

fn default_widen_leading_one() -> bool {
    true
}

fn default_auto_error_sigfigs() -> usize {
    3
}

fn default_agreement_threshold() -> f64 {
    2.0
}

impl Default for ConventionConfig {
    fn default() -> Self {
        Self {
            default_sigfigs: default_sigfigs(),
            widen_leading_one: default_widen_leading_one(),
            auto_error_sigfigs: default_auto_error_sigfigs(),
            agreement_threshold: default_agreement_threshold(),
        }
    }
}

fn config_error(code: &str, message: impl Into<String>) -> UqpError {
    UqpError::Config(ErrorInfo::new(code, message))
}

impl ConventionConfig {
    /// Rejects settings the rounding and comparison rules cannot honour.
    pub fn validate(&self) -> Result<(), UqpError> {
        if self.default_sigfigs == 0 {
            return Err(config_error(
                "invalid-sigfigs",
                "default_sigfigs must be at least 1",
            ));
        }
        if self.auto_error_sigfigs == 0 {
            return Err(config_error(
                "invalid-sigfigs",
                "auto_error_sigfigs must be at least 1",
            ));
        }
        if !(self.agreement_threshold > 0.0 && self.agreement_threshold.is_finite()) {
            return Err(config_error(
                "invalid-threshold",
                format!(
                    "agreement_threshold must be positive and finite, got {}",
                    self.agreement_threshold
                ),
            ));
        }
        Ok(())
    }

    /// Parses and validates a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, UqpError> {
        let config: ConventionConfig = serde_json::from_str(text).map_err(|err| {
            UqpError::Config(
                ErrorInfo::new("invalid-json", "convention config is not valid JSON")
                    .with_context("reason", err.to_string()),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes to pretty JSON.
    pub fn to_json(&self) -> Result<String, UqpError> {
        serde_json::to_string_pretty(self)
            .map_err(|err| config_error("serialize", err.to_string()))
    }
}
