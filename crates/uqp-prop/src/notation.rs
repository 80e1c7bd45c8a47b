use once_cell::sync::Lazy;
use regex::Regex;
use uqp_core::{ErrorInfo, Numeric, UqpError};
use uqp_units::{parse_unit, Quantity};

static COMPACT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<nominal>[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*(?P<nominal_unit>[^+±]*?)\s*(?:\+/-|±)\s*(?P<uncertainty>[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?)\s*(?P<percent>%)?\s*(?P<uncertainty_unit>.*?)\s*$",
    )
    .unwrap()
});

fn notation_error(text: &str, message: impl Into<String>) -> UqpError {
    UqpError::Parse(
        ErrorInfo::new("compact-notation", message)
            .with_context("input", text)
            .with_hint("expected '<nominal> [unit] +/- <uncertainty>[%] [unit]'"),
    )
}

/// Pieces of a compact measurement before unit resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactNotation {
    /// Nominal literal.
    pub nominal: String,
    /// Unit written after the nominal, if any.
    pub nominal_unit: Option<String>,
    /// Uncertainty literal.
    pub uncertainty: String,
    /// `true` when the uncertainty is a percentage of the nominal.
    pub relative: bool,
    /// Unit written after the uncertainty, if any.
    pub uncertainty_unit: Option<String>,
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Splits compact notation into its literals and unit expressions.
///
/// ```text
/// measurement := number [unit] ("+/-" | "±") number ["%"] [unit]
/// ```
///
/// Examples: `1.5 m +/- 1 cm`, `2.5 +/- 0.5 m`, `65 mile +/- 2%`,
/// `1 hr ± 5 min`. When only one side names a unit the other side inherits
/// it. A percent uncertainty is relative to the nominal value; a unit after
/// the `%` then belongs to the whole measurement and may not be combined
/// with a unit on the nominal side.
pub fn parse_compact(text: &str) -> Result<CompactNotation, UqpError> {
    let caps = COMPACT_REGEX
        .captures(text)
        .ok_or_else(|| notation_error(text, "not a compact measurement"))?;
    let notation = CompactNotation {
        nominal: caps["nominal"].to_string(),
        nominal_unit: non_empty(&caps["nominal_unit"]),
        uncertainty: caps["uncertainty"].to_string(),
        relative: caps.name("percent").is_some(),
        uncertainty_unit: non_empty(&caps["uncertainty_unit"]),
    };
    if notation.relative && notation.nominal_unit.is_some() && notation.uncertainty_unit.is_some()
    {
        return Err(notation_error(
            text,
            "a percent uncertainty cannot carry its own unit",
        ));
    }
    Ok(notation)
}

impl CompactNotation {
    /// Resolves the nominal and absolute uncertainty quantities.
    pub fn quantities<N: Numeric>(&self) -> Result<(Quantity<N>, Quantity<N>), UqpError> {
        let nominal_expr = self
            .nominal_unit
            .as_deref()
            .or(self.uncertainty_unit.as_deref())
            .unwrap_or("");
        let nominal = Quantity::new(N::parse_decimal(&self.nominal)?, parse_unit(nominal_expr)?);
        let amount = N::parse_decimal(&self.uncertainty)?;

        if self.relative {
            let fraction = amount / N::from_i64(100);
            let uncertainty = Quantity::new(
                nominal.magnitude().abs() * fraction,
                nominal.unit().delta(),
            );
            return Ok((nominal, uncertainty));
        }

        let uncertainty_expr = self
            .uncertainty_unit
            .as_deref()
            .or(self.nominal_unit.as_deref())
            .unwrap_or("");
        let uncertainty = Quantity::new(amount, parse_unit(uncertainty_expr)?);
        Ok((nominal, uncertainty))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_both_units() {
        let parsed = parse_compact("1.5 m +/- 1 cm").unwrap();
        assert_eq!(parsed.nominal, "1.5");
        assert_eq!(parsed.nominal_unit.as_deref(), Some("m"));
        assert_eq!(parsed.uncertainty, "1");
        assert_eq!(parsed.uncertainty_unit.as_deref(), Some("cm"));
        assert!(!parsed.relative);
    }

    #[test]
    fn accepts_plus_minus_sign_and_compound_units() {
        let parsed = parse_compact("-9.8 m/s^2 ± 0.2").unwrap();
        assert_eq!(parsed.nominal, "-9.8");
        assert_eq!(parsed.nominal_unit.as_deref(), Some("m/s^2"));
        assert_eq!(parsed.uncertainty_unit, None);
    }

    #[test]
    fn percent_marks_relative() {
        let parsed = parse_compact("2 m/s +/- 1%").unwrap();
        assert!(parsed.relative);
        assert_eq!(parsed.uncertainty_unit, None);
        assert!(parse_compact("2 m +/- 1% m").is_err());
    }

    #[test]
    fn rejects_missing_separator() {
        let err = parse_compact("1.5 m").unwrap_err();
        assert_eq!(err.code(), "compact-notation");
        assert!(parse_compact("m +/- 1").is_err());
    }
}
