//! Runtime units: a symbol, a dimension and an affine map onto coherent SI.
//!
//! A magnitude `v` expressed in a unit corresponds to `v * scale + offset` in
//! the coherent SI unit of its dimension. Only absolute temperature scales
//! carry an offset; their delta companions share the scale without it.

use std::fmt;

use serde::{Deserialize, Serialize};
use uqp_core::UqpError;

use crate::dimension::Dimension;

/// A unit of measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    symbol: String,
    dimension: Dimension,
    scale: f64,
    #[serde(default)]
    offset: f64,
    #[serde(default)]
    delta: bool,
}

fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

fn needs_grouping(symbol: &str) -> bool {
    symbol.contains(&['*', '/', ' ', '^'][..])
}

fn grouped(symbol: &str) -> String {
    if needs_grouping(symbol) {
        format!("({symbol})")
    } else {
        symbol.to_string()
    }
}

impl Unit {
    /// Creates a multiplicative unit.
    pub fn new(symbol: impl Into<String>, dimension: Dimension, scale: f64) -> Self {
        Self {
            symbol: symbol.into(),
            dimension,
            scale,
            offset: 0.0,
            delta: false,
        }
    }

    /// Adds an additive offset (absolute temperature scales).
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    /// Marks the unit as a difference unit.
    pub fn as_delta(mut self) -> Self {
        self.offset = 0.0;
        self.delta = true;
        self
    }

    /// Replaces the display symbol.
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// The pure-number unit with an empty symbol.
    pub fn dimensionless() -> Self {
        Self::new("", Dimension::DIMENSIONLESS, 1.0)
    }

    /// Coherent SI unit of `dimension` (scale one, no offset).
    pub fn base(dimension: Dimension) -> Self {
        Self::new(dimension.base_symbol(), dimension, 1.0)
    }

    /// Parses a unit expression such as `m/s^2` or `J/(mol*K)`.
    pub fn parse(expr: &str) -> Result<Self, UqpError> {
        crate::parser::parse_unit(expr)
    }

    /// Display symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Physical dimension.
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    /// Multiplicative factor onto coherent SI.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Additive offset onto coherent SI.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Returns `true` for difference units such as `delta_degC`.
    pub fn is_delta(&self) -> bool {
        self.delta
    }

    /// Returns `true` for units whose zero is shifted from the SI zero.
    pub fn has_offset(&self) -> bool {
        self.offset != 0.0
    }

    /// Offset unit used as an absolute reading (`degC`, `degF`).
    pub fn is_absolute_offset(&self) -> bool {
        self.has_offset() && !self.delta
    }

    /// Returns `true` for pure numbers.
    pub fn is_dimensionless(&self) -> bool {
        self.dimension.is_dimensionless()
    }

    /// Returns `true` when both units measure the same dimension.
    pub fn is_compatible(&self, other: &Unit) -> bool {
        self.dimension == other.dimension
    }

    /// Magnitude-only companion: `delta_degC` for `degC`, the unit itself otherwise.
    pub fn delta(&self) -> Unit {
        if !self.has_offset() {
            return self.clone();
        }
        Unit {
            symbol: format!("delta_{}", self.symbol),
            dimension: self.dimension,
            scale: self.scale,
            offset: 0.0,
            delta: true,
        }
    }

    /// Unit of a product. Offsets never survive composition.
    pub fn mul(&self, other: &Unit) -> Unit {
        let symbol = match (self.symbol.is_empty(), other.symbol.is_empty()) {
            (true, _) => other.symbol.clone(),
            (false, true) => self.symbol.clone(),
            (false, false) => format!("{}*{}", self.symbol, grouped(&other.symbol)),
        };
        Unit::new(
            symbol,
            self.dimension.mul(&other.dimension),
            self.scale * other.scale,
        )
    }

    /// Unit of a quotient.
    pub fn div(&self, other: &Unit) -> Unit {
        let symbol = match (self.symbol.is_empty(), other.symbol.is_empty()) {
            (_, true) => self.symbol.clone(),
            (true, false) => format!("1/{}", grouped(&other.symbol)),
            (false, false) => format!("{}/{}", self.symbol, grouped(&other.symbol)),
        };
        Unit::new(
            symbol,
            self.dimension.div(&other.dimension),
            self.scale / other.scale,
        )
    }

    /// Unit raised to an integer power.
    pub fn powi(&self, exp: i32) -> Unit {
        if exp == 1 {
            return self.clone();
        }
        if exp == 0 || self.symbol.is_empty() {
            return Unit::new("", self.dimension.pow(exp), self.scale.powi(exp));
        }
        Unit::new(
            format!("{}^{exp}", grouped(&self.symbol)),
            self.dimension.pow(exp),
            self.scale.powi(exp),
        )
    }

    /// Unit raised to a real power, `None` when the dimension would become fractional.
    pub fn powf(&self, exp: f64) -> Option<Unit> {
        let dimension = self.dimension.powf(exp)?;
        let symbol = if self.symbol.is_empty() {
            String::new()
        } else {
            format!("{}^{exp}", grouped(&self.symbol))
        };
        Some(Unit::new(symbol, dimension, self.scale.powf(exp)))
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.dimension == other.dimension
            && approx_eq(self.scale, other.scale)
            && approx_eq(self.offset, other.offset)
    }
}

impl Default for Unit {
    fn default() -> Self {
        Unit::dimensionless()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_strips_offset() {
        let celsius = Unit::new("degC", Dimension::TEMPERATURE, 1.0).with_offset(273.15);
        let delta = celsius.delta();
        assert_eq!(delta.symbol(), "delta_degC");
        assert!(delta.is_delta());
        assert!(!delta.has_offset());
        assert!(celsius.is_absolute_offset());
    }

    #[test]
    fn composition_tracks_scale_and_symbol() {
        let km = Unit::new("km", Dimension::LENGTH, 1000.0);
        let hr = Unit::new("hr", Dimension::TIME, 3600.0);
        let speed = km.div(&hr);
        assert_eq!(speed.symbol(), "km/hr");
        assert!((speed.scale() - 1000.0 / 3600.0).abs() < 1e-15);
        assert_eq!(speed.mul(&hr).dimension(), Dimension::LENGTH);
        assert_eq!(Unit::dimensionless().div(&hr).symbol(), "1/hr");
    }

    #[test]
    fn powers_group_compound_symbols() {
        let speed = Unit::new("m/s", Dimension::LENGTH.div(&Dimension::TIME), 1.0);
        assert_eq!(speed.powi(2).symbol(), "(m/s)^2");
        assert!(Unit::new("m", Dimension::LENGTH, 1.0).powf(0.5).is_none());
    }
}
