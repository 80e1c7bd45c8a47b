//! Physical dimensions as exponent vectors over the seven SI base quantities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exponents of mass, length, time, current, temperature, amount and luminosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimension {
    /// Mass exponent [M].
    pub mass: i8,
    /// Length exponent [L].
    pub length: i8,
    /// Time exponent [T].
    pub time: i8,
    /// Electric current exponent [I].
    pub current: i8,
    /// Thermodynamic temperature exponent [Θ].
    pub temperature: i8,
    /// Amount of substance exponent [N].
    pub amount: i8,
    /// Luminous intensity exponent [J].
    pub luminosity: i8,
}

const BASE_SYMBOLS: [&str; 7] = ["kg", "m", "s", "A", "K", "mol", "cd"];
const DIMENSION_LETTERS: [&str; 7] = ["M", "L", "T", "I", "Θ", "N", "J"];

impl Dimension {
    /// Pure number.
    pub const DIMENSIONLESS: Self = Self::new(0, 0, 0, 0, 0, 0, 0);
    /// Mass [M].
    pub const MASS: Self = Self::new(1, 0, 0, 0, 0, 0, 0);
    /// Length [L].
    pub const LENGTH: Self = Self::new(0, 1, 0, 0, 0, 0, 0);
    /// Time [T].
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0, 0);
    /// Electric current [I].
    pub const CURRENT: Self = Self::new(0, 0, 0, 1, 0, 0, 0);
    /// Temperature [Θ].
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1, 0, 0);
    /// Amount of substance [N].
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 0, 1, 0);
    /// Luminous intensity [J].
    pub const LUMINOSITY: Self = Self::new(0, 0, 0, 0, 0, 0, 1);
    /// Volume [L³].
    pub const VOLUME: Self = Self::new(0, 3, 0, 0, 0, 0, 0);
    /// Frequency [T⁻¹].
    pub const FREQUENCY: Self = Self::new(0, 0, -1, 0, 0, 0, 0);
    /// Force [M L T⁻²].
    pub const FORCE: Self = Self::new(1, 1, -2, 0, 0, 0, 0);
    /// Energy [M L² T⁻²].
    pub const ENERGY: Self = Self::new(1, 2, -2, 0, 0, 0, 0);
    /// Power [M L² T⁻³].
    pub const POWER: Self = Self::new(1, 2, -3, 0, 0, 0, 0);
    /// Pressure [M L⁻¹ T⁻²].
    pub const PRESSURE: Self = Self::new(1, -1, -2, 0, 0, 0, 0);
    /// Electric charge [I T].
    pub const CHARGE: Self = Self::new(0, 0, 1, 1, 0, 0, 0);
    /// Voltage [M L² T⁻³ I⁻¹].
    pub const VOLTAGE: Self = Self::new(1, 2, -3, -1, 0, 0, 0);

    /// Creates a dimension from explicit exponents.
    pub const fn new(
        mass: i8,
        length: i8,
        time: i8,
        current: i8,
        temperature: i8,
        amount: i8,
        luminosity: i8,
    ) -> Self {
        Self {
            mass,
            length,
            time,
            current,
            temperature,
            amount,
            luminosity,
        }
    }

    /// Exponents in SI base order.
    pub const fn exponents(&self) -> [i8; 7] {
        [
            self.mass,
            self.length,
            self.time,
            self.current,
            self.temperature,
            self.amount,
            self.luminosity,
        ]
    }

    fn from_exponents(values: [i8; 7]) -> Self {
        Self::new(
            values[0], values[1], values[2], values[3], values[4], values[5], values[6],
        )
    }

    fn zip_with(&self, other: &Dimension, op: impl Fn(i8, i8) -> i8) -> Dimension {
        let lhs = self.exponents();
        let rhs = other.exponents();
        let mut out = [0i8; 7];
        for idx in 0..7 {
            out[idx] = op(lhs[idx], rhs[idx]);
        }
        Self::from_exponents(out)
    }

    /// Dimension of a product (exponents add).
    pub fn mul(&self, other: &Dimension) -> Dimension {
        self.zip_with(other, |a, b| a + b)
    }

    /// Dimension of a quotient (exponents subtract).
    pub fn div(&self, other: &Dimension) -> Dimension {
        self.zip_with(other, |a, b| a - b)
    }

    /// Dimension raised to an integer power.
    pub fn pow(&self, n: i32) -> Dimension {
        let mut out = self.exponents();
        for exp in out.iter_mut() {
            *exp = (i32::from(*exp) * n) as i8;
        }
        Self::from_exponents(out)
    }

    /// Dimension raised to a real power, `None` unless every exponent stays integral.
    pub fn powf(&self, exponent: f64) -> Option<Dimension> {
        let mut out = [0i8; 7];
        for (idx, exp) in self.exponents().iter().enumerate() {
            let scaled = f64::from(*exp) * exponent;
            if (scaled - scaled.round()).abs() > 1e-9 {
                return None;
            }
            out[idx] = scaled.round() as i8;
        }
        Some(Self::from_exponents(out))
    }

    /// Returns `true` for a pure number.
    pub fn is_dimensionless(&self) -> bool {
        *self == Self::DIMENSIONLESS
    }

    /// Parseable expression of the coherent SI unit for this dimension, e.g. `kg*m*s^-2`.
    pub fn base_symbol(&self) -> String {
        let mut parts = Vec::new();
        for (symbol, exp) in BASE_SYMBOLS.iter().zip(self.exponents()) {
            match exp {
                0 => {}
                1 => parts.push((*symbol).to_string()),
                _ => parts.push(format!("{symbol}^{exp}")),
            }
        }
        parts.join("*")
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dimensionless() {
            return write!(f, "1");
        }
        let mut first = true;
        for (letter, exp) in DIMENSION_LETTERS.iter().zip(self.exponents()) {
            if exp == 0 {
                continue;
            }
            if !first {
                write!(f, " ")?;
            }
            first = false;
            if exp == 1 {
                write!(f, "{letter}")?;
            } else {
                write!(f, "{letter}^{exp}")?;
            }
        }
        Ok(())
    }
}
