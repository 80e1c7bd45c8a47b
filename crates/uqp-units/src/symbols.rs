//! Symbol table for named units and SI prefixes.

use std::f64::consts::PI;

use crate::dimension::Dimension;
use crate::unit::Unit;

struct Definition {
    dimension: Dimension,
    scale: f64,
    offset: f64,
    delta: bool,
    prefixable: bool,
}

impl Definition {
    const fn plain(dimension: Dimension, scale: f64) -> Self {
        Self {
            dimension,
            scale,
            offset: 0.0,
            delta: false,
            prefixable: false,
        }
    }

    const fn prefixable(dimension: Dimension, scale: f64) -> Self {
        Self {
            dimension,
            scale,
            offset: 0.0,
            delta: false,
            prefixable: true,
        }
    }

    const fn absolute(scale: f64, offset: f64) -> Self {
        Self {
            dimension: Dimension::TEMPERATURE,
            scale,
            offset,
            delta: false,
            prefixable: false,
        }
    }

    const fn difference(scale: f64) -> Self {
        Self {
            dimension: Dimension::TEMPERATURE,
            scale,
            offset: 0.0,
            delta: true,
            prefixable: false,
        }
    }

    fn into_unit(self, symbol: &str, factor: f64) -> Unit {
        let unit = Unit::new(symbol, self.dimension, self.scale * factor);
        if self.delta {
            unit.as_delta()
        } else {
            unit.with_offset(self.offset)
        }
    }
}

// Longest prefixes first so `da` wins over `d`.
const PREFIXES: &[(&str, f64)] = &[
    ("da", 1e1),
    ("µ", 1e-6),
    ("μ", 1e-6),
    ("p", 1e-12),
    ("n", 1e-9),
    ("u", 1e-6),
    ("m", 1e-3),
    ("c", 1e-2),
    ("d", 1e-1),
    ("h", 1e2),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
];

const FAHRENHEIT_SCALE: f64 = 5.0 / 9.0;

fn definition(symbol: &str) -> Option<Definition> {
    let def = match symbol {
        "1" | "dimensionless" => Definition::plain(Dimension::DIMENSIONLESS, 1.0),
        "%" | "percent" => Definition::plain(Dimension::DIMENSIONLESS, 0.01),
        "ppm" => Definition::plain(Dimension::DIMENSIONLESS, 1e-6),
        "rad" | "radian" | "radians" => Definition::prefixable(Dimension::DIMENSIONLESS, 1.0),
        "deg" | "degree" | "degrees" => Definition::plain(Dimension::DIMENSIONLESS, PI / 180.0),

        "m" | "meter" | "meters" | "metre" | "metres" => {
            Definition::prefixable(Dimension::LENGTH, 1.0)
        }
        "in" | "inch" | "inches" => Definition::plain(Dimension::LENGTH, 0.0254),
        "ft" | "foot" | "feet" => Definition::plain(Dimension::LENGTH, 0.3048),
        "yd" | "yard" | "yards" => Definition::plain(Dimension::LENGTH, 0.9144),
        "mi" | "mile" | "miles" => Definition::plain(Dimension::LENGTH, 1609.344),

        "g" | "gram" | "grams" => Definition::prefixable(Dimension::MASS, 1e-3),
        "lb" | "pound" | "pounds" => Definition::plain(Dimension::MASS, 0.453_592_37),

        "s" | "sec" | "second" | "seconds" => Definition::prefixable(Dimension::TIME, 1.0),
        "min" | "minute" | "minutes" => Definition::plain(Dimension::TIME, 60.0),
        "h" | "hr" | "hour" | "hours" => Definition::plain(Dimension::TIME, 3600.0),
        "day" | "days" => Definition::plain(Dimension::TIME, 86_400.0),

        "A" | "ampere" | "amperes" => Definition::prefixable(Dimension::CURRENT, 1.0),
        "mol" | "mole" | "moles" => Definition::prefixable(Dimension::AMOUNT, 1.0),
        "cd" | "candela" => Definition::plain(Dimension::LUMINOSITY, 1.0),

        "K" | "kelvin" | "degK" => Definition::prefixable(Dimension::TEMPERATURE, 1.0),
        "degC" | "celsius" | "degree_Celsius" => Definition::absolute(1.0, 273.15),
        "degF" | "fahrenheit" | "degree_Fahrenheit" => {
            Definition::absolute(FAHRENHEIT_SCALE, 459.67 * FAHRENHEIT_SCALE)
        }
        "delta_degC" => Definition::difference(1.0),
        "delta_degF" => Definition::difference(FAHRENHEIT_SCALE),

        "L" | "l" | "liter" | "liters" | "litre" => {
            Definition::prefixable(Dimension::VOLUME, 1e-3)
        }
        "Hz" | "hertz" => Definition::prefixable(Dimension::FREQUENCY, 1.0),
        "N" | "newton" | "newtons" => Definition::prefixable(Dimension::FORCE, 1.0),
        "J" | "joule" | "joules" => Definition::prefixable(Dimension::ENERGY, 1.0),
        "W" | "watt" | "watts" => Definition::prefixable(Dimension::POWER, 1.0),
        "Pa" | "pascal" => Definition::prefixable(Dimension::PRESSURE, 1.0),
        "C" | "coulomb" => Definition::prefixable(Dimension::CHARGE, 1.0),
        "V" | "volt" | "volts" => Definition::prefixable(Dimension::VOLTAGE, 1.0),
        _ => return None,
    };
    Some(def)
}

/// Resolves a single unit symbol, trying exact names before SI prefixes.
pub fn lookup(symbol: &str) -> Option<Unit> {
    if let Some(def) = definition(symbol) {
        return Some(def.into_unit(symbol, 1.0));
    }
    PREFIXES.iter().find_map(|(prefix, factor)| {
        let base = symbol.strip_prefix(prefix)?;
        let def = definition(base)?;
        def.prefixable.then(|| def.into_unit(symbol, *factor))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_win_over_prefixes() {
        let minute = lookup("min").unwrap();
        assert_eq!(minute.scale(), 60.0);
        let mol = lookup("mol").unwrap();
        assert_eq!(mol.dimension(), Dimension::AMOUNT);
    }

    #[test]
    fn prefixes_scale_base_units() {
        assert_eq!(lookup("cm").unwrap().scale(), 1e-2);
        assert_eq!(lookup("kg").unwrap().scale(), 1.0);
        assert_eq!(lookup("ms").unwrap().dimension(), Dimension::TIME);
        assert!(lookup("kmile").is_none());
    }

    #[test]
    fn temperature_scales() {
        let fahrenheit = lookup("degF").unwrap();
        assert!(fahrenheit.is_absolute_offset());
        assert!((fahrenheit.offset() - 255.372_222_222).abs() < 1e-6);
        assert!(lookup("delta_degF").unwrap().is_delta());
    }
}
