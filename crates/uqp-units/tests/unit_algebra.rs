use proptest::prelude::*;
use uqp_units::{Dimension, Quantity, Unit};

fn unit(expr: &str) -> Unit {
    Unit::parse(expr).unwrap()
}

#[test]
fn gas_constant_units_cancel_against_temperature() {
    let r: Quantity<f64> = Quantity::parse("8.314 J/(mol*K)").unwrap();
    let n: Quantity<f64> = Quantity::parse("2 mol").unwrap();
    let t: Quantity<f64> = Quantity::parse("300 K").unwrap();
    let energy = &(&r * &n) * &t;
    assert_eq!(energy.unit().dimension(), Dimension::ENERGY);
    assert!((energy.to(&unit("kJ")).unwrap().magnitude() - 4.9884).abs() < 1e-9);
}

#[test]
fn offset_readings_enter_products_on_absolute_scale() {
    let t: Quantity<f64> = Quantity::parse("100 degC").unwrap();
    let doubled = &t * 2.0;
    assert_eq!(doubled.unit().dimension(), Dimension::TEMPERATURE);
    assert!((doubled.magnitude() - 746.3).abs() < 1e-9);
}

#[test]
fn percent_is_a_scaled_pure_number() {
    let ratio: Quantity<f64> = Quantity::parse("2 %").unwrap();
    let plain = ratio.to(&Unit::dimensionless()).unwrap();
    assert!((plain.magnitude() - 0.02).abs() < 1e-15);
}

#[test]
fn display_shows_symbol() {
    let g: Quantity<f64> = Quantity::parse("9.81 m/s^2").unwrap();
    assert_eq!(g.to_string(), "9.81 m/s^2");
    assert_eq!(Quantity::dimensionless(3.0).to_string(), "3");
}

#[test]
fn units_serialize_with_dimension() {
    let json = serde_json::to_string(&unit("km/hr")).unwrap();
    let restored: Unit = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, unit("km/hr"));
    assert_eq!(restored.symbol(), "km/hr");
}

#[test]
fn malformed_quantities_are_parse_errors() {
    assert_eq!(Quantity::<f64>::parse("m 3").unwrap_err().family(), "Parse");
    assert_eq!(Quantity::<f64>::parse("3 parsecs").unwrap_err().family(), "UnknownUnit");
}

proptest! {
    #[test]
    fn conversion_preserves_physical_value(value in -1.0e6f64..1.0e6) {
        let reading = Quantity::new(value, unit("degF"));
        let kelvin = reading.to(&unit("K")).unwrap();
        let back = kelvin.to(&unit("degF")).unwrap();
        prop_assert!((back.magnitude() - value).abs() <= 1e-9 * value.abs().max(1.0));
    }

    #[test]
    fn subtraction_of_converted_readings_vanishes(value in 0.0f64..1.0e4) {
        let reading = Quantity::new(value, unit("degC"));
        let same = reading.to(&unit("degF")).unwrap();
        let diff = reading.checked_sub(&same).unwrap();
        prop_assert!(diff.unit().is_delta());
        prop_assert!(diff.magnitude().abs() < 1e-9 * value.max(1.0));
    }
}
