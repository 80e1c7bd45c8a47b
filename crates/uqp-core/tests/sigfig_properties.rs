use proptest::prelude::*;
use uqp_core::{decimal_position_of_nth_sigfig, leading_digit, round_at_decimal_position, round_to_sigfigs};

proptest! {
    #[test]
    fn rounding_is_idempotent(value in -1.0e6f64..1.0e6, figures in 1i32..8) {
        let once = round_to_sigfigs(&value, figures).unwrap();
        let twice = round_to_sigfigs(&once, figures).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn rounding_stays_within_half_unit(value in 1.0e-3f64..1.0e6, figures in 1i32..6) {
        let rounded = round_to_sigfigs(&value, figures).unwrap();
        let position = decimal_position_of_nth_sigfig(&value, figures);
        let half_unit = 0.5 * 10f64.powi(-position);
        prop_assert!((rounded - value).abs() <= half_unit * (1.0 + 1e-9));
    }

    #[test]
    fn quantizing_at_own_position_keeps_rounding(value in 1.0e-3f64..1.0e6, figures in 1i32..6) {
        let rounded = round_to_sigfigs(&value, figures).unwrap();
        let position = decimal_position_of_nth_sigfig(&value, figures);
        let quantized = round_at_decimal_position(&value, position).unwrap();
        prop_assert_eq!(rounded, quantized);
    }

    #[test]
    fn leading_digit_is_a_digit(value in -1.0e9f64..1.0e9) {
        let digit = leading_digit(&value);
        prop_assert!(digit <= 9);
        prop_assert_eq!(digit == 0, value == 0.0);
    }
}

#[cfg(feature = "decimal")]
mod decimal_backend {
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use uqp_core::{round_at_decimal_position, round_to_sigfigs, Numeric};

    #[test]
    fn decimal_rounding_is_exact() {
        let value = Decimal::from_str("0.01501").unwrap();
        assert_eq!(round_to_sigfigs(&value, 2).unwrap(), Decimal::from_str("0.015").unwrap());
        let nominal = Decimal::from_str("123").unwrap();
        assert_eq!(round_at_decimal_position(&nominal, -1).unwrap(), Decimal::from(120));
    }

    #[test]
    fn decimal_sqrt_and_parse() {
        let four = Decimal::from(4);
        let root = Numeric::sqrt(&four).unwrap();
        assert!((root - Decimal::from(2)).abs() < Decimal::from_str("0.000000001").unwrap());
        assert_eq!(Decimal::parse_decimal("1.5e-2").unwrap(), Decimal::from_str("0.015").unwrap());
        assert!(Numeric::sqrt(&Decimal::from(-1)).is_err());
    }
}
