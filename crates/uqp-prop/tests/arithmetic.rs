mod common;

use common::{close, error, measure, nominal, q};
use uqp_prop::{Dimension, Operand, UncertaintyConvention, UqpError};

#[test]
fn addition_combines_in_quadrature() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let y = measure(&conv, "3.3 m +/- 2 cm");
    let z = (&x + &y)?;
    assert!(close(nominal(&z), 4.8, 1e-12));
    assert!(close(error(&z), (0.01f64.powi(2) + 0.02f64.powi(2)).sqrt(), 1e-9));
    assert_eq!(z.unit().symbol(), "m");
    Ok(())
}

#[test]
fn multiplication_uses_upper_bound_differences() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let y = measure(&conv, "3.3 m +/- 2 cm");
    let z = (&x * &y)?;
    let dx: f64 = 1.51 * 3.3 - 1.5 * 3.3;
    let dy = 1.5 * 3.32 - 1.5 * 3.3;
    assert!(close(nominal(&z), 4.95, 1e-12));
    assert!(close(error(&z), dx.hypot(dy), 1e-9));
    assert_eq!(z.unit().dimension(), Dimension::LENGTH.pow(2));
    Ok(())
}

#[test]
fn self_subtraction_is_exact() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let z = (&x - &x)?;
    assert_eq!(nominal(&z), 0.0);
    assert_eq!(error(&z), 0.0);
    assert_eq!(z.correlation(&x), 0.0);
    assert!(conv.dependencies(&z).is_empty());
    Ok(())
}

#[test]
fn fully_correlated_difference_vanishes() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "2.5 m +/- 0.5 m");
    let y = measure(&conv, "2.5 m +/- 0.5 m");
    assert!(x.correlated(&y, 1.0));
    let z = (&x - &y)?;
    assert_eq!(error(&z), 0.0);

    let independent = measure(&conv, "2.5 m +/- 0.5 m");
    let w = (&x - &independent)?;
    assert!(close(error(&w), 0.5 * 2f64.sqrt(), 1e-12));
    Ok(())
}

#[test]
fn negation_is_anticorrelated() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "2.5 m +/- 0.5 m");
    let y = (2.0 * &x)?;
    let neg = (-&x)?;
    assert!(close(neg.correlation(&x), -1.0, 1e-12));
    assert!(close(neg.correlation(&y), -1.0, 1e-12));
    assert_eq!(nominal(&neg), -2.5);

    let z = (&x + &neg)?;
    assert!(error(&z).abs() < 1e-12);
    Ok(())
}

#[test]
fn abs_follows_the_sign_of_the_input() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "-1.5 m +/- 1 cm");
    let y = (2.0 * &x)?;
    let a = x.abs()?;
    assert_eq!(nominal(&a), 1.5);
    assert!(close(a.correlation(&x), -1.0, 1e-12));
    assert!(close(a.correlation(&y), -1.0, 1e-12));

    let p = measure(&conv, "1.5 m +/- 1 cm");
    let b = p.abs()?;
    assert!(close(b.correlation(&p), 1.0, 1e-12));
    Ok(())
}

#[test]
fn powers_propagate_through_the_engine() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "2 m +/- 0.1 m");
    let squared = x.powi(2)?;
    assert!(close(nominal(&squared), 4.0, 1e-12));
    assert!(close(error(&squared), 2.1f64.powi(2) - 4.0, 1e-9));
    assert_eq!(squared.unit().dimension(), Dimension::LENGTH.pow(2));

    let unity = x.powi(0)?;
    assert_eq!(nominal(&unity), 1.0);
    assert_eq!(error(&unity), 0.0);

    let root = squared.sqrt()?;
    assert!(close(nominal(&root), 2.0, 1e-12));
    assert_eq!(root.unit().dimension(), Dimension::LENGTH);
    Ok(())
}

#[test]
fn repeated_sum_is_linear() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let a = measure(&conv, "2 +/- 0.1");
    let total = conv.sum(std::iter::repeat(Operand::from(&a)).take(10))?;
    assert!(close(nominal(&total), 20.0, 1e-12));
    assert!(close(error(&total), 1.0, 1e-9));
    assert!(close(total.correlation(&a), 1.0, 1e-9));
    Ok(())
}

#[test]
fn exact_operands_contribute_nothing() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let doubled = (&x * 2.0)?;
    assert!(close(error(&doubled), 0.02, 1e-9));

    let offset = (&x + &q("1 m"))?;
    assert!(close(nominal(&offset), 2.5, 1e-12));
    assert!(close(error(&offset), 0.01, 1e-9));

    let inverse = (1.0 / &x)?;
    assert!(close(nominal(&inverse), 1.0 / 1.5, 1e-12));
    assert_eq!(inverse.unit().dimension(), Dimension::LENGTH.pow(-1));
    Ok(())
}

#[test]
fn incompatible_addition_fails() {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let t = measure(&conv, "2 s +/- 0.1 s");
    let err = (&x + &t).unwrap_err();
    assert_eq!(err.family(), "Dimensionality");
    assert!(conv.sum(Vec::<Operand<f64>>::new()).is_err());
}

#[test]
fn unit_conversion_keeps_full_correlation() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let cm = x.to(&common::unit("cm"))?;
    assert!(close(nominal(&cm), 150.0, 1e-12));
    assert!(close(error(&cm), 1.0, 1e-9));
    assert!(close(cm.correlation(&x), 1.0, 1e-9));

    let mut y = x.clone();
    y.ito(&common::unit("mm"))?;
    assert_eq!(y.id(), x.id());
    assert!(close(error(&y), 10.0, 1e-9));
    Ok(())
}
