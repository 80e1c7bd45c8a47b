mod common;

use common::{close, measure};
use proptest::prelude::*;
use uqp_prop::{CorrelationRegistry, Operand, UncertaintyConvention, UqpError};

#[test]
fn matrix_renders_recorded_coefficients() {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let y = measure(&conv, "3.3 m +/- 2 cm");
    assert!(x.correlated(&y, 0.6));
    let matrix = conv.matrix(&[Operand::from(&x), Operand::from(&y)]);
    assert_eq!(matrix.to_string(), "1.0 0.6 \n0.6 1.0 \n");
    assert_eq!(matrix.get(0, 1).unwrap(), 0.6);
    assert!(matrix.get(2, 0).is_err());
}

#[test]
fn derived_values_remember_their_inputs() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let y = measure(&conv, "3.3 m +/- 1 cm");
    let z = (&x + &y)?;
    assert!(close(z.correlation(&x), 0.5f64.sqrt(), 1e-9));
    assert!(close(z.correlation(&y), 0.5f64.sqrt(), 1e-9));
    assert!(conv.dependencies(&z).contains(&x.id()));
    assert!(conv.dependencies(&z).contains(&y.id()));
    Ok(())
}

#[test]
fn correlations_reach_one_level_through_dependencies() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "2 m +/- 0.1 m");
    let y = measure(&conv, "5 s +/- 0.2 s");
    assert!(x.correlated(&y, 0.5));
    let z = (2.0 * &x)?;
    assert!(close(z.correlation(&x), 1.0, 1e-9));
    assert!(close(z.correlation(&y), 0.5, 1e-9));
    Ok(())
}

#[test]
fn clones_share_identity_and_copies_do_not() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "2 m +/- 0.1 m");
    let alias = x.clone();
    assert_eq!(alias.id(), x.id());
    assert_eq!(alias.correlation(&x), 1.0);

    let copy = x.independent_copy();
    assert_ne!(copy.id(), x.id());
    assert_eq!(copy.correlation(&x), 0.0);
    let diff = (&x - &copy)?;
    assert!(close(*diff.uncertainty().magnitude(), 0.1 * 2f64.sqrt(), 1e-9));
    Ok(())
}

#[test]
fn dropping_the_last_clone_releases_the_identity() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    {
        let x = measure(&conv, "1.5 m +/- 1 cm");
        let y = measure(&conv, "3.3 m +/- 2 cm");
        assert!(x.correlated(&y, 0.3));
        let z = (&x + &y)?;
        assert_eq!(conv.registry().live_count(), 3);
        assert_eq!(conv.registry().link_count(), 3);

        let kept = x.clone();
        drop(x);
        assert!(conv.registry().is_live(kept.id()));
        drop(z);
        assert_eq!(conv.registry().live_count(), 2);
        assert_eq!(conv.registry().link_count(), 1);
    }
    assert_eq!(conv.registry().live_count(), 0);
    assert_eq!(conv.registry().link_count(), 0);
    Ok(())
}

#[test]
fn drops_during_a_registry_borrow_are_released_later() -> Result<(), UqpError> {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let y = measure(&conv, "3.3 m +/- 2 cm");
    let z = (&x + &y)?;
    let z_id = z.id();
    {
        let guard = conv.registry();
        drop(z);
        assert!(guard.is_live(z_id));
        assert_eq!(guard.live_count(), 3);
    }
    assert!(!conv.registry().is_live(z_id));
    assert_eq!(conv.registry().live_count(), 2);
    assert_eq!(conv.registry().link_count(), 0);

    let guard = conv.registry();
    drop(x);
    drop(guard);
    let w = measure(&conv, "1 s +/- 0.1 s");
    assert_eq!(conv.registry().live_count(), 2);
    assert!(conv.registry().is_live(w.id()));
    Ok(())
}

#[test]
fn exact_operands_have_no_correlation() {
    let conv = UncertaintyConvention::new();
    let x = measure(&conv, "1.5 m +/- 1 cm");
    let exact = Operand::from(common::q("1 m"));
    assert!(!conv.correlated(&Operand::from(&x), &exact, 0.5));
    assert_eq!(conv.correlation(&Operand::from(&x), &exact), 0.0);
}

#[test]
fn conventions_do_not_share_registries() {
    let a = UncertaintyConvention::<f64>::new();
    let b = UncertaintyConvention::<f64>::new();
    assert!(!a.shares_registry(&b));
    assert!(a.shares_registry(&a.clone()));
}

proptest! {
    #[test]
    fn coefficients_are_symmetric_and_clamped(r in -3.0f64..3.0) {
        let mut registry = CorrelationRegistry::new();
        let a = registry.register();
        let b = registry.register();
        prop_assert!(registry.set(a, b, r));
        let expected = r.clamp(-1.0, 1.0);
        prop_assert_eq!(registry.get(a, b, 0.0), expected);
        prop_assert_eq!(registry.get(b, a, 0.0), expected);
        registry.release(b);
        prop_assert_eq!(registry.get(a, b, 0.25), 0.25);
        prop_assert!(!registry.set(a, b, r));
    }
}
