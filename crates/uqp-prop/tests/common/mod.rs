#![allow(dead_code)]

use uqp_prop::{Quantity, UncertainQuantity, UncertaintyConvention, Unit};

/// Relative closeness: `(a - b)^2 / (a^2 + b^2) < 4 tol^2`, exact match always passes.
pub fn close(a: f64, b: f64, tol: f64) -> bool {
    if a == b {
        return true;
    }
    (a - b).powi(2) / (a.powi(2) + b.powi(2)) < 4.0 * tol.powi(2)
}

pub fn q(text: &str) -> Quantity<f64> {
    Quantity::parse(text).unwrap()
}

pub fn unit(expr: &str) -> Unit {
    Unit::parse(expr).unwrap()
}

pub fn measure(conv: &UncertaintyConvention<f64>, text: &str) -> UncertainQuantity<f64> {
    conv.parse(text).unwrap()
}

pub fn nominal(x: &UncertainQuantity<f64>) -> f64 {
    *x.nominal().magnitude()
}

pub fn error(x: &UncertainQuantity<f64>) -> f64 {
    *x.uncertainty().magnitude()
}
