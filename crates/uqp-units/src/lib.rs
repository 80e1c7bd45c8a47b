#![deny(missing_docs)]
//! Runtime dimensional analysis for uncertainty propagation.
//!
//! [`Quantity`] pairs a [`Numeric`](uqp_core::Numeric) magnitude with a
//! [`Unit`]; units are parsed from expressions such as `kg*m/s^2` and carry
//! an affine map onto coherent SI so absolute temperature scales convert
//! correctly.

pub mod dimension;
pub mod parser;
pub mod quantity;
pub mod symbols;
pub mod unit;

pub use dimension::Dimension;
pub use parser::{parse_unit, split_number};
pub use quantity::Quantity;
pub use unit::Unit;
