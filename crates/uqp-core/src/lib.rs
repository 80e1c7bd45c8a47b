#![deny(missing_docs)]
//! Core building blocks for unit-aware uncertainty propagation.
//!
//! The crate hosts the shared [`UqpError`] surface, the [`Numeric`] backend
//! abstraction used for quantity magnitudes, and decimal-exact
//! significant-figure rounding.

pub mod errors;
pub mod numeric;
pub mod sigfig;

pub use errors::{ErrorInfo, UqpError};
pub use numeric::Numeric;
pub use sigfig::{
    decimal_position_of_nth_sigfig, leading_digit, round_at_decimal_position, round_to_sigfigs,
    DecimalDigits,
};
