#![deny(missing_docs)]
//! Correlation-aware propagation of measurement uncertainty.
//!
//! An [`UncertaintyConvention`] owns a [`CorrelationRegistry`] and creates
//! [`UncertainQuantity`] values, either directly, from compact notation such
//! as `"1.5 m +/- 1 cm"`, or from repeated samples. Functions of plain
//! quantities become uncertainty-aware through
//! [`UncertaintyConvention::with_error`]; arithmetic on uncertain quantities
//! goes through the same engine, so `x - x` is exactly zero and derived
//! values remember how they correlate with their inputs.

/// Rounding and comparison settings bound to a convention.
pub mod config;
/// The convention facade and its propagation engine.
pub mod convention;
/// Estimates from repeated samples and statistical comparisons.
pub mod estimate;
/// Registry identities.
pub mod ids;
/// Dense correlation matrices.
pub mod matrix;
/// Compact `nominal +/- uncertainty` notation.
pub mod notation;
/// Function arguments with or without uncertainty.
pub mod operand;
/// Per-argument contribution strategies.
pub mod propagator;
/// Identity-keyed correlation store.
pub mod registry;
/// Serializable propagation and measurement reports.
pub mod report;
/// Uncertain quantities and their arithmetic.
pub mod uncertain;

pub use config::ConventionConfig;
pub use convention::{BinaryOp, UncertaintyConvention, WithError};
pub use ids::QuantityId;
pub use matrix::CorrelationMatrix;
pub use notation::{parse_compact, CompactNotation};
pub use operand::{Arguments, Operand, ParamKey};
pub use propagator::{Contribution, ErrorPropagator, Propagation, UpperBoundPropagator};
pub use registry::CorrelationRegistry;
pub use report::{ContributionEntry, MeasurementSummary, PropagationReport};
pub use uncertain::UncertainQuantity;
pub use uqp_core::{ErrorInfo, Numeric, UqpError};
pub use uqp_units::{Dimension, Quantity, Unit};
