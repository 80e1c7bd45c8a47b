use std::cell::Ref;
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::{debug, warn};
use uqp_core::{decimal_position_of_nth_sigfig, ErrorInfo, Numeric, UqpError};
use uqp_units::Quantity;

use crate::config::ConventionConfig;
use crate::ids::QuantityId;
use crate::matrix::CorrelationMatrix;
use crate::notation::parse_compact;
use crate::operand::{Arguments, Operand, ParamKey};
use crate::propagator::{ErrorPropagator, Propagation, UpperBoundPropagator};
use crate::registry::{CorrelationRegistry, SharedRegistry};
use crate::report::{ContributionEntry, PropagationReport};
use crate::uncertain::UncertainQuantity;

/// Arithmetic operators supported by [`UncertaintyConvention::combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `lhs + rhs`
    Add,
    /// `lhs - rhs`
    Sub,
    /// `lhs * rhs`
    Mul,
    /// `lhs / rhs`
    Div,
}

impl BinaryOp {
    /// Applies the operator to plain quantities.
    pub fn apply<N: Numeric>(
        self,
        lhs: &Quantity<N>,
        rhs: &Quantity<N>,
    ) -> Result<Quantity<N>, UqpError> {
        match self {
            BinaryOp::Add => lhs.checked_add(rhs),
            BinaryOp::Sub => lhs.checked_sub(rhs),
            BinaryOp::Mul => Ok(lhs * rhs),
            BinaryOp::Div => Ok(lhs / rhs),
        }
    }
}

/// Registry, propagator and rounding rules shared by a family of measurements.
///
/// Cloning is cheap and yields a handle onto the same registry.
///
/// Propagating `f(x_1, ..., x_n)` takes three steps:
///
/// 1. the propagator yields the nominal result and one signed contribution
///    `dz_i` per argument;
/// 2. the total is `dz = sqrt(sum_i sum_j c(x_i, x_j) * dz_i * dz_j)` with
///    `c(x_i, x_i) = 1` and unrecorded pairs reading 0;
/// 3. the result is correlated with each uncertain input `x_i` by
///    `r_i = sum_j (dz_j / dz) * c(x_i, x_j)`, and with every quantity `v`
///    already correlated with an input by `sum_j (dz_j / dz) * c(v, x_j)`.
///
/// Step 3 looks one level deep: correlations of `v` that are not themselves
/// recorded against an input do not reach the result.
pub struct UncertaintyConvention<N: Numeric> {
    registry: Rc<SharedRegistry>,
    config: Rc<ConventionConfig>,
    propagator: UpperBoundPropagator,
    _numeric: PhantomData<N>,
}

impl<N: Numeric> Clone for UncertaintyConvention<N> {
    fn clone(&self) -> Self {
        Self {
            registry: Rc::clone(&self.registry),
            config: Rc::clone(&self.config),
            propagator: self.propagator,
            _numeric: PhantomData,
        }
    }
}

impl<N: Numeric> fmt::Debug for UncertaintyConvention<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UncertaintyConvention")
            .field("config", &self.config)
            .field("live_quantities", &self.registry.read().live_count())
            .finish()
    }
}

impl<N: Numeric> Default for UncertaintyConvention<N> {
    fn default() -> Self {
        Self::new()
    }
}

fn argument_error(code: &str, message: String) -> UqpError {
    UqpError::Arguments(ErrorInfo::new(code, message))
}

struct Aggregate<'a, N: Numeric> {
    operands: Vec<&'a Operand<N>>,
    keys: Vec<ParamKey>,
    deltas: Vec<N>,
    coefficients: Vec<f64>,
}

impl<'a, N: Numeric> Aggregate<'a, N> {
    fn coefficient(&self, i: usize, j: usize) -> f64 {
        self.coefficients[i * self.operands.len() + j]
    }

    fn variance(&self, skip: Option<usize>) -> N {
        let n = self.operands.len();
        let mut total = N::zero();
        for i in (0..n).filter(|i| Some(*i) != skip) {
            for j in (0..n).filter(|j| Some(*j) != skip) {
                total = total
                    + N::from_f64(self.coefficient(i, j))
                        * self.deltas[i].clone()
                        * self.deltas[j].clone();
            }
        }
        total
    }

    fn total(&self, skip: Option<usize>) -> Result<N, UqpError> {
        let variance = self.variance(skip);
        if variance.is_negative() {
            warn!(variance = %variance, "inconsistent correlations gave a negative variance, using zero");
            return Ok(N::zero());
        }
        variance.sqrt()
    }
}

impl<N: Numeric> UncertaintyConvention<N> {
    /// Convention with the default configuration.
    pub fn new() -> Self {
        Self {
            registry: Rc::new(SharedRegistry::default()),
            config: Rc::new(ConventionConfig::default()),
            propagator: UpperBoundPropagator,
            _numeric: PhantomData,
        }
    }

    /// Convention with a validated configuration.
    pub fn with_config(config: ConventionConfig) -> Result<Self, UqpError> {
        config.validate()?;
        Ok(Self {
            config: Rc::new(config),
            ..Self::new()
        })
    }

    /// Bound configuration.
    pub fn config(&self) -> &ConventionConfig {
        &self.config
    }

    /// Read access to the registry. Quantities dropped while this borrow is
    /// alive are released on the next access.
    pub fn registry(&self) -> Ref<'_, CorrelationRegistry> {
        self.registry.read()
    }

    pub(crate) fn registry_handle(&self) -> Rc<SharedRegistry> {
        Rc::clone(&self.registry)
    }

    /// Returns `true` when both handles share one registry.
    pub fn shares_registry(&self, other: &UncertaintyConvention<N>) -> bool {
        Rc::ptr_eq(&self.registry, &other.registry)
    }

    /// Records a correlation coefficient between two operands.
    pub fn correlated(&self, x: &Operand<N>, y: &Operand<N>, r: f64) -> bool {
        self.registry.write().correlated(x, y, r)
    }

    /// Correlation coefficient between two operands, 0 when unrecorded.
    pub fn correlation(&self, x: &Operand<N>, y: &Operand<N>) -> f64 {
        self.registry.read().correlation(x, y, 0.0)
    }

    /// Pairwise coefficients of `quantities`.
    pub fn matrix(&self, quantities: &[Operand<N>]) -> CorrelationMatrix {
        self.registry.read().matrix(quantities)
    }

    /// Identities with a recorded coefficient against `x`.
    pub fn dependencies(&self, x: &UncertainQuantity<N>) -> BTreeSet<QuantityId> {
        self.registry.read().dependencies(x.id())
    }

    /// Creates an uncertain quantity; the uncertainty may use any compatible unit.
    pub fn uncertain(
        &self,
        nominal: Quantity<N>,
        uncertainty: Quantity<N>,
    ) -> Result<UncertainQuantity<N>, UqpError> {
        UncertainQuantity::from_parts(self, nominal, uncertainty)
    }

    /// Parses compact notation such as `"1.5 m +/- 1 cm"` or `"2 m/s +/- 1%"`.
    pub fn parse(&self, text: &str) -> Result<UncertainQuantity<N>, UqpError> {
        let notation = parse_compact(text)?;
        let (nominal, uncertainty) = notation.quantities::<N>()?;
        self.uncertain(nominal, uncertainty)
    }

    /// Treats an exact quantity as uncertain by one unit in its `sigfigs`-th figure.
    pub fn sigfig_uncertain(
        &self,
        quantity: &Quantity<N>,
        sigfigs: usize,
    ) -> Result<UncertainQuantity<N>, UqpError> {
        let position = decimal_position_of_nth_sigfig(quantity.magnitude(), sigfigs as i32);
        let step = N::parse_decimal(&format!("1e{}", -position))?;
        self.uncertain(
            quantity.clone(),
            Quantity::new(step, quantity.unit().delta()),
        )
    }

    /// Propagates uncertainty through `f` with the bound upper-bound propagator.
    pub fn propagate<F, E>(
        &self,
        f: F,
        args: &Arguments<Operand<N>>,
    ) -> Result<UncertainQuantity<N>, E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
    {
        self.propagate_with(&self.propagator, f, args)
    }

    /// Propagates uncertainty through `f` with an explicit propagator.
    pub fn propagate_with<P, F, E>(
        &self,
        propagator: &P,
        f: F,
        args: &Arguments<Operand<N>>,
    ) -> Result<UncertainQuantity<N>, E>
    where
        P: ErrorPropagator<N>,
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
    {
        let propagation = propagator.propagate(f, args)?;
        let (result, _) = self.finish(args, propagation)?;
        Ok(result)
    }

    /// Propagates and also reports each argument's signed contribution and share.
    pub fn propagate_detailed<F, E>(
        &self,
        f: F,
        args: &Arguments<Operand<N>>,
    ) -> Result<(UncertainQuantity<N>, PropagationReport), E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
    {
        let propagation = self.propagator.propagate(f, args)?;
        Ok(self.finish(args, propagation)?)
    }

    fn finish(
        &self,
        args: &Arguments<Operand<N>>,
        propagation: Propagation<N>,
    ) -> Result<(UncertainQuantity<N>, PropagationReport), UqpError> {
        let Propagation {
            nominal,
            contributions,
        } = propagation;
        let delta_unit = nominal.unit().delta();

        let mut aggregate = Aggregate {
            operands: Vec::with_capacity(contributions.len()),
            keys: Vec::with_capacity(contributions.len()),
            deltas: Vec::with_capacity(contributions.len()),
            coefficients: Vec::new(),
        };
        for contribution in contributions {
            let operand = args.get(&contribution.key).ok_or_else(|| {
                argument_error(
                    "unknown-parameter",
                    format!("contribution for unknown argument {}", contribution.key),
                )
            })?;
            aggregate.operands.push(operand);
            aggregate
                .deltas
                .push(contribution.delta.to(&delta_unit)?.into_magnitude());
            aggregate.keys.push(contribution.key);
        }

        let n = aggregate.operands.len();
        aggregate.coefficients = vec![0.0; n * n];
        {
            let registry = self.registry.read();
            for i in 0..n {
                for j in 0..n {
                    aggregate.coefficients[i * n + j] = if i == j {
                        1.0
                    } else {
                        registry.correlation(aggregate.operands[i], aggregate.operands[j], 0.0)
                    };
                }
            }
        }

        let total = aggregate.total(None)?;
        debug!(parameters = n, total = %total, unit = %delta_unit, "propagated uncertainty");
        let report = self.report(&aggregate, &nominal, &total)?;
        let result = UncertainQuantity::register(self, nominal, Quantity::new(total.clone(), delta_unit));

        if total.is_zero() {
            debug!(id = %result.id(), "zero total uncertainty, correlations not recorded");
            return Ok((result, report));
        }

        let weights: Vec<N> = aggregate
            .deltas
            .iter()
            .map(|delta| delta.clone() / total.clone())
            .collect();
        let weighted = |coefficient: &dyn Fn(usize) -> f64| -> f64 {
            let mut sum = N::zero();
            for (j, weight) in weights.iter().enumerate() {
                sum = sum + weight.clone() * N::from_f64(coefficient(j));
            }
            sum.to_f64()
        };

        let mut updates: Vec<(QuantityId, f64)> = Vec::new();
        {
            let registry = self.registry.read();
            for (i, operand) in aggregate.operands.iter().enumerate() {
                let Some(id) = operand.id() else {
                    continue;
                };
                updates.push((id, weighted(&|j| aggregate.coefficient(i, j))));
                for dependency in registry.dependencies(id) {
                    let r = weighted(&|j| match aggregate.operands[j].id() {
                        Some(other) => registry.get(dependency, other, 0.0),
                        None => 0.0,
                    });
                    updates.push((dependency, r));
                }
            }
        }

        let mut registry = self.registry.write();
        for (id, r) in updates {
            registry.set(result.id(), id, r);
        }
        drop(registry);
        Ok((result, report))
    }

    fn report(
        &self,
        aggregate: &Aggregate<'_, N>,
        nominal: &Quantity<N>,
        total: &N,
    ) -> Result<PropagationReport, UqpError> {
        let total_f64 = total.to_f64();
        let mut contributions = Vec::with_capacity(aggregate.keys.len());
        for (i, key) in aggregate.keys.iter().enumerate() {
            let relative_share = if total.is_zero() {
                0.0
            } else {
                (total_f64 - aggregate.total(Some(i))?.to_f64()) / total_f64
            };
            contributions.push(ContributionEntry {
                parameter: key.to_string(),
                contribution: aggregate.deltas[i].to_f64(),
                relative_share,
            });
        }
        contributions.sort_by(|a, b| b.contribution.abs().total_cmp(&a.contribution.abs()));
        Ok(PropagationReport {
            nominal: nominal.magnitude().to_f64(),
            uncertainty: total_f64,
            unit: nominal.unit().symbol().to_string(),
            contributions,
        })
    }

    /// Applies `op` to two operands through the propagation engine.
    pub fn combine(
        &self,
        lhs: &Operand<N>,
        rhs: &Operand<N>,
        op: BinaryOp,
    ) -> Result<UncertainQuantity<N>, UqpError> {
        let args = Arguments::positional([lhs.clone(), rhs.clone()]);
        self.propagate(
            |a: &Arguments<Quantity<N>>| op.apply(a.arg(0)?, a.arg(1)?),
            &args,
        )
    }

    /// Applies a single-argument quantity function through the propagation engine.
    pub fn unary<G>(&self, operand: &Operand<N>, g: G) -> Result<UncertainQuantity<N>, UqpError>
    where
        G: Fn(&Quantity<N>) -> Result<Quantity<N>, UqpError>,
    {
        let args = Arguments::positional([operand.clone()]);
        self.propagate(|a: &Arguments<Quantity<N>>| g(a.arg(0)?), &args)
    }

    /// Sums operands left to right, tracking correlations between partial sums.
    pub fn sum<I>(&self, items: I) -> Result<UncertainQuantity<N>, UqpError>
    where
        I: IntoIterator<Item = Operand<N>>,
    {
        let mut items = items.into_iter();
        let first = items
            .next()
            .ok_or_else(|| argument_error("empty-sum", "sum of no operands".to_string()))?;
        let mut acc = self.unary(&first, |q: &Quantity<N>| Ok(q.clone()))?;
        for item in items {
            acc = self.combine(&Operand::from(&acc), &item, BinaryOp::Add)?;
        }
        Ok(acc)
    }

    /// Wraps `f` so that calls propagate uncertainty through it.
    ///
    /// `params` names the arguments in declaration order; calls may bind them
    /// positionally or by keyword and `f` sees them as keyword arguments.
    pub fn with_error<F>(&self, params: &[&str], f: F) -> WithError<N, F> {
        WithError {
            convention: self.clone(),
            params: params.iter().map(|name| name.to_string()).collect(),
            auto_error: None,
            func: f,
        }
    }

    /// Like [`UncertaintyConvention::with_error`], but exact arguments are
    /// treated as uncertain by one unit in their `sigfigs`-th significant
    /// figure (the configured `auto_error_sigfigs` when `None`).
    pub fn with_auto_error<F>(&self, params: &[&str], sigfigs: Option<usize>, f: F) -> WithError<N, F> {
        let sigfigs = sigfigs.unwrap_or(self.config.auto_error_sigfigs);
        WithError {
            auto_error: Some(sigfigs),
            ..self.with_error(params, f)
        }
    }
}

/// A function of quantities wrapped for uncertainty propagation.
pub struct WithError<N: Numeric, F> {
    convention: UncertaintyConvention<N>,
    params: Vec<String>,
    auto_error: Option<usize>,
    func: F,
}

impl<N: Numeric, F> fmt::Debug for WithError<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WithError")
            .field("params", &self.params)
            .field("auto_error", &self.auto_error)
            .finish()
    }
}

impl<N: Numeric, F> WithError<N, F> {
    /// Declared parameter names, in order.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Binds positional then keyword arguments to the declared names.
    pub fn bind(&self, args: Arguments<Operand<N>>) -> Result<Arguments<Operand<N>>, UqpError> {
        if args.args().len() > self.params.len() {
            return Err(argument_error(
                "too-many-arguments",
                format!(
                    "{} positional arguments for {} parameters",
                    args.args().len(),
                    self.params.len()
                ),
            ));
        }
        let mut slots: Vec<Option<Operand<N>>> = vec![None; self.params.len()];
        for (slot, value) in slots.iter_mut().zip(args.args()) {
            *slot = Some(value.clone());
        }
        for (name, value) in args.kwargs() {
            let idx = self
                .params
                .iter()
                .position(|param| param == name)
                .ok_or_else(|| {
                    argument_error("unknown-parameter", format!("unexpected keyword '{name}'"))
                })?;
            if slots[idx].is_some() {
                return Err(argument_error(
                    "duplicate-argument",
                    format!("parameter '{name}' bound twice"),
                ));
            }
            slots[idx] = Some(value.clone());
        }

        let mut bound = Arguments::new();
        for (name, slot) in self.params.iter().zip(slots) {
            let value = slot.ok_or_else(|| {
                argument_error("missing-argument", format!("parameter '{name}' not supplied"))
            })?;
            bound = bound.with_kwarg(name.clone(), value);
        }
        Ok(bound)
    }

    fn prepare(&self, args: Arguments<Operand<N>>) -> Result<Arguments<Operand<N>>, UqpError> {
        let bound = self.bind(args)?;
        let Some(sigfigs) = self.auto_error else {
            return Ok(bound);
        };
        bound.try_map(|operand| match operand {
            Operand::Exact(quantity) => Ok(Operand::Uncertain(
                self.convention.sigfig_uncertain(quantity, sigfigs)?,
            )),
            uncertain => Ok(uncertain.clone()),
        })
    }

    /// Calls with arguments bound positionally.
    pub fn call<E, I>(&self, args: I) -> Result<UncertainQuantity<N>, E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
        I: IntoIterator<Item = Operand<N>>,
    {
        self.call_with(Arguments::positional(args))
    }

    /// Calls with arguments bound by keyword.
    pub fn call_named<E, I, S>(&self, kwargs: I) -> Result<UncertainQuantity<N>, E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
        I: IntoIterator<Item = (S, Operand<N>)>,
        S: Into<String>,
    {
        let mut args = Arguments::new();
        for (name, value) in kwargs {
            let name = name.into();
            if args.kwarg(&name).is_ok() {
                return Err(argument_error(
                    "duplicate-argument",
                    format!("parameter '{name}' bound twice"),
                )
                .into());
            }
            args = args.with_kwarg(name, value);
        }
        self.call_with(args)
    }

    /// Calls with a mix of positional and keyword arguments.
    pub fn call_with<E>(&self, args: Arguments<Operand<N>>) -> Result<UncertainQuantity<N>, E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
    {
        let prepared = self.prepare(args)?;
        self.convention.propagate(&self.func, &prepared)
    }

    /// Calls and also reports per-parameter contributions.
    pub fn call_detailed<E>(
        &self,
        args: Arguments<Operand<N>>,
    ) -> Result<(UncertainQuantity<N>, PropagationReport), E>
    where
        F: Fn(&Arguments<Quantity<N>>) -> Result<Quantity<N>, E>,
        E: From<UqpError>,
    {
        let prepared = self.prepare(args)?;
        self.convention.propagate_detailed(&self.func, &prepared)
    }
}
