use std::fmt;

use serde::{Deserialize, Serialize};
use uqp_core::{ErrorInfo, Numeric, UqpError};
use uqp_units::Quantity;

use crate::ids::QuantityId;
use crate::uncertain::UncertainQuantity;

/// Either an exact quantity or an uncertain one.
#[derive(Debug, Clone)]
pub enum Operand<N: Numeric> {
    /// Known without uncertainty (constants, pure numbers).
    Exact(Quantity<N>),
    /// Measured value with an identity in the correlation registry.
    Uncertain(UncertainQuantity<N>),
}

impl<N: Numeric> Operand<N> {
    /// Exact pure number.
    pub fn scalar(value: N) -> Self {
        Operand::Exact(Quantity::dimensionless(value))
    }

    /// Nominal value.
    pub fn nominal(&self) -> &Quantity<N> {
        match self {
            Operand::Exact(quantity) => quantity,
            Operand::Uncertain(uq) => uq.nominal(),
        }
    }

    /// Uncertainty in the delta companion of the nominal unit; zero when exact.
    pub fn uncertainty(&self) -> Quantity<N> {
        match self {
            Operand::Exact(quantity) => Quantity::new(N::zero(), quantity.unit().delta()),
            Operand::Uncertain(uq) => uq.uncertainty().clone(),
        }
    }

    /// Nominal plus uncertainty; the nominal itself when exact.
    pub fn upper(&self) -> Result<Quantity<N>, UqpError> {
        match self {
            Operand::Exact(quantity) => Ok(quantity.clone()),
            Operand::Uncertain(uq) => uq.upper(),
        }
    }

    /// Registry identity, `None` when exact.
    pub fn id(&self) -> Option<QuantityId> {
        match self {
            Operand::Exact(_) => None,
            Operand::Uncertain(uq) => Some(uq.id()),
        }
    }

    /// Returns `true` for uncertain operands.
    pub fn is_uncertain(&self) -> bool {
        matches!(self, Operand::Uncertain(_))
    }

    /// Borrows the uncertain quantity, if any.
    pub fn as_uncertain(&self) -> Option<&UncertainQuantity<N>> {
        match self {
            Operand::Exact(_) => None,
            Operand::Uncertain(uq) => Some(uq),
        }
    }
}

impl<N: Numeric> From<Quantity<N>> for Operand<N> {
    fn from(quantity: Quantity<N>) -> Self {
        Operand::Exact(quantity)
    }
}

impl<'a, N: Numeric> From<&'a Quantity<N>> for Operand<N> {
    fn from(quantity: &'a Quantity<N>) -> Self {
        Operand::Exact(quantity.clone())
    }
}

impl<N: Numeric> From<UncertainQuantity<N>> for Operand<N> {
    fn from(uq: UncertainQuantity<N>) -> Self {
        Operand::Uncertain(uq)
    }
}

impl<'a, N: Numeric> From<&'a UncertainQuantity<N>> for Operand<N> {
    fn from(uq: &'a UncertainQuantity<N>) -> Self {
        Operand::Uncertain(uq.clone())
    }
}

impl From<f64> for Operand<f64> {
    fn from(value: f64) -> Self {
        Operand::scalar(value)
    }
}

/// Locates an argument either by position or by keyword.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ParamKey {
    /// Zero-based positional slot.
    Position(usize),
    /// Keyword name.
    Name(String),
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamKey::Position(idx) => write!(f, "#{idx}"),
            ParamKey::Name(name) => f.write_str(name),
        }
    }
}

fn argument_error(code: &str, message: String, key: &ParamKey) -> UqpError {
    UqpError::Arguments(ErrorInfo::new(code, message).with_context("parameter", key.to_string()))
}

/// Positional and keyword arguments of a propagated call.
#[derive(Debug, Clone, PartialEq)]
pub struct Arguments<T> {
    positional: Vec<T>,
    keyword: Vec<(String, T)>,
}

impl<T> Default for Arguments<T> {
    fn default() -> Self {
        Self {
            positional: Vec::new(),
            keyword: Vec::new(),
        }
    }
}

impl<T> Arguments<T> {
    /// Empty argument list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional-only arguments.
    pub fn positional(values: impl IntoIterator<Item = T>) -> Self {
        Self {
            positional: values.into_iter().collect(),
            keyword: Vec::new(),
        }
    }

    /// Appends a positional argument.
    pub fn with_arg(mut self, value: impl Into<T>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Sets a keyword argument, replacing an earlier value with the same name.
    pub fn with_kwarg(mut self, name: impl Into<String>, value: impl Into<T>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.keyword.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = value,
            None => self.keyword.push((name, value)),
        }
        self
    }

    /// Total number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.keyword.len()
    }

    /// Returns `true` when no arguments are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Positional arguments in order.
    pub fn args(&self) -> &[T] {
        &self.positional
    }

    /// Keyword arguments in insertion order.
    pub fn kwargs(&self) -> impl Iterator<Item = (&str, &T)> {
        self.keyword.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Positional argument at `index`.
    pub fn arg(&self, index: usize) -> Result<&T, UqpError> {
        self.positional.get(index).ok_or_else(|| {
            let key = ParamKey::Position(index);
            argument_error(
                "missing-argument",
                format!("no positional argument at index {index}"),
                &key,
            )
        })
    }

    /// Keyword argument named `name`.
    pub fn kwarg(&self, name: &str) -> Result<&T, UqpError> {
        self.keyword
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                let key = ParamKey::Name(name.to_string());
                argument_error(
                    "missing-argument",
                    format!("no keyword argument '{name}'"),
                    &key,
                )
            })
    }

    /// Argument at `index` counting positional arguments first, then keywords.
    pub fn at(&self, index: usize) -> Result<&T, UqpError> {
        if let Some(value) = self.positional.get(index) {
            return Ok(value);
        }
        self.keyword
            .get(index - self.positional.len())
            .map(|(_, value)| value)
            .ok_or_else(|| {
                let key = ParamKey::Position(index);
                argument_error(
                    "missing-argument",
                    format!("only {} arguments, index {index} requested", self.len()),
                    &key,
                )
            })
    }

    /// Argument addressed by `key`.
    pub fn get(&self, key: &ParamKey) -> Option<&T> {
        match key {
            ParamKey::Position(idx) => self.positional.get(*idx),
            ParamKey::Name(name) => self.kwarg(name).ok(),
        }
    }

    /// Keys of all arguments, positional first.
    pub fn keys(&self) -> Vec<ParamKey> {
        (0..self.positional.len())
            .map(ParamKey::Position)
            .chain(self.keyword.iter().map(|(name, _)| ParamKey::Name(name.clone())))
            .collect()
    }

    /// Maps every argument, keeping positions and names.
    pub fn try_map<U, E>(&self, mut f: impl FnMut(&T) -> Result<U, E>) -> Result<Arguments<U>, E> {
        let positional = self.positional.iter().map(&mut f).collect::<Result<Vec<_>, E>>()?;
        let mut keyword = Vec::with_capacity(self.keyword.len());
        for (name, value) in &self.keyword {
            keyword.push((name.clone(), f(value)?));
        }
        Ok(Arguments {
            positional,
            keyword,
        })
    }

    /// Copy with the argument at `key` replaced.
    pub fn replaced(&self, key: &ParamKey, value: T) -> Arguments<T>
    where
        T: Clone,
    {
        let mut out = self.clone();
        match key {
            ParamKey::Position(idx) => {
                if let Some(slot) = out.positional.get_mut(*idx) {
                    *slot = value;
                }
            }
            ParamKey::Name(name) => {
                if let Some(slot) = out.keyword.iter_mut().find(|(existing, _)| existing == name) {
                    slot.1 = value;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_counts_positional_then_keyword() {
        let args = Arguments::positional([1, 2]).with_kwarg("c", 3);
        assert_eq!(*args.at(2).unwrap(), 3);
        assert_eq!(*args.kwarg("c").unwrap(), 3);
        assert_eq!(args.at(3).unwrap_err().code(), "missing-argument");
        assert_eq!(
            args.keys(),
            vec![
                ParamKey::Position(0),
                ParamKey::Position(1),
                ParamKey::Name("c".into())
            ]
        );
    }

    #[test]
    fn replaced_targets_one_slot() {
        let args = Arguments::positional([1, 2]).with_kwarg("c", 3);
        let swapped = args.replaced(&ParamKey::Name("c".into()), 9);
        assert_eq!(*swapped.kwarg("c").unwrap(), 9);
        assert_eq!(*swapped.arg(0).unwrap(), 1);
        assert_eq!(*args.kwarg("c").unwrap(), 3);
    }

    #[test]
    fn keywords_replace_duplicates() {
        let args = Arguments::<i32>::new().with_kwarg("a", 1).with_kwarg("a", 2);
        assert_eq!(args.len(), 1);
        assert_eq!(*args.kwarg("a").unwrap(), 2);
    }
}
