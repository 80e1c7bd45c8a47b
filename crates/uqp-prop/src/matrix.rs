use std::fmt;

use serde::{Deserialize, Serialize};
use uqp_core::{ErrorInfo, UqpError};

/// Dense symmetric matrix of pairwise correlation coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    size: usize,
    values: Vec<f64>,
}

fn index_error(row: usize, col: usize, size: usize) -> UqpError {
    UqpError::Arguments(
        ErrorInfo::new(
            "matrix-index",
            format!("entry ({row}, {col}) outside a {size}x{size} matrix"),
        )
        .with_context("size", size.to_string()),
    )
}

impl CorrelationMatrix {
    /// Identity matrix of the given size.
    pub fn identity(size: usize) -> Self {
        let mut values = vec![0.0; size * size];
        for idx in 0..size {
            values[idx * size + idx] = 1.0;
        }
        Self { size, values }
    }

    /// Number of rows (and columns).
    pub fn size(&self) -> usize {
        self.size
    }

    /// Coefficient at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, UqpError> {
        if row >= self.size || col >= self.size {
            return Err(index_error(row, col, self.size));
        }
        Ok(self.values[row * self.size + col])
    }

    /// Sets both `(row, col)` and `(col, row)`.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), UqpError> {
        if row >= self.size || col >= self.size {
            return Err(index_error(row, col, self.size));
        }
        self.put(row, col, value);
        Ok(())
    }

    /// Stores a symmetric pair; indices must be below [`CorrelationMatrix::size`].
    pub(crate) fn put(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.size + col] = value;
        self.values[col * self.size + row] = value;
    }

    /// Row `row` as a slice.
    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.size).then(|| &self.values[row * self.size..(row + 1) * self.size])
    }

    /// Row-major coefficients.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }
}

impl fmt::Display for CorrelationMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.values.chunks(self.size.max(1)) {
            for value in row {
                write!(f, "{value:?} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_are_mirrored() {
        let mut matrix = CorrelationMatrix::identity(3);
        matrix.put(0, 2, -0.25);
        matrix.set(1, 0, 0.5).unwrap();
        assert_eq!(matrix.get(2, 0).unwrap(), -0.25);
        assert_eq!(matrix.row(0), Some(&[1.0, 0.5, -0.25][..]));
        assert_eq!(matrix.set(3, 0, 0.1).unwrap_err().code(), "matrix-index");
    }
}
