//! Matrix value type for the dataflow graph.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The (rows, columns) pair describing a matrix's dimensions.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// A 1×1 matrix stands in for a scalar.
    pub fn is_scalar(&self) -> bool {
        self.rows == 1 && self.cols == 1
    }

    /// A length-3 vector, either 3×1 or 1×3.
    pub fn is_vector3(&self) -> bool {
        (self.rows == 3 && self.cols == 1) || (self.rows == 1 && self.cols == 3)
    }

    pub fn transposed(&self) -> Shape {
        Shape::new(self.cols, self.rows)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Rejected matrix constructions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    #[error("matrix must have at least one row and one column")]
    Empty,
    #[error("row {row} has {got} entries, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("entry at row {row}, column {col} is not finite")]
    NonFinite { row: usize, col: usize },
    #[error("data length {got} does not match shape {shape}")]
    LengthMismatch { shape: Shape, got: usize },
}

/// An immutable 2-D array of finite `f64` values, stored row-major.
///
/// A `Matrix` that exists is always structurally valid: at least 1×1,
/// rectangular, and free of NaN/infinity. All constructors enforce this,
/// including deserialization.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(try_from = "RawMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Unvalidated wire form; promoted to `Matrix` through `TryFrom`.
#[derive(Deserialize)]
struct RawMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<RawMatrix> for Matrix {
    type Error = MatrixError;

    fn try_from(raw: RawMatrix) -> Result<Self, MatrixError> {
        Matrix::from_vec(raw.rows, raw.cols, raw.data)
    }
}

impl Matrix {
    /// Build a matrix from nested row slices.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, MatrixError> {
        let row_count = rows.len();
        let col_count = rows.first().map(|r| r.len()).unwrap_or(0);
        if row_count == 0 || col_count == 0 {
            return Err(MatrixError::Empty);
        }
        let mut data = Vec::with_capacity(row_count * col_count);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != col_count {
                return Err(MatrixError::Ragged {
                    row: i,
                    expected: col_count,
                    got: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(row_count, col_count, data)
    }

    /// Build a matrix from a row-major flat buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, MatrixError> {
        if rows == 0 || cols == 0 {
            return Err(MatrixError::Empty);
        }
        if data.len() != rows * cols {
            return Err(MatrixError::LengthMismatch {
                shape: Shape::new(rows, cols),
                got: data.len(),
            });
        }
        if let Some(idx) = data.iter().position(|v| !v.is_finite()) {
            return Err(MatrixError::NonFinite {
                row: idx / cols,
                col: idx % cols,
            });
        }
        Ok(Self { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        Self::from_vec(rows, cols, vec![0.0; rows * cols])
    }

    pub fn identity(n: usize) -> Result<Self, MatrixError> {
        let mut m = Self::zeros(n, n)?;
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        Ok(m)
    }

    /// A 1×1 matrix holding a single value.
    pub fn scalar(value: f64) -> Result<Self, MatrixError> {
        Self::from_vec(1, 1, vec![value])
    }

    pub fn shape(&self) -> Shape {
        Shape::new(self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    /// Row-major backing buffer.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Largest absolute entry. Nonzero matrices give a positive value.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "[")?;
            for j in 0..self.cols {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.get(i, j))?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}
