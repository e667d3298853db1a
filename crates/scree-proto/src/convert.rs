//! Conversions between wire messages and ndarray types.
//!
//! The protocol ships vectors and matrices as repeated doubles; all of the
//! actual numeric work on both sides of the wire happens on `ndarray` types.
//! Wire matrices are untrusted input, so the matrix conversion validates row
//! lengths instead of assuming a well-formed sender.

use ndarray::{Array1, Array2, ArrayView2};
use thiserror::Error;

use crate::{Matrix, Vector};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("matrix row {row} has {actual} elements, expected {expected}")]
    RaggedMatrix {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl From<Array1<f64>> for Vector {
    fn from(v: Array1<f64>) -> Self {
        Vector { elements: v.to_vec() }
    }
}

impl From<Vector> for Array1<f64> {
    fn from(v: Vector) -> Self {
        Array1::from_vec(v.elements)
    }
}

impl From<ArrayView2<'_, f64>> for Matrix {
    fn from(a: ArrayView2<'_, f64>) -> Self {
        Matrix {
            rows: a
                .outer_iter()
                .map(|row| Vector { elements: row.to_vec() })
                .collect(),
        }
    }
}

impl TryFrom<Matrix> for Array2<f64> {
    type Error = ConvertError;

    /// Rebuild a dense matrix from wire rows. Every row must have the same
    /// length as the first; an empty message becomes a 0x0 matrix.
    fn try_from(m: Matrix) -> Result<Self, ConvertError> {
        let nrows = m.rows.len();
        let ncols = m.rows.first().map_or(0, |r| r.elements.len());
        let mut flat = Vec::with_capacity(nrows * ncols);
        for (i, row) in m.rows.iter().enumerate() {
            if row.elements.len() != ncols {
                return Err(ConvertError::RaggedMatrix {
                    row: i,
                    expected: ncols,
                    actual: row.elements.len(),
                });
            }
            flat.extend_from_slice(&row.elements);
        }
        Ok(Array2::from_shape_vec((nrows, ncols), flat)?)
    }
}
