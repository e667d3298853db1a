//! Symmetric eigendecomposition seam.
//!
//! Everything else in the coordinator works on ndarray types; nalgebra is
//! confined to this module.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, ArrayView2};

const CONVERGENCE_EPS: f64 = 1.0e-12;
const MAX_ITERATIONS: usize = 512;

/// Eigendecomposition of a symmetric matrix.
pub struct Eigen {
    /// Eigenvalues in the order the backend produced them (unsorted).
    pub values: Array1<f64>,
    /// Column `i` is the eigenvector for `values[i]`.
    pub vectors: Array2<f64>,
}

/// Decompose a symmetric scatter matrix.
///
/// Returns None for non-finite input or when the iteration does not
/// converge; the caller treats both as a failed job.
pub fn decompose(scatter: ArrayView2<'_, f64>) -> Option<Eigen> {
    if scatter.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let n = scatter.nrows();
    let m = DMatrix::from_row_iterator(n, n, scatter.iter().copied());
    let se = SymmetricEigen::try_new(m, CONVERGENCE_EPS, MAX_ITERATIONS)?;

    let values = Array1::from_iter(se.eigenvalues.iter().copied());
    let vectors = Array2::from_shape_fn((n, n), |(i, j)| se.eigenvectors[(i, j)]);
    Some(Eigen { values, vectors })
}
