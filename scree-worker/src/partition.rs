//! One partition of a dataset, held as a dense matrix.
//!
//! A partition moves through two states after loading: as read from disk,
//! then standardized in place by the scatter round. Score projection is only
//! meaningful on the standardized matrix. The operations here mirror the
//! protocol rounds one to one and are kept free of gRPC types.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};

use crate::error::{Result, WorkerError};
use crate::store;

pub struct Partition {
    filename: String,
    matrix: Array2<f64>,
    standardized: bool,
}

impl Partition {
    /// Read `name` from the data directory.
    pub fn load(data_dir: &Path, name: &str) -> Result<Self> {
        let path = store::partition_path(data_dir, name)?;
        let matrix = store::read_matrix(&path)?;
        Ok(Self {
            filename: name.to_string(),
            matrix,
            standardized: false,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn rows(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn cols(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn is_standardized(&self) -> bool {
        self.standardized
    }

    /// Per-column sums of the matrix as currently stored.
    pub fn column_sums(&self) -> Array1<f64> {
        self.matrix.sum_axis(Axis(0))
    }

    /// Per-column sums of squared deviations from `mean`.
    pub fn squared_deviations(&self, mean: ArrayView1<'_, f64>) -> Result<Array1<f64>> {
        self.check_width(mean.len())?;
        let centered = &self.matrix - &mean;
        Ok(centered.mapv(|x| x * x).sum_axis(Axis(0)))
    }

    /// Center and scale every column in place, then return the scatter
    /// matrix of the result.
    ///
    /// Calling this on an already standardized matrix standardizes it again;
    /// a fresh load resets the matrix to its raw state.
    pub fn standardize_and_scatter(
        &mut self,
        mean: ArrayView1<'_, f64>,
        sd: ArrayView1<'_, f64>,
    ) -> Result<Array2<f64>> {
        self.check_width(mean.len())?;
        self.check_width(sd.len())?;
        self.matrix -= &mean;
        self.matrix /= &sd;
        self.standardized = true;
        Ok(self.matrix.t().dot(&self.matrix))
    }

    /// Project every row onto the component basis (one basis row per
    /// component). Only valid once the matrix has been standardized.
    pub fn project(&self, basis: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if !self.standardized {
            return Err(WorkerError::NotStandardized);
        }
        self.check_width(basis.ncols())?;
        Ok(self.matrix.dot(&basis.t()))
    }

    fn check_width(&self, len: usize) -> Result<()> {
        if len != self.cols() {
            return Err(WorkerError::DimensionMismatch {
                expected: self.cols(),
                actual: len,
            });
        }
        Ok(())
    }
}
