//! Multi-round PCA orchestration.
//!
//! One job runs the protocol end to end against the first W workers of the
//! pool: load, sum, optional variance, scatter, eigendecomposition, top-k
//! selection and the optional scores round. Every round is a full barrier;
//! the first failure aborts the job with a phase-specific message. No
//! retries, no partial results.

use std::time::Instant;

use ndarray::{Array1, Array2};
use scree_proto::{DataFile, Empty, Matrix, Vector};
use tonic::Request;
use tracing::{debug, info, warn};

use crate::eigen;
use crate::error::JobError;
use crate::pool::WorkerPool;
use crate::queue::{JobResult, JobSpec};
use crate::selection;

pub struct Orchestrator {
    pool: WorkerPool,
    components: usize,
    save_scores: bool,
}

impl Orchestrator {
    pub fn new(pool: WorkerPool, components: usize, save_scores: bool) -> Self {
        Self {
            pool,
            components,
            save_scores,
        }
    }

    /// Run one job to completion, converting any failure into an error
    /// result for the submitter.
    pub async fn process(&self, job: &JobSpec) -> JobResult {
        match self.run(job).await {
            Ok(result) => result,
            Err(err) => {
                warn!("Job for dataset {} failed: {:?}", job.dataset, err);
                JobResult::failure(&err)
            }
        }
    }

    async fn run(&self, job: &JobSpec) -> Result<JobResult, JobError> {
        let workers = job.workers;
        if workers == 0 || workers > self.pool.len() {
            return Err(JobError::InvalidWorkerCount {
                requested: workers,
                available: self.pool.len(),
            });
        }

        let start = Instant::now();

        // Round 1: every worker loads its partition of the dataset
        let sizes = self
            .pool
            .broadcast(workers, |index, mut client| {
                let name = format!("{}-{}-{}.csv", job.dataset, workers, index + 1);
                async move {
                    Ok(client
                        .load_data(Request::new(DataFile { name }))
                        .await?
                        .into_inner())
                }
            })
            .await
            .map_err(JobError::Load)?;

        let cols = sizes.first().map_or(0, |s| s.cols as usize);
        for (worker, size) in sizes.iter().enumerate() {
            if size.cols as usize != cols {
                return Err(JobError::InconsistentColumns {
                    expected: cols,
                    worker,
                    actual: size.cols as usize,
                });
            }
        }
        let total_rows: u64 = sizes.iter().map(|s| u64::from(s.rows)).sum();
        info!(
            "Loaded {} rows x {} cols across {} workers",
            total_rows, cols, workers
        );

        // Round 2: global mean from per-worker column sums
        let sums = self
            .pool
            .broadcast(workers, |_, mut client| async move {
                Ok(Array1::from(
                    client.get_sum(Request::new(Empty {})).await?.into_inner(),
                ))
            })
            .await
            .map_err(JobError::Sum)?;
        let mean = fold_vectors(sums, cols)? / total_rows as f64;

        // Round 3: standard deviation, only when standardizing; otherwise
        // all ones so the scatter round only centers
        let sd = if job.standardize {
            let mean_msg = Vector::from(mean.clone());
            let deviations = self
                .pool
                .broadcast(workers, |_, mut client| {
                    let mean_msg = mean_msg.clone();
                    async move {
                        Ok(Array1::from(
                            client
                                .get_variance(Request::new(mean_msg))
                                .await?
                                .into_inner(),
                        ))
                    }
                })
                .await
                .map_err(JobError::Variance)?;
            (fold_vectors(deviations, cols)? / total_rows as f64).mapv(f64::sqrt)
        } else {
            Array1::ones(cols)
        };

        // Round 4: workers standardize in place and return scatter parts
        let mean_sd = Matrix {
            rows: vec![Vector::from(mean.clone()), Vector::from(sd.clone())],
        };
        let parts = self
            .pool
            .broadcast(workers, |_, mut client| {
                let mean_sd = mean_sd.clone();
                async move {
                    client
                        .get_scatter_matrix(Request::new(mean_sd))
                        .await
                        .map(|r| r.into_inner())
                }
            })
            .await
            .map_err(JobError::Scatter)?;
        let scatter = fold_scatter(parts, cols)?;

        // Eigendecomposition of the global scatter, then pick the top
        // components by eigenvalue
        let eigen = eigen::decompose(scatter.view()).ok_or(JobError::Eigen)?;
        let k = self.components.min(eigen.values.len());
        let selected = selection::top_indices(eigen.values.view(), k);
        let percent = selection::percent_variance(eigen.values.view(), &selected);
        info!(
            "Top {} components explain {:.2}% of the variance",
            selected.len(),
            percent
        );

        // Round 5: ship the component basis back for score projection
        if self.save_scores {
            let basis_msg = Matrix::from(selection::basis(eigen.vectors.view(), &selected).view());
            let outputs = self
                .pool
                .broadcast(workers, |_, mut client| {
                    let basis_msg = basis_msg.clone();
                    async move {
                        client
                            .compute_scores(Request::new(basis_msg))
                            .await
                            .map(|r| r.into_inner())
                    }
                })
                .await
                .map_err(JobError::Scores)?;
            for out in &outputs {
                debug!("Worker wrote {}", out.name);
            }
        }

        Ok(JobResult {
            status: "ok".to_string(),
            message: String::new(),
            eigenvalues: eigen.values.to_vec(),
            eigenvectors: eigen.vectors.outer_iter().map(|row| row.to_vec()).collect(),
            percent_variance: percent,
            elapsed: start.elapsed().as_secs_f64(),
        })
    }
}

/// Sum equal-length vectors from every worker.
fn fold_vectors(parts: Vec<Array1<f64>>, cols: usize) -> Result<Array1<f64>, JobError> {
    let mut acc = Array1::zeros(cols);
    for (worker, part) in parts.into_iter().enumerate() {
        if part.len() != cols {
            return Err(JobError::Aggregate {
                worker,
                detail: format!("vector has length {}, expected {}", part.len(), cols),
            });
        }
        acc += &part;
    }
    Ok(acc)
}

/// Sum cols x cols scatter contributions from every worker.
fn fold_scatter(parts: Vec<Matrix>, cols: usize) -> Result<Array2<f64>, JobError> {
    let mut acc = Array2::zeros((cols, cols));
    for (worker, part) in parts.into_iter().enumerate() {
        let m = Array2::try_from(part).map_err(|e| JobError::Aggregate {
            worker,
            detail: e.to_string(),
        })?;
        if m.dim() != (cols, cols) {
            return Err(JobError::Aggregate {
                worker,
                detail: format!(
                    "scatter is {}x{}, expected {}x{}",
                    m.nrows(),
                    m.ncols(),
                    cols,
                    cols
                ),
            });
        }
        acc += &m;
    }
    Ok(acc)
}
