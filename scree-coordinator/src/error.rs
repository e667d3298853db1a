//! Job-level error types for the coordinator

use thiserror::Error;

/// Errors that abort a PCA job.
///
/// The display strings double as the front-end messages, so they stay short
/// and phase-specific; detail travels in the source or the variant fields
/// and is logged when the job fails.
#[derive(Debug, Error)]
pub enum JobError {
    /// Requested worker count is zero or exceeds the connected pool
    #[error("Invalid worker number")]
    InvalidWorkerCount { requested: usize, available: usize },

    /// A load RPC failed
    #[error("Could not load data")]
    Load(#[source] tonic::Status),

    /// Partitions disagree on column count
    #[error("Inconsistent vector sizes")]
    InconsistentColumns {
        expected: usize,
        worker: usize,
        actual: usize,
    },

    /// A sum RPC failed
    #[error("Could not get sum")]
    Sum(#[source] tonic::Status),

    /// A variance RPC failed
    #[error("Could not get variance")]
    Variance(#[source] tonic::Status),

    /// A scatter RPC failed
    #[error("Could not get scatter matrix")]
    Scatter(#[source] tonic::Status),

    /// A worker's contribution could not be folded into the aggregate
    #[error("Failed to add matrices")]
    Aggregate { worker: usize, detail: String },

    /// Eigendecomposition failed to converge or was undefined
    #[error("Could not compute eigenvalues/vectors")]
    Eigen,

    /// A scores RPC failed
    #[error("Could not compute scores")]
    Scores(#[source] tonic::Status),
}
