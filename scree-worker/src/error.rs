//! Error types for the worker service

use thiserror::Error;

/// Result type for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors that can occur while serving the statistical protocol
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Partition name would address a file outside the data directory
    #[error("Invalid partition name: {0}")]
    InvalidName(String),

    /// Partition file holds no rows
    #[error("Empty partition: {0}")]
    EmptyPartition(String),

    /// A CSV row's length differs from the first row's
    #[error("Inconsistent vector sizes")]
    InconsistentRows,

    /// No partition loaded yet
    #[error("No matrix available")]
    NoMatrix,

    /// Supplied vector width does not match the partition's column count
    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Scatter request must carry exactly the mean and standard deviation rows
    #[error("Invalid matrix. Need mean and standard deviation rows.")]
    NotMeanAndSd,

    /// Scores requested before the matrix was standardized
    #[error("Matrix is not standardized")]
    NotStandardized,

    /// An answers row does not hold exactly one label
    #[error("Inconsistent answer vector size")]
    BadAnswerRow,

    /// Label count differs from the partition's row count
    #[error("Inconsistent answer and vector sizes: {rows} rows, {answers} answers")]
    AnswerCountMismatch { rows: usize, answers: usize },

    /// A CSV field failed to parse as a number
    #[error("Invalid number in {file} row {row}: {source}")]
    BadNumber {
        file: String,
        row: usize,
        source: std::num::ParseFloatError,
    },

    /// Malformed wire matrix
    #[error(transparent)]
    Convert(#[from] scree_proto::convert::ConvertError),

    /// Matrix assembly error
    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// CSV read/write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Map worker errors to gRPC statuses at the service boundary
impl From<WorkerError> for tonic::Status {
    fn from(err: WorkerError) -> Self {
        match &err {
            WorkerError::NoMatrix | WorkerError::NotStandardized => {
                tonic::Status::failed_precondition(err.to_string())
            }
            WorkerError::InvalidName(_)
            | WorkerError::EmptyPartition(_)
            | WorkerError::InconsistentRows
            | WorkerError::DimensionMismatch { .. }
            | WorkerError::NotMeanAndSd
            | WorkerError::BadAnswerRow
            | WorkerError::AnswerCountMismatch { .. }
            | WorkerError::BadNumber { .. }
            | WorkerError::Convert(_) => tonic::Status::invalid_argument(err.to_string()),
            WorkerError::Shape(_) | WorkerError::Csv(_) | WorkerError::Io(_) => {
                tonic::Status::internal(err.to_string())
            }
        }
    }
}
