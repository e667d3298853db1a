//! scree PCA worker.
//!
//! Holds at most one partition of a dataset in memory and serves the
//! statistical rounds the coordinator drives: load, per-column sums,
//! squared deviations, in-place standardization with scatter, and score
//! projection.
//!
//! ## Module Structure
//!
//! - `store` - partition CSV files: matrices, answer labels, score output
//! - `partition` - the in-memory matrix and its statistical operations
//! - `service` - gRPC service implementation
//! - `error` - worker error types

pub mod error;
pub mod partition;
pub mod service;
pub mod store;

pub use service::WorkerNode;
