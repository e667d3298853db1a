//! scree PCA coordinator.
//!
//! Owns the worker pool and the job queue, drives the multi-round protocol
//! and serves the JSON submission API.
//!
//! ## Module Structure
//!
//! - `pool` - worker gRPC clients and the round fan-out primitive
//! - `orchestrator` - the multi-round PCA protocol for one job
//! - `eigen` - symmetric eigendecomposition seam
//! - `selection` - top-k eigenpair selection
//! - `queue` - FIFO job queue with the single-flight poller
//! - `api` - HTTP submission endpoint
//! - `error` - job error types

pub mod api;
pub mod eigen;
pub mod error;
pub mod orchestrator;
pub mod pool;
pub mod queue;
pub mod selection;

pub use orchestrator::Orchestrator;
pub use pool::WorkerPool;
