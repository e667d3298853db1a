//! gRPC service implementation for the worker.
//!
//! Implements the Worker protocol driven by the coordinator: LoadData,
//! GetSum, GetVariance, GetScatterMatrix and ComputeScores. The service owns
//! the single partition slot; handlers map worker errors to gRPC statuses at
//! the boundary and never panic on bad input.

use std::path::PathBuf;

use ndarray::{Array1, Array2};
use parking_lot::RwLock;
use scree_proto::worker_server::Worker;
use scree_proto::{DataFile, Empty, Matrix, Size, Vector};
use tonic::{Request, Response, Status};
use tracing::{debug, info};

use crate::error::WorkerError;
use crate::partition::Partition;
use crate::store;

/// PCA worker gRPC service. Holds at most one loaded partition.
pub struct WorkerNode {
    data_dir: PathBuf,
    partition: RwLock<Option<Partition>>,
}

impl WorkerNode {
    /// Create a worker serving partition files from `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            partition: RwLock::new(None),
        }
    }
}

#[tonic::async_trait]
impl Worker for WorkerNode {
    /// Load a partition file, replacing any previously held matrix.
    async fn load_data(&self, request: Request<DataFile>) -> Result<Response<Size>, Status> {
        let name = request.into_inner().name;
        info!("Loading partition {}", name);

        let loaded = Partition::load(&self.data_dir, &name)?;
        let size = Size {
            rows: loaded.rows() as u32,
            cols: loaded.cols() as u32,
        };

        let mut slot = self.partition.write();
        *slot = Some(loaded);

        debug!("Partition {} held: {}x{}", name, size.rows, size.cols);
        Ok(Response::new(size))
    }

    /// Per-column sums of the held matrix.
    async fn get_sum(&self, _request: Request<Empty>) -> Result<Response<Vector>, Status> {
        let slot = self.partition.read();
        let partition = slot.as_ref().ok_or(WorkerError::NoMatrix)?;
        Ok(Response::new(partition.column_sums().into()))
    }

    /// Per-column sums of squared deviations from the supplied global mean.
    async fn get_variance(&self, request: Request<Vector>) -> Result<Response<Vector>, Status> {
        let mean = Array1::from(request.into_inner());
        let slot = self.partition.read();
        let partition = slot.as_ref().ok_or(WorkerError::NoMatrix)?;
        let deviations = partition.squared_deviations(mean.view())?;
        Ok(Response::new(deviations.into()))
    }

    /// Standardize the held matrix in place with the request's mean and
    /// standard deviation rows, then return its scatter matrix.
    async fn get_scatter_matrix(
        &self,
        request: Request<Matrix>,
    ) -> Result<Response<Matrix>, Status> {
        let meansd = Array2::try_from(request.into_inner()).map_err(WorkerError::from)?;
        if meansd.nrows() != 2 {
            return Err(WorkerError::NotMeanAndSd.into());
        }

        let mut slot = self.partition.write();
        let partition = slot.as_mut().ok_or(WorkerError::NoMatrix)?;
        let scatter = partition.standardize_and_scatter(meansd.row(0), meansd.row(1))?;

        debug!("Scatter matrix computed: {}x{}", scatter.nrows(), scatter.ncols());
        Ok(Response::new(Matrix::from(scatter.view())))
    }

    /// Project the standardized matrix onto the component basis, append the
    /// answer labels and write the scores file next to the partition.
    async fn compute_scores(
        &self,
        request: Request<Matrix>,
    ) -> Result<Response<DataFile>, Status> {
        let basis = Array2::try_from(request.into_inner()).map_err(WorkerError::from)?;

        let slot = self.partition.read();
        let partition = slot.as_ref().ok_or(WorkerError::NoMatrix)?;
        let scores = partition.project(basis.view())?;

        let answers_path =
            store::partition_path(&self.data_dir, &format!("answers-{}", partition.filename()))?;
        let answers = store::read_answers(&answers_path)?;
        if answers.len() != partition.rows() {
            return Err(WorkerError::AnswerCountMismatch {
                rows: partition.rows(),
                answers: answers.len(),
            }
            .into());
        }

        let out_name = format!("projected-{}", partition.filename());
        let out_path = store::partition_path(&self.data_dir, &out_name)?;
        store::write_scores(&out_path, scores.view(), &answers)?;

        info!("Scores written to {}", out_name);
        Ok(Response::new(DataFile { name: out_name }))
    }
}
