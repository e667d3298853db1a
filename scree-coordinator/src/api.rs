//! JSON job-submission API.
//!
//! The front end calls `GET /api/pca/{dataset}/{workers}/{standardize}`. The
//! handler validates the worker count, enqueues the job and waits for the
//! poller to deliver the result. Job failures are reported in-band with
//! `status: "error"`; only a dead queue is an HTTP-level error.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::{debug, error};

use crate::queue::{JobQueue, JobResult, JobSpec};

/// Worker counts the front end may request.
const ALLOWED_WORKERS: [usize; 4] = [1, 2, 4, 8];

#[derive(Clone)]
pub struct ApiState {
    pub queue: JobQueue,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/pca/:dataset/:workers/:standardize", get(pca))
        .with_state(state)
}

async fn pca(
    State(state): State<ApiState>,
    Path((dataset, workers, standardize)): Path<(String, usize, bool)>,
) -> Result<Json<JobResult>, (StatusCode, String)> {
    if !ALLOWED_WORKERS.contains(&workers) {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("workers must be one of {:?}, got {}", ALLOWED_WORKERS, workers),
        ));
    }

    debug!(
        "Submitting job: dataset={} workers={} standardize={}",
        dataset, workers, standardize
    );
    let receiver = state.queue.submit(JobSpec {
        dataset,
        workers,
        standardize,
    });

    match receiver.await {
        Ok(result) => Ok(Json(result)),
        Err(_) => {
            error!("Job queue dropped the reply channel");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "job queue unavailable".to_string(),
            ))
        }
    }
}
