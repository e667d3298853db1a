//! End-to-end tests: real workers behind real gRPC servers, driven by the
//! orchestrator, the queue and the HTTP router.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use scree_coordinator::api::{self, ApiState};
use scree_coordinator::queue::{self, JobResult, JobSpec};
use scree_coordinator::{Orchestrator, WorkerPool};
use scree_proto::worker_server::WorkerServer;
use scree_worker::WorkerNode;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::Server;

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1.0e-6, "{} != {}", a, b);
}

fn write_file(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// Serve a worker on an ephemeral port and return its address.
async fn spawn_worker(data_dir: &Path) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let node = WorkerNode::new(data_dir);
    tokio::spawn(async move {
        Server::builder()
            .add_service(WorkerServer::new(node))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    format!("http://{}", addr)
}

/// Two workers, each holding one half of the `points` dataset:
/// [[1,2],[3,4]] and [[5,6],[7,8]].
async fn two_worker_pool() -> (tempfile::TempDir, tempfile::TempDir, WorkerPool) {
    let dir1 = tempfile::tempdir().unwrap();
    let dir2 = tempfile::tempdir().unwrap();
    write_file(dir1.path(), "points-2-1.csv", "1,2\n3,4\n");
    write_file(dir2.path(), "points-2-2.csv", "5,6\n7,8\n");

    let addrs = vec![spawn_worker(dir1.path()).await, spawn_worker(dir2.path()).await];
    let pool = WorkerPool::connect(&addrs).await.unwrap();
    (dir1, dir2, pool)
}

fn job(dataset: &str, workers: usize, standardize: bool) -> JobSpec {
    JobSpec {
        dataset: dataset.to_string(),
        workers,
        standardize,
    }
}

#[tokio::test]
async fn test_two_worker_pca() {
    let (_d1, _d2, pool) = two_worker_pool().await;
    let orchestrator = Orchestrator::new(pool, 2, false);

    let result = orchestrator.process(&job("points", 2, false)).await;

    assert_eq!(result.status, "ok", "unexpected failure: {}", result.message);
    assert_eq!(result.eigenvalues.len(), 2);
    assert_eq!(result.eigenvectors.len(), 2);
    assert_eq!(result.eigenvectors[0].len(), 2);

    // centered data [[-3,-3],[-1,-1],[1,1],[3,3]] has scatter [[20,20],[20,20]],
    // so the spectrum is {40, 0} and two components carry everything
    let mut values = result.eigenvalues.clone();
    values.sort_by(f64::total_cmp);
    assert_close(values[0], 0.0);
    assert_close(values[1], 40.0);
    assert_close(result.percent_variance, 100.0);
    assert!(result.elapsed >= 0.0);
}

#[tokio::test]
async fn test_two_worker_pca_standardized() {
    let (_d1, _d2, pool) = two_worker_pool().await;
    let orchestrator = Orchestrator::new(pool, 2, false);

    let result = orchestrator.process(&job("points", 2, true)).await;

    assert_eq!(result.status, "ok", "unexpected failure: {}", result.message);

    // per-column sd is sqrt(5); the standardized columns are perfectly
    // correlated, so the spectrum is {8, 0}
    let mut values = result.eigenvalues.clone();
    values.sort_by(f64::total_cmp);
    assert_close(values[0], 0.0);
    assert_close(values[1], 8.0);
    assert_close(result.percent_variance, 100.0);
}

#[tokio::test]
async fn test_single_partition_job() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "points-1-1.csv", "1,2\n3,4\n5,6\n7,8\n");
    let pool = WorkerPool::connect(&[spawn_worker(dir.path()).await]).await.unwrap();
    let orchestrator = Orchestrator::new(pool, 2, false);

    let result = orchestrator.process(&job("points", 1, false)).await;

    assert_eq!(result.status, "ok", "unexpected failure: {}", result.message);
    let mut values = result.eigenvalues.clone();
    values.sort_by(f64::total_cmp);
    assert_close(values[1], 40.0);
    assert_close(result.percent_variance, 100.0);
}

#[tokio::test]
async fn test_column_mismatch_fails_before_aggregation() {
    let dir1 = tempfile::tempdir().unwrap();
    let dir2 = tempfile::tempdir().unwrap();
    write_file(dir1.path(), "points-2-1.csv", "1,2\n3,4\n");
    write_file(dir2.path(), "points-2-2.csv", "5,6,7\n8,9,10\n");

    let addrs = vec![spawn_worker(dir1.path()).await, spawn_worker(dir2.path()).await];
    let pool = WorkerPool::connect(&addrs).await.unwrap();
    let orchestrator = Orchestrator::new(pool, 2, false);

    let result = orchestrator.process(&job("points", 2, false)).await;

    assert_eq!(result.status, "error");
    assert_eq!(result.message, "Inconsistent vector sizes");
    assert!(result.eigenvalues.is_empty());
}

#[tokio::test]
async fn test_worker_count_exceeding_pool_is_rejected() {
    let (_d1, _d2, pool) = two_worker_pool().await;
    let orchestrator = Orchestrator::new(pool, 2, false);

    let result = orchestrator.process(&job("points", 4, false)).await;

    assert_eq!(result.status, "error");
    assert_eq!(result.message, "Invalid worker number");
    assert_close(result.elapsed, 0.0);
}

#[tokio::test]
async fn test_missing_partition_fails_load_round() {
    let (_d1, _d2, pool) = two_worker_pool().await;
    let orchestrator = Orchestrator::new(pool, 2, false);

    let result = orchestrator.process(&job("absent", 2, false)).await;

    assert_eq!(result.status, "error");
    assert_eq!(result.message, "Could not load data");
}

#[tokio::test]
async fn test_scores_round_writes_projections() {
    let dir1 = tempfile::tempdir().unwrap();
    let dir2 = tempfile::tempdir().unwrap();
    write_file(dir1.path(), "points-2-1.csv", "1,2\n3,4\n");
    write_file(dir2.path(), "points-2-2.csv", "5,6\n7,8\n");
    write_file(dir1.path(), "answers-points-2-1.csv", "0\n1\n");
    write_file(dir2.path(), "answers-points-2-2.csv", "1\n0\n");

    let addrs = vec![spawn_worker(dir1.path()).await, spawn_worker(dir2.path()).await];
    let pool = WorkerPool::connect(&addrs).await.unwrap();
    let orchestrator = Orchestrator::new(pool, 2, true);

    let result = orchestrator.process(&job("points", 2, false)).await;
    assert_eq!(result.status, "ok", "unexpected failure: {}", result.message);

    // centered rows of worker 1 are [-3,-3] and [-1,-1]; along the dominant
    // diagonal direction they score 3*sqrt(2) and sqrt(2) up to sign, and 0
    // on the null direction
    let projected = std::fs::read_to_string(dir1.path().join("projected-points-2-1.csv")).unwrap();
    let rows: Vec<Vec<f64>> = projected
        .lines()
        .map(|l| l.split(',').map(|v| v.parse().unwrap()).collect())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].len(), 3);
    assert_close(rows[0][0].abs(), 3.0 * 2.0_f64.sqrt());
    assert_close(rows[0][1].abs(), 0.0);
    assert_close(rows[0][2], 0.0);
    assert_close(rows[1][0].abs(), 2.0_f64.sqrt());
    assert_close(rows[1][2], 1.0);

    let projected2 = std::fs::read_to_string(dir2.path().join("projected-points-2-2.csv")).unwrap();
    assert_eq!(projected2.lines().count(), 2);
}

#[tokio::test]
async fn test_queue_serializes_jobs_in_submission_order() {
    let dir1 = tempfile::tempdir().unwrap();
    let dir2 = tempfile::tempdir().unwrap();

    // a deliberately larger first dataset so an (incorrect) concurrent run
    // would finish the second job first
    let mut heavy1 = String::new();
    let mut heavy2 = String::new();
    for r in 0..400 {
        for (part, offset) in [(&mut heavy1, 0), (&mut heavy2, 3)] {
            let row: Vec<String> = (0..6)
                .map(|c| (((r * 6 + c + offset) % 17) as f64).to_string())
                .collect();
            part.push_str(&row.join(","));
            part.push('\n');
        }
    }
    write_file(dir1.path(), "heavy-2-1.csv", &heavy1);
    write_file(dir2.path(), "heavy-2-2.csv", &heavy2);
    write_file(dir1.path(), "points-2-1.csv", "1,2\n3,4\n");
    write_file(dir2.path(), "points-2-2.csv", "5,6\n7,8\n");

    let addrs = vec![spawn_worker(dir1.path()).await, spawn_worker(dir2.path()).await];
    let pool = WorkerPool::connect(&addrs).await.unwrap();
    let orchestrator = Orchestrator::new(pool, 2, false);

    let (job_queue, poller) = queue::channel(Duration::from_millis(20));
    tokio::spawn(poller.run(orchestrator));

    let rx_heavy = job_queue.submit(job("heavy", 2, true));
    let rx_light = job_queue.submit(job("points", 2, false));

    let order = Arc::new(Mutex::new(Vec::new()));
    let o1 = order.clone();
    let t1 = tokio::spawn(async move {
        let result = rx_heavy.await.unwrap();
        o1.lock().unwrap().push("heavy");
        result
    });
    let o2 = order.clone();
    let t2 = tokio::spawn(async move {
        let result = rx_light.await.unwrap();
        o2.lock().unwrap().push("light");
        result
    });

    let heavy_result = t1.await.unwrap();
    let light_result = t2.await.unwrap();

    assert_eq!(heavy_result.status, "ok", "heavy job: {}", heavy_result.message);
    assert_eq!(light_result.status, "ok", "light job: {}", light_result.message);
    assert_eq!(*order.lock().unwrap(), vec!["heavy", "light"]);
}

#[tokio::test]
async fn test_http_submission_end_to_end() {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    let (_d1, _d2, pool) = two_worker_pool().await;
    let orchestrator = Orchestrator::new(pool, 2, false);
    let (job_queue, poller) = queue::channel(Duration::from_millis(10));
    tokio::spawn(poller.run(orchestrator));

    let app = api::router(ApiState { queue: job_queue });
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/pca/points/2/false")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let result: JobResult = serde_json::from_slice(&body).unwrap();
    assert_eq!(result.status, "ok", "unexpected failure: {}", result.message);
    assert_close(result.percent_variance, 100.0);
    assert_eq!(result.eigenvalues.len(), 2);
}
