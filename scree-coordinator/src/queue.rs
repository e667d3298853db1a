//! Job queue with a single-flight poller.
//!
//! Submissions land on an unbounded FIFO and never block. One poller task
//! owns the queue tail and the busy flag; on every tick it dequeues at most
//! one job, runs it to completion through the orchestrator and delivers the
//! result over the job's oneshot channel. Jobs are strictly serialized in
//! arrival order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::JobError;
use crate::orchestrator::Orchestrator;

/// One PCA job submission.
#[derive(Debug, Clone)]
pub struct JobSpec {
    pub dataset: String,
    pub workers: usize,
    pub standardize: bool,
}

/// Front-end response for one job, delivered exactly once per submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub status: String,
    pub message: String,
    pub eigenvalues: Vec<f64>,
    pub eigenvectors: Vec<Vec<f64>>,
    pub percent_variance: f64,
    pub elapsed: f64,
}

impl JobResult {
    pub fn failure(err: &JobError) -> Self {
        Self {
            status: "error".to_string(),
            message: err.to_string(),
            eigenvalues: Vec::new(),
            eigenvectors: Vec::new(),
            percent_variance: 0.0,
            elapsed: 0.0,
        }
    }
}

struct Job {
    spec: JobSpec,
    reply: oneshot::Sender<JobResult>,
}

/// Submission handle, cheap to clone into every HTTP handler.
#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
}

impl JobQueue {
    /// Enqueue a job. Never blocks; the returned receiver yields the result
    /// once the poller has run the job. The receiver errors if the poller
    /// is gone.
    pub fn submit(&self, spec: JobSpec) -> oneshot::Receiver<JobResult> {
        let (reply, rx) = oneshot::channel();
        if let Err(err) = self.tx.send(Job { spec, reply }) {
            warn!(
                "Job queue is closed, dropping submission for dataset {}",
                err.0.spec.dataset
            );
        }
        rx
    }
}

/// Owns the queue tail and runs jobs one at a time.
pub struct QueuePoller {
    rx: mpsc::UnboundedReceiver<Job>,
    interval: Duration,
    busy: bool,
}

/// Build the queue and the poller for its tail.
pub fn channel(interval: Duration) -> (JobQueue, QueuePoller) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        JobQueue { tx },
        QueuePoller {
            rx,
            interval,
            busy: false,
        },
    )
}

impl QueuePoller {
    /// Poll the queue on a fixed interval until every submission handle is
    /// dropped. The busy flag guards the single-flight discipline: a new
    /// job is only dequeued once the previous one has been delivered.
    pub async fn run(mut self, orchestrator: Orchestrator) {
        let mut tick = time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tick.tick().await;
            if self.busy {
                debug!("Job in flight, skipping poll");
                continue;
            }

            match self.rx.try_recv() {
                Ok(job) => {
                    self.busy = true;
                    info!(
                        "Processing job: dataset={} workers={} standardize={}",
                        job.spec.dataset, job.spec.workers, job.spec.standardize
                    );
                    let result = orchestrator.process(&job.spec).await;
                    if job.reply.send(result).is_err() {
                        warn!("Submitter went away before the result was delivered");
                    }
                    self.busy = false;
                }
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    info!("All queue handles dropped, stopping poller");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_to_front_end_contract() {
        let result = JobResult {
            status: "ok".to_string(),
            message: String::new(),
            eigenvalues: vec![9.0, 5.0],
            eigenvectors: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            percent_variance: 77.8,
            elapsed: 0.25,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["percentVariance"], 77.8);
        assert_eq!(json["eigenvalues"][0], 9.0);
        assert_eq!(json["elapsed"], 0.25);
    }

    #[test]
    fn test_failure_result_carries_phase_message() {
        let result = JobResult::failure(&JobError::InvalidWorkerCount {
            requested: 3,
            available: 2,
        });
        assert_eq!(result.status, "error");
        assert_eq!(result.message, "Invalid worker number");
        assert!(result.eigenvalues.is_empty());
    }

    #[tokio::test]
    async fn test_submit_after_poller_gone_errors() {
        let (queue, poller) = channel(Duration::from_millis(10));
        drop(poller);
        let rx = queue.submit(JobSpec {
            dataset: "points".to_string(),
            workers: 1,
            standardize: false,
        });
        assert!(rx.await.is_err());
    }
}
