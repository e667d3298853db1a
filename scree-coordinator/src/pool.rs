//! Worker gRPC clients and the round fan-out primitive.
//!
//! All connections are dialed once at startup and any dial failure is
//! fatal. tonic channels multiplex, so each request clones a cheap client
//! handle off the pool.

use std::future::Future;

use futures::future;
use scree_proto::worker_client::WorkerClient;
use tonic::transport::Channel;
use tonic::Status;
use tracing::info;

const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// The connected worker fleet, in configuration order.
pub struct WorkerPool {
    clients: Vec<WorkerClient<Channel>>,
}

impl WorkerPool {
    /// Dial every worker address. Addresses without a scheme get `http://`.
    pub async fn connect(addrs: &[String]) -> Result<Self, tonic::transport::Error> {
        let mut clients = Vec::with_capacity(addrs.len());
        for addr in addrs {
            let endpoint = if addr.starts_with("http://") || addr.starts_with("https://") {
                addr.clone()
            } else {
                format!("http://{}", addr)
            };
            info!("Connecting to worker at {}", endpoint);
            let client = WorkerClient::connect(endpoint)
                .await?
                .max_decoding_message_size(MAX_MESSAGE_BYTES)
                .max_encoding_message_size(MAX_MESSAGE_BYTES);
            clients.push(client);
        }
        Ok(Self { clients })
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Run `op` concurrently against the first `count` workers.
    ///
    /// Returns every response in worker order, or the first error; on an
    /// error the remaining in-flight calls are dropped. `count` must not
    /// exceed the pool size.
    pub async fn broadcast<T, F, Fut>(&self, count: usize, op: F) -> Result<Vec<T>, Status>
    where
        F: Fn(usize, WorkerClient<Channel>) -> Fut,
        Fut: Future<Output = Result<T, Status>>,
    {
        let calls: Vec<_> = self.clients[..count]
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, client)| op(index, client))
            .collect();
        future::try_join_all(calls).await
    }
}
