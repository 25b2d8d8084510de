//! Background diff delivery
//!
//! A sync pass enqueues its diffs and returns; a single worker task drains
//! the queue into the sink in enqueue order. Each delivery is bounded by a
//! timeout, and a full queue drops the diff with a warning instead of making
//! the caller wait.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use calrelay_domain::DiffEvent;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::ports::DiffSink;

/// Diffs that may wait for the worker before new ones are dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

const DEFAULT_DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

enum Job {
    Deliver(DiffEvent),
    Flush(oneshot::Sender<()>),
}

/// Hands diffs to a [`DiffSink`] off the caller's task.
///
/// The worker is spawned on first use, so construction needs no runtime.
pub struct DiffDispatcher {
    sink: Arc<dyn DiffSink>,
    timeout: Duration,
    capacity: usize,
    queue: OnceLock<mpsc::Sender<Job>>,
}

impl DiffDispatcher {
    pub fn new(sink: Arc<dyn DiffSink>) -> Self {
        Self {
            sink,
            timeout: DEFAULT_DELIVERY_TIMEOUT,
            capacity: DEFAULT_QUEUE_CAPACITY,
            queue: OnceLock::new(),
        }
    }

    /// Upper bound on a single sink delivery.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    fn sender(&self) -> &mpsc::Sender<Job> {
        self.queue.get_or_init(|| {
            let (tx, rx) = mpsc::channel(self.capacity);
            tokio::spawn(run_worker(rx, Arc::clone(&self.sink), self.timeout));
            tx
        })
    }

    /// Enqueue diffs for delivery without waiting on the sink.
    pub fn dispatch(&self, events: Vec<DiffEvent>) {
        if events.is_empty() {
            return;
        }

        let sender = self.sender();
        for event in events {
            let description = event
                .snapshot
                .as_ref()
                .map_or_else(|| event.item_id.clone(), |snapshot| snapshot.describe());
            info!(
                resource = %event.resource_id,
                item_id = %event.item_id,
                kind = %event.kind,
                description = %description,
                "change detected"
            );

            match sender.try_send(Job::Deliver(event)) {
                Ok(()) => {}
                Err(TrySendError::Full(Job::Deliver(event))) => {
                    warn!(item_id = %event.item_id, kind = %event.kind, "delivery queue full; diff dropped");
                }
                Err(TrySendError::Closed(_)) => warn!("delivery worker gone; diff dropped"),
                Err(TrySendError::Full(Job::Flush(_))) => {}
            }
        }
    }

    /// Wait until every diff enqueued so far has been handed to the sink.
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender().send(Job::Flush(done)).await.is_err() {
            return;
        }
        let _ = wait.await;
    }
}

async fn run_worker(mut rx: mpsc::Receiver<Job>, sink: Arc<dyn DiffSink>, timeout: Duration) {
    while let Some(job) = rx.recv().await {
        match job {
            Job::Deliver(event) => match tokio::time::timeout(timeout, sink.deliver(&event)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(item_id = %event.item_id, kind = %event.kind, error = %err, "diff delivery failed");
                }
                Err(_) => {
                    warn!(item_id = %event.item_id, kind = %event.kind, ?timeout, "diff delivery timed out");
                }
            },
            Job::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("delivery worker stopped");
}
