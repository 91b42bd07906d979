use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

/// Spawns block tasks without blocking the caller while capping how many run
/// at once. Each task waits for a permit before starting its work.
#[derive(Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
}

impl WorkerPool {
    pub fn new(worker_count: usize) -> Self {
        let size = worker_count.max(1);
        info!("Worker pool sized for {} concurrent tasks", size);

        Self {
            permits: Arc::new(Semaphore::new(size)),
            tracker: TaskTracker::new(),
        }
    }

    /// Tasks spawned and not yet finished, including those waiting for a permit.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permits = self.permits.clone();

        self.tracker.spawn(async move {
            // The semaphore is never closed
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            task.await;
        })
    }

    /// Wait until every task spawned so far has finished.
    pub async fn drain(&self) {
        self.tracker.close();
        debug!("Waiting for {} in-flight tasks", self.in_flight());
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}
