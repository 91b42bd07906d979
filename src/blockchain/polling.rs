use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::blockchain::client::ClientError;
use crate::blockchain::processor::{BlockProcessor, ProcessError};
use crate::blockchain::retry::{RetryError, RetryPolicy, RetryableTask};
use crate::blockchain::source::BlockSource;
use crate::blockchain::worker_pool::WorkerPool;
use crate::config::Config;
use crate::db::{AddressRegistry, ProgressTracker, StoreError, TransactionStore};

/// When the watermark moves to the newly observed height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// As soon as the tick's block tasks are spawned. A block whose retries
    /// are exhausted after that point is lost without moving the watermark back.
    OnDispatch,
    /// After every block task of the tick has finished, successfully or not.
    OnCompletion,
}

impl AdvancePolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "dispatch" => Some(Self::OnDispatch),
            "completion" => Some(Self::OnCompletion),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to get latest block number: {0}")]
    Upstream(#[from] ClientError),

    #[error("Failed to read stored progress: {0}")]
    Progress(#[from] StoreError),

    #[error("Ingestion worker cancelled")]
    Cancelled,

    #[error("Ingestion worker task failed: {0}")]
    Task(#[from] JoinError),
}

impl WorkerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent_blocks: usize,
    pub advance_policy: AdvancePolicy,
    pub resume_from_watermark: bool,
}

impl WorkerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll_interval: config.poll_interval,
            retry: config.retry_policy,
            max_concurrent_blocks: config.max_concurrent_blocks,
            advance_policy: config.advance_policy,
            resume_from_watermark: config.resume_from_watermark,
        }
    }
}

/// Polls the chain height and fans each new block out to the worker pool.
pub struct IngestionWorker {
    source: Arc<dyn BlockSource>,
    progress: Arc<dyn ProgressTracker>,
    processor: BlockProcessor,
    retry: RetryableTask,
    pool: WorkerPool,
    settings: WorkerSettings,
}

impl IngestionWorker {
    pub fn new(
        source: Arc<dyn BlockSource>,
        registry: Arc<dyn AddressRegistry>,
        store: Arc<dyn TransactionStore>,
        progress: Arc<dyn ProgressTracker>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            processor: BlockProcessor::new(source.clone(), registry, store),
            retry: RetryableTask::new(settings.retry),
            pool: WorkerPool::new(settings.max_concurrent_blocks),
            source,
            progress,
            settings,
        }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Runs the worker on its own task. A fatal error also cancels `shutdown`
    /// so the rest of the process stops with it.
    pub fn spawn(
        self: Arc<Self>,
        shutdown: CancellationToken,
    ) -> JoinHandle<Result<(), WorkerError>> {
        tokio::spawn(async move {
            let result = self.run(shutdown.clone()).await;
            match &result {
                Err(e) if e.is_cancelled() => info!("Ingestion worker stopped"),
                Err(e) => {
                    error!("Ingestion worker failed: {}", e);
                    shutdown.cancel();
                }
                Ok(()) => {}
            }
            result
        })
    }

    /// Runs until cancelled or until the chain height cannot be read.
    ///
    /// Never returns `Ok`: cancellation yields [`WorkerError::Cancelled`].
    /// Block tasks still in flight keep running; use [`WorkerPool::drain`] to wait for them.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), WorkerError> {
        info!("Starting ingestion worker");

        let initial = self.latest_height(&shutdown).await?;
        let mut last_dispatched = self.starting_block(initial).await?;
        info!("Chain height {}, dispatching blocks after {}", initial, last_dispatched);

        let period = self.settings.poll_interval.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutting down ingestion worker");
                    return Err(WorkerError::Cancelled);
                }
                _ = ticker.tick() => {}
            }

            let latest = self.latest_height(&shutdown).await?;
            if latest <= last_dispatched {
                debug!("No new blocks (latest {}, dispatched {})", latest, last_dispatched);
                continue;
            }

            debug!("Dispatching blocks {}..={}", last_dispatched + 1, latest);
            let handles = self.dispatch_range(last_dispatched + 1, latest, &shutdown);

            if self.settings.advance_policy == AdvancePolicy::OnCompletion {
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => {
                        info!(
                            "Shutting down ingestion worker before blocks up to {} completed",
                            latest
                        );
                        return Err(WorkerError::Cancelled);
                    }
                    _ = join_all(handles) => {}
                }
            }

            match self.progress.advance(latest).await {
                Ok(()) => debug!("Watermark advanced to {}", latest),
                Err(e) if e.is_invalid_block() => {
                    warn!("Watermark update to {} rejected: {}", latest, e)
                }
                Err(e) => error!("Failed to store watermark {}: {}", latest, e),
            }
            last_dispatched = latest;
        }
    }

    async fn latest_height(&self, shutdown: &CancellationToken) -> Result<i64, WorkerError> {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => Err(WorkerError::Cancelled),
            height = self.source.current_height() => height.map_err(|e| {
                error!("Failed to get latest block number: {}", e);
                WorkerError::Upstream(e)
            }),
        }
    }

    async fn starting_block(&self, initial: i64) -> Result<i64, WorkerError> {
        if self.settings.resume_from_watermark {
            let stored = self.progress.get().await?;
            if stored > 0 {
                if stored > initial {
                    warn!("Stored watermark {} is ahead of chain height {}", stored, initial);
                }
                return Ok(stored);
            }
        }

        Ok(initial)
    }

    fn dispatch_range(
        &self,
        from: i64,
        to: i64,
        shutdown: &CancellationToken,
    ) -> Vec<JoinHandle<()>> {
        (from..=to).map(|height| self.dispatch(height, shutdown)).collect()
    }

    fn dispatch(&self, height: i64, shutdown: &CancellationToken) -> JoinHandle<()> {
        let processor = self.processor.clone();
        let retry = self.retry.clone();
        let token = shutdown.clone();

        self.pool.spawn(async move {
            let result = retry
                .run_when(&token, || processor.process_block(height), ProcessError::is_retryable)
                .await;

            match result {
                Ok(saved) => debug!("Processed block {} ({} saved)", height, saved),
                Err(RetryError::Cancelled) => debug!("Block {} abandoned on shutdown", height),
                Err(RetryError::Exhausted { attempts, source }) => {
                    error!(
                        "Failed to parse block {} after {} attempt(s): {}",
                        height, attempts, source
                    )
                }
            }
        })
    }
}

/// Waits for a spawned worker. Cancellation is a clean stop; anything else,
/// including a panicked task, is returned as the failure.
pub async fn join_worker(handle: JoinHandle<Result<(), WorkerError>>) -> Result<(), WorkerError> {
    match handle.await? {
        Err(e) if e.is_cancelled() => Ok(()),
        other => other,
    }
}
