pub mod client;
pub mod models;
pub mod polling;
pub mod processor;
pub mod retry;
pub mod source;
pub mod worker_pool;

// Re-exports for convenience
pub use client::{ClientError, EvmRpcClient};
pub use polling::{join_worker, AdvancePolicy, IngestionWorker, WorkerError, WorkerSettings};
pub use processor::{BlockProcessor, ProcessError};
pub use retry::{Backoff, RetryError, RetryPolicy, RetryableTask};
pub use source::BlockSource;
pub use worker_pool::WorkerPool;
