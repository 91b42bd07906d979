//! Shared fixtures: a scripted block source and transaction builders.

use alloy_primitives::U256;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::blockchain::{
    AdvancePolicy, Backoff, BlockSource, ClientError, RetryPolicy, WorkerSettings,
};
use crate::db::{StoreError, TransactionStore};
use crate::models::{Block, Transaction};

/// The first height query answers `initial_height`, later ones `latest_height`.
pub struct MockBlockSource {
    initial_height: i64,
    latest_height: AtomicI64,
    height_calls: AtomicUsize,
    /// Height queries with an index at or past this fail.
    fail_heights_from: AtomicUsize,
    blocks: Mutex<HashMap<i64, Block>>,
    failing_blocks: Mutex<HashSet<i64>>,
    slow_blocks: Mutex<HashMap<i64, Duration>>,
    block_calls: Mutex<HashMap<i64, usize>>,
}

impl MockBlockSource {
    pub fn new(initial_height: i64, latest_height: i64) -> Self {
        Self {
            initial_height,
            latest_height: AtomicI64::new(latest_height),
            height_calls: AtomicUsize::new(0),
            fail_heights_from: AtomicUsize::new(usize::MAX),
            blocks: Mutex::new(HashMap::new()),
            failing_blocks: Mutex::new(HashSet::new()),
            slow_blocks: Mutex::new(HashMap::new()),
            block_calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_block(self, block: Block) -> Self {
        self.blocks.lock().unwrap().insert(block.number, block);
        self
    }

    pub fn failing_block(self, height: i64) -> Self {
        self.failing_blocks.lock().unwrap().insert(height);
        self
    }

    pub fn slow_block(self, height: i64, delay: Duration) -> Self {
        self.slow_blocks.lock().unwrap().insert(height, delay);
        self
    }

    pub fn fail_heights_from(self, call: usize) -> Self {
        self.fail_heights_from.store(call, Ordering::SeqCst);
        self
    }

    pub fn set_latest(&self, height: i64) {
        self.latest_height.store(height, Ordering::SeqCst);
    }

    pub fn block_calls(&self, height: i64) -> usize {
        self.block_calls.lock().unwrap().get(&height).copied().unwrap_or(0)
    }

    pub fn requested_heights(&self) -> Vec<i64> {
        let mut heights: Vec<_> = self.block_calls.lock().unwrap().keys().copied().collect();
        heights.sort_unstable();
        heights
    }
}

fn unavailable(what: &str) -> ClientError {
    ClientError::Rpc {
        code: -32000,
        message: format!("{} unavailable", what),
    }
}

#[async_trait]
impl BlockSource for MockBlockSource {
    async fn current_height(&self) -> Result<i64, ClientError> {
        let call = self.height_calls.fetch_add(1, Ordering::SeqCst);
        if call >= self.fail_heights_from.load(Ordering::SeqCst) {
            return Err(unavailable("height"));
        }

        if call == 0 {
            Ok(self.initial_height)
        } else {
            Ok(self.latest_height.load(Ordering::SeqCst))
        }
    }

    async fn block_at(&self, height: i64) -> Result<Option<Block>, ClientError> {
        *self.block_calls.lock().unwrap().entry(height).or_insert(0) += 1;

        let delay = self.slow_blocks.lock().unwrap().get(&height).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_blocks.lock().unwrap().contains(&height) {
            return Err(unavailable(&format!("block {}", height)));
        }

        Ok(self.blocks.lock().unwrap().get(&height).cloned())
    }
}

/// A transaction store whose backend is always down.
#[derive(Default)]
pub struct FailingTransactionStore {
    save_calls: AtomicUsize,
}

impl FailingTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionStore for FailingTransactionStore {
    async fn save(&self, _address: &str, _transaction: &Transaction) -> Result<(), StoreError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn get_transactions(&self, _address: &str) -> Result<Vec<Transaction>, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

pub fn tx(hash: &str, from: &str, to: &str) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        value: U256::from(100u64),
        block_hash: "0xb10c".to_string(),
        transaction_index: 0,
        nonce: 1,
        input: "0x".to_string(),
    }
}

pub fn block(number: i64, transactions: Vec<Transaction>) -> Block {
    Block {
        number,
        hash: format!("0x{:064x}", number),
        parent_hash: format!("0x{:064x}", number - 1),
        timestamp: Utc.timestamp_opt(1_700_000_000 + number, 0).unwrap(),
        transactions,
    }
}

/// Worker settings with a short poll interval and no backoff delay.
pub fn fast_settings() -> WorkerSettings {
    WorkerSettings {
        poll_interval: Duration::from_millis(20),
        retry: RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff: Backoff::Fixed,
        },
        max_concurrent_blocks: 4,
        advance_policy: AdvancePolicy::OnDispatch,
        resume_from_watermark: true,
    }
}

/// Polls `check` until it holds or five seconds pass.
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..500 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
