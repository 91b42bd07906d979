//! Storage contracts for subscriptions, matched transactions and the progress watermark.
//!
//! Every trait has an in-memory implementation ([`memory`]) and a SQLite one
//! ([`address`], [`transaction`], [`progress`]). Each structure is guarded on its
//! own; no operation spans more than one of them.

pub mod address;
pub mod connection;
pub mod memory;
pub mod migration;
pub mod progress;
pub mod transaction;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Transaction;
use crate::validation::ValidationError;

pub use address::SqliteAddressRegistry;
pub use memory::{InMemoryAddressRegistry, InMemoryProgressTracker, InMemoryTransactionStore};
pub use progress::SqliteProgressTracker;
pub use transaction::SqliteTransactionStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub fn is_invalid_address(&self) -> bool {
        matches!(self, Self::Validation(ValidationError::InvalidAddress(_)))
    }

    pub fn is_invalid_block(&self) -> bool {
        matches!(self, Self::Validation(ValidationError::InvalidBlock { .. }))
    }
}

/// Set of addresses whose transactions are retained.
#[async_trait]
pub trait AddressRegistry: Send + Sync {
    /// Idempotent; subscribing an already present address is a no-op.
    async fn subscribe(&self, address: &str) -> Result<(), StoreError>;

    async fn is_subscribed(&self, address: &str) -> Result<bool, StoreError>;
}

/// Per-address archive of matched transactions, deduplicated by hash.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Saving a hash already present under `address` is a no-op.
    async fn save(&self, address: &str, tx: &Transaction) -> Result<(), StoreError>;

    /// Transactions saved under `address`, in insertion order.
    async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, StoreError>;
}

/// Highest block height the ingestion worker has dispatched.
#[async_trait]
pub trait ProgressTracker: Send + Sync {
    async fn get(&self) -> Result<i64, StoreError>;

    /// Rejects negative heights and heights below the current watermark.
    async fn advance(&self, height: i64) -> Result<(), StoreError>;
}
