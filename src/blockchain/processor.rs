use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::blockchain::client::ClientError;
use crate::blockchain::source::BlockSource;
use crate::db::{AddressRegistry, StoreError, TransactionStore};
use crate::models::Transaction;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Upstream failure: {0}")]
    Upstream(#[from] ClientError),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),
}

impl ProcessError {
    /// Validation errors are deterministic, so another attempt cannot succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Upstream(_) => true,
            Self::Storage(StoreError::Validation(_)) => false,
            Self::Storage(_) => true,
        }
    }
}

/// Fetches one block and keeps the transactions that touch subscribed addresses
#[derive(Clone)]
pub struct BlockProcessor {
    source: Arc<dyn BlockSource>,
    registry: Arc<dyn AddressRegistry>,
    store: Arc<dyn TransactionStore>,
}

impl BlockProcessor {
    pub fn new(
        source: Arc<dyn BlockSource>,
        registry: Arc<dyn AddressRegistry>,
        store: Arc<dyn TransactionStore>,
    ) -> Self {
        Self {
            source,
            registry,
            store,
        }
    }

    /// Returns how many (address, transaction) pairs were saved. A missing
    /// block is not an error: there is simply nothing to do.
    pub async fn process_block(&self, height: i64) -> Result<usize, ProcessError> {
        let Some(block) = self.source.block_at(height).await? else {
            debug!("Block {} not available, skipping", height);
            return Ok(0);
        };

        let mut saved = 0;
        for tx in &block.transactions {
            saved += self.process_transaction(tx).await?;
        }

        debug!(
            "Block {}: {} transactions, {} matched",
            height,
            block.transactions.len(),
            saved
        );
        Ok(saved)
    }

    /// Saves `tx` under each subscribed participant, skipping blank ones.
    pub async fn process_transaction(&self, tx: &Transaction) -> Result<usize, ProcessError> {
        let mut saved = 0;

        for address in tx.participants() {
            if address.trim().is_empty() {
                continue;
            }

            if self.registry.is_subscribed(address).await? {
                self.store.save(address, tx).await?;
                saved += 1;
            }
        }

        Ok(saved)
    }
}
