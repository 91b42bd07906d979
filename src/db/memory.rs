use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

use super::{AddressRegistry, ProgressTracker, StoreError, TransactionStore};
use crate::models::{Address, Transaction};
use crate::validation::{validate_address, validate_block_height};

#[derive(Default)]
pub struct InMemoryAddressRegistry {
    subscribers: RwLock<HashSet<Address>>,
}

impl InMemoryAddressRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressRegistry for InMemoryAddressRegistry {
    async fn subscribe(&self, address: &str) -> Result<(), StoreError> {
        let address = validate_address(address)?;

        let mut subscribers = self.subscribers.write().await;
        if subscribers.insert(address.clone()) {
            debug!("Subscribed address {}", address);
        }

        Ok(())
    }

    async fn is_subscribed(&self, address: &str) -> Result<bool, StoreError> {
        let address = validate_address(address)?;
        Ok(self.subscribers.read().await.contains(&address))
    }
}

#[derive(Default)]
struct Bucket {
    transactions: Vec<Transaction>,
    hashes: HashSet<String>,
}

/// Buckets live behind one write lock, so the duplicate check and the push
/// happen atomically.
#[derive(Default)]
pub struct InMemoryTransactionStore {
    buckets: RwLock<HashMap<Address, Bucket>>,
}

impl InMemoryTransactionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn save(&self, address: &str, tx: &Transaction) -> Result<(), StoreError> {
        let address = validate_address(address)?;

        let mut buckets = self.buckets.write().await;
        let bucket = buckets.entry(address).or_default();
        if bucket.hashes.insert(tx.hash_key()) {
            bucket.transactions.push(tx.clone());
        }

        Ok(())
    }

    async fn get_transactions(&self, address: &str) -> Result<Vec<Transaction>, StoreError> {
        let address = validate_address(address)?;

        let buckets = self.buckets.read().await;
        Ok(buckets
            .get(&address)
            .map(|bucket| bucket.transactions.clone())
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemoryProgressTracker {
    last_parsed_block: RwLock<i64>,
}

impl InMemoryProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProgressTracker for InMemoryProgressTracker {
    async fn get(&self) -> Result<i64, StoreError> {
        Ok(*self.last_parsed_block.read().await)
    }

    async fn advance(&self, height: i64) -> Result<(), StoreError> {
        let mut current = self.last_parsed_block.write().await;
        validate_block_height(height, *current)?;
        *current = height;
        Ok(())
    }
}
