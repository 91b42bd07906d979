// Domain records shared by the ingestion pipeline, the storage backends and the HTTP layer.

use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subscribed address in canonical (trimmed, lower-cased) form.
///
/// Only obtainable through [`crate::validation::validate_address`], so every
/// `Address` in the crate is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Address(pub(crate) String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    pub to: String,
    pub value: U256,
    pub block_hash: String,
    pub transaction_index: u64,
    pub nonce: u64,
    pub input: String,
}

impl Transaction {
    /// Key used for deduplication; hashes compare case-insensitively.
    pub fn hash_key(&self) -> String {
        self.hash.trim().to_lowercase()
    }

    /// Participant addresses in `from`, `to` order.
    pub fn participants(&self) -> [&str; 2] {
        [&self.from, &self.to]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub number: i64,
    pub hash: String,
    pub parent_hash: String,
    pub timestamp: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}

// API response models
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentBlockResponse {
    pub block_number: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressTransactionsResponse {
    pub transactions: Vec<Transaction>,
}
