use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::blockchain::client::ClientError;
use crate::models::{Block, Transaction};

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
pub struct RpcResponse<T> {
    pub result: Option<T>,
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Block as returned by `eth_getBlockByNumber` with full transaction objects
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub number: Option<String>,
    pub hash: Option<String>,
    pub parent_hash: String,
    pub timestamp: String,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: String,
    pub from: String,
    // null for contract creation
    pub to: Option<String>,
    pub value: String,
    pub block_hash: Option<String>,
    pub transaction_index: Option<String>,
    pub nonce: String,
    #[serde(default)]
    pub input: String,
}

fn hex_digits<'a>(field: &str, value: &'a str) -> Result<&'a str, ClientError> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    if digits.is_empty() {
        return Err(ClientError::Decode(format!("{}: empty quantity {:?}", field, value)));
    }
    Ok(digits)
}

pub fn parse_hex_u64(field: &str, value: &str) -> Result<u64, ClientError> {
    u64::from_str_radix(hex_digits(field, value)?, 16)
        .map_err(|e| ClientError::Decode(format!("{}: {:?}: {}", field, value, e)))
}

pub fn parse_hex_i64(field: &str, value: &str) -> Result<i64, ClientError> {
    let parsed = parse_hex_u64(field, value)?;
    i64::try_from(parsed)
        .map_err(|_| ClientError::Decode(format!("{}: {} does not fit in i64", field, parsed)))
}

pub fn parse_hex_u256(field: &str, value: &str) -> Result<U256, ClientError> {
    U256::from_str_radix(hex_digits(field, value)?, 16)
        .map_err(|e| ClientError::Decode(format!("{}: {:?}: {}", field, value, e)))
}

fn extract_transaction(raw: RpcTransaction) -> Result<Transaction, ClientError> {
    let transaction_index = match raw.transaction_index.as_deref() {
        Some(index) => parse_hex_u64("transactionIndex", index)?,
        None => 0,
    };

    Ok(Transaction {
        value: parse_hex_u256("value", &raw.value)?,
        nonce: parse_hex_u64("nonce", &raw.nonce)?,
        transaction_index,
        hash: raw.hash,
        from: raw.from,
        to: raw.to.unwrap_or_default(),
        block_hash: raw.block_hash.unwrap_or_default(),
        input: raw.input,
    })
}

/// Convert a wire block into the domain model, decoding every hex quantity
pub fn extract_block(raw: RpcBlock) -> Result<Block, ClientError> {
    let number = raw
        .number
        .as_deref()
        .ok_or_else(|| ClientError::Decode("block without number".to_string()))
        .and_then(|n| parse_hex_i64("number", n))?;

    let seconds = parse_hex_i64("timestamp", &raw.timestamp)?;
    let timestamp = DateTime::<Utc>::from_timestamp(seconds, 0)
        .ok_or_else(|| ClientError::Decode(format!("timestamp {} out of range", seconds)))?;

    let transactions = raw
        .transactions
        .into_iter()
        .map(extract_transaction)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Block {
        number,
        hash: raw.hash.unwrap_or_default(),
        parent_hash: raw.parent_hash,
        timestamp,
        transactions,
    })
}
