use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::blockchain::models::{extract_block, parse_hex_i64, RpcBlock, RpcResponse};
use crate::blockchain::source::BlockSource;
use crate::config::Config;
use crate::models::Block;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    Decode(String),
}

/// Ethereum JSON-RPC client over HTTP
pub struct EvmRpcClient {
    http: reqwest::Client,
    rpc_url: String,
    next_id: AtomicU64,
}

impl EvmRpcClient {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.rpc_timeout_secs);

        info!("Initializing RPC client with endpoint: {}, timeout: {:?}", config.rpc_url, timeout);

        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>, ClientError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": id,
        });

        debug!("RPC call {} #{}", method, id);

        let response: RpcResponse<T> = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(ClientError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        Ok(response.result)
    }

    /// Latest block number
    pub async fn get_block_number(&self) -> Result<i64, ClientError> {
        let result: String = self
            .call("eth_blockNumber", json!([]))
            .await?
            .ok_or_else(|| ClientError::Decode("eth_blockNumber returned no result".to_string()))?;

        parse_hex_i64("blockNumber", &result)
    }

    /// Block with full transaction objects
    pub async fn get_block_by_number(&self, number: i64) -> Result<Option<Block>, ClientError> {
        let raw: Option<RpcBlock> = self
            .call("eth_getBlockByNumber", json!([format!("0x{:x}", number), true]))
            .await?;

        raw.map(extract_block).transpose()
    }
}

#[async_trait]
impl BlockSource for EvmRpcClient {
    async fn current_height(&self) -> Result<i64, ClientError> {
        self.get_block_number().await
    }

    async fn block_at(&self, height: i64) -> Result<Option<Block>, ClientError> {
        self.get_block_by_number(height).await
    }
}
