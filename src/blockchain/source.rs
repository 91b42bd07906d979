use async_trait::async_trait;

use super::client::ClientError;
use crate::models::Block;

/// Upstream view of the chain. Request timeouts are the implementation's concern.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Current chain height.
    async fn current_height(&self) -> Result<i64, ClientError>;

    /// Block at `height` with its transactions, or `None` when the node has no such block.
    async fn block_at(&self, height: i64) -> Result<Option<Block>, ClientError>;
}
