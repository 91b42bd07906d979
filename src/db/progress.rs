use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{ProgressTracker, StoreError};
use crate::validation::{validate_block_height, ValidationError};

const PROGRESS_ROW_ID: i64 = 1;

pub struct SqliteProgressTracker {
    pool: SqlitePool,
}

impl SqliteProgressTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressTracker for SqliteProgressTracker {
    async fn get(&self) -> Result<i64, StoreError> {
        let height: Option<i64> =
            sqlx::query_scalar("SELECT block_number FROM progress WHERE id = ?")
                .bind(PROGRESS_ROW_ID)
                .fetch_optional(&self.pool)
                .await?;

        Ok(height.unwrap_or(0))
    }

    async fn advance(&self, height: i64) -> Result<(), StoreError> {
        validate_block_height(height, 0)?;

        // The update only applies when the height does not move backwards
        let result = sqlx::query(
            "INSERT INTO progress (id, block_number) VALUES (?, ?)
             ON CONFLICT(id) DO UPDATE SET block_number = excluded.block_number
             WHERE excluded.block_number >= progress.block_number",
        )
        .bind(PROGRESS_ROW_ID)
        .bind(height)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let current = self.get().await?;
            return Err(ValidationError::InvalidBlock {
                height,
                reason: format!("below the current watermark {}", current),
            }
            .into());
        }

        Ok(())
    }
}
