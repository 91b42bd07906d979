use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{AddressRegistry, StoreError};
use crate::cache::SubscriptionCache;
use crate::validation::validate_address;

pub struct SqliteAddressRegistry {
    pool: SqlitePool,
    cache: SubscriptionCache,
}

impl SqliteAddressRegistry {
    pub fn new(pool: SqlitePool, cache_capacity: u64) -> Self {
        Self {
            pool,
            cache: SubscriptionCache::new(cache_capacity),
        }
    }
}

#[async_trait]
impl AddressRegistry for SqliteAddressRegistry {
    async fn subscribe(&self, address: &str) -> Result<(), StoreError> {
        let address = validate_address(address)?;

        sqlx::query(
            "INSERT INTO subscriptions (address) VALUES (?)
             ON CONFLICT(address) DO NOTHING",
        )
        .bind(address.as_str())
        .execute(&self.pool)
        .await?;

        self.cache.remember(&address).await;
        Ok(())
    }

    async fn is_subscribed(&self, address: &str) -> Result<bool, StoreError> {
        let address = validate_address(address)?;

        if self.cache.contains(&address).await {
            return Ok(true);
        }

        let found: Option<String> =
            sqlx::query_scalar("SELECT address FROM subscriptions WHERE address = ?")
                .bind(address.as_str())
                .fetch_optional(&self.pool)
                .await?;

        if found.is_some() {
            self.cache.remember(&address).await;
        }

        Ok(found.is_some())
    }
}
