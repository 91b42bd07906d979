//! Subscription membership cache implementation

use moka::future::Cache;
use tracing::debug;

use crate::models::Address;

/// Remembers addresses known to be subscribed.
///
/// Only positive answers are cached. Subscriptions are never removed, so a
/// cached entry cannot go stale; a miss always falls through to storage.
#[derive(Clone)]
pub struct SubscriptionCache {
    cache: Cache<Address, ()>,
}

impl SubscriptionCache {
    pub fn new(capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(capacity).build();

        Self { cache }
    }

    pub async fn contains(&self, address: &Address) -> bool {
        self.cache.get(address).await.is_some()
    }

    pub async fn remember(&self, address: &Address) {
        self.cache.insert(address.clone(), ()).await;
        debug!("Cached subscription: {}", address);
    }
}
