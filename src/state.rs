use crate::blockchain::BlockSource;
use crate::config::Config;
use crate::db::{AddressRegistry, ProgressTracker, TransactionStore};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub source: Arc<dyn BlockSource>,
    pub registry: Arc<dyn AddressRegistry>,
    pub store: Arc<dyn TransactionStore>,
    pub progress: Arc<dyn ProgressTracker>,
}
