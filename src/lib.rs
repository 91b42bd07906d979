pub mod api;
pub mod blockchain;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod validation;
pub mod state;

#[cfg(test)]
pub mod tests;

// Re-export specific items for convenience if desired
pub use db::{AddressRegistry, ProgressTracker, StoreError, TransactionStore};
pub use models::{Address, Block, Transaction};
pub use validation::{validate_address, ValidationError};
pub use api::error::ApiError;
pub use api::response::ApiResponse;
pub use api::route::create_router;
pub use blockchain::{BlockSource, IngestionWorker};
