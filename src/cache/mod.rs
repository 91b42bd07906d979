//! Caching layer in front of the durable subscription table

pub mod address;

pub use address::SubscriptionCache;
