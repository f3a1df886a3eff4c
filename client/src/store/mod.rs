//! Persistent key-value store
//!
//! This module provides:
//! - `KeyValueStore` trait for abstracting where session data is persisted
//! - `MemoryStore` for tests and ephemeral sessions
//! - `FileStore` for a JSON file on disk

mod file;
mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt store file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Trait for string key-value stores
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
