//! Key-value store port.
//!
//! The store is used for navigator state (`navigator:{id}`) and the per-cell terrain cache
//! (`region:{x},{y}`). A single `set` is atomic; nothing spans keys.

use async_trait::async_trait;

use super::error::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStorePort: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
