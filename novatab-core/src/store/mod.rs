//! Durable key-value persistence port.
//!
//! NovaTab keeps everything it persists (settings document, pinned apps, usage
//! statistics, install date) as JSON trees under a handful of well-known keys.
//! The [`ConfigStore`] trait is the only way the domain layer touches storage,
//! which keeps the backend swappable: [`MemoryConfigStore`] for tests and
//! ephemeral sessions, [`FileConfigStore`] for a directory of JSON files.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::StoreError;

pub mod file;
pub mod memory;

pub use file::FileConfigStore;
pub use memory::MemoryConfigStore;

/// Asynchronous JSON key-value store.
///
/// Writes are whole-value replacements; there is no merge, locking or
/// versioning, so concurrent writers to one key resolve as last-write-wins.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Reads the value stored under `key`. An absent key is `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StoreError>;

    /// Replaces the value stored under `key`.
    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StoreError>;

    /// Removes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
