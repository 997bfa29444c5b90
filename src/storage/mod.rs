//! Storage Module
//!
//! The key-value contract the engine runs on, plus two bundled backends.
//!
//! ## Responsibilities
//! - `get` / `set` / `delete` over string keys and string values
//! - Lifecycle hooks (`initialize` before first use, `shutdown` at exit)
//!
//! All structure (sets, indices, entity payloads) is owned by the engine;
//! a backend only needs single-key atomicity. There are no multi-key
//! transactions, so the two directions of an association are written as
//! separate calls.
//!
//! ## Backends
//! - [`MemoryStorage`]: process-local map, for tests and embedding
//! - [`FileStorage`]: single snapshot file with a CRC32 header

mod file;
mod memory;

pub use file::{FileStorage, FileStorageConfig, SyncStrategy};
pub use memory::MemoryStorage;

use async_trait::async_trait;

use crate::error::Result;

/// Pluggable key-value storage
#[async_trait]
pub trait Storage: Send + Sync {
    /// Startup tasks to run before any other call
    async fn initialize(&self) -> Result<()>;

    /// Cleanup tasks
    async fn shutdown(&self) -> Result<()>;

    /// Value stored under `key`, or `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; absent keys are not an error
    async fn delete(&self, key: &str) -> Result<()>;
}
