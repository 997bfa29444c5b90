//! Cache Module
//!
//! Pluggable caches in front of spec assembly and the SDK key registry.
//!
//! ## Responsibilities
//! - Spec cache: `(key, field) → ConfigSpecs`, key = hash(sdk key),
//!   field = hash of the request (sdk key + options)
//! - SDK key cache: the registered key set and its global (unscoped) subset
//!
//! Entries are only ever removed by explicit invalidation from the engine,
//! never by age. Replacing either cache changes latency, not results.

mod handler;
mod memory;

pub use handler::CacheHandler;
pub use memory::{MemorySdkKeysCache, MemorySpecsCache};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::NameSet;
use crate::specs::ConfigSpecs;

/// Cache of assembled config specs
#[async_trait]
pub trait SpecsCache: Send + Sync {
    /// Specs stored under `(key, field)`, or `None`
    async fn get(&self, key: &str, field: &str) -> Result<Option<ConfigSpecs>>;

    async fn set(&self, key: &str, field: &str, specs: &ConfigSpecs) -> Result<()>;

    /// Drop one field, or every field of `key` when `field` is `None`
    async fn clear(&self, key: &str, field: Option<&str>) -> Result<()>;

    async fn clear_all(&self) -> Result<()>;
}

/// Cache of the registered SDK key set and its global subset
#[async_trait]
pub trait SdkKeysCache: Send + Sync {
    async fn get(&self) -> Result<Option<NameSet>>;

    async fn set(&self, keys: &NameSet) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Registered keys with no target app
    async fn get_global(&self) -> Result<Option<NameSet>>;

    async fn set_global(&self, keys: &NameSet) -> Result<()>;

    async fn clear_global(&self) -> Result<()>;
}
