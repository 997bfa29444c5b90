//! Cache handler
//!
//! Derives cache coordinates from requests and fans invalidation out over
//! the configured caches.
//!
//! ## Key Derivation
//! ```text
//!   key   = hash(sdk_key)
//!   field = hash({"sdkKey": sdk_key, "options": options})
//! ```
//!
//! Responses to SSR requests embed what *other* keys and apps can see, so
//! the handler remembers which SDK keys hold such entries; the engine drops
//! them on every index-affecting change. Keys served the global view are
//! remembered the same way, registered or not.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::Result;
use crate::hash::SharedHash;
use crate::model::NameSet;
use crate::specs::{ConfigSpecs, ConfigSpecsOptions};

use super::{SdkKeysCache, SpecsCache};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldInput<'a> {
    sdk_key: &'a str,
    options: &'a ConfigSpecsOptions,
}

pub struct CacheHandler {
    specs: Arc<dyn SpecsCache>,
    keys: Arc<dyn SdkKeysCache>,
    hash: SharedHash,
    specs_enabled: bool,
    ssr_holders: Mutex<BTreeSet<String>>,
    unscoped_holders: Mutex<BTreeSet<String>>,
}

impl CacheHandler {
    pub fn new(
        specs: Arc<dyn SpecsCache>,
        keys: Arc<dyn SdkKeysCache>,
        hash: SharedHash,
        specs_enabled: bool,
    ) -> Self {
        Self {
            specs,
            keys,
            hash,
            specs_enabled,
            ssr_holders: Mutex::new(BTreeSet::new()),
            unscoped_holders: Mutex::new(BTreeSet::new()),
        }
    }

    /// Primary cache key of an SDK key
    pub fn cache_key(&self, sdk_key: &str) -> String {
        self.hash.hash(sdk_key)
    }

    /// Secondary cache key of one request
    pub fn cache_field(&self, sdk_key: &str, options: &ConfigSpecsOptions) -> Result<String> {
        let input = serde_json::to_string(&FieldInput { sdk_key, options })?;
        Ok(self.hash.hash(&input))
    }

    // =========================================================================
    // Specs
    // =========================================================================

    pub async fn get_specs(&self, sdk_key: &str, options: &ConfigSpecsOptions) -> Result<Option<ConfigSpecs>> {
        if !self.specs_enabled {
            return Ok(None);
        }
        let field = self.cache_field(sdk_key, options)?;
        let cached = self.specs.get(&self.cache_key(sdk_key), &field).await?;
        tracing::debug!(hit = cached.is_some(), ssr = options.is_ssr(), "specs cache lookup");
        Ok(cached)
    }

    pub async fn cache_specs(&self, sdk_key: &str, options: &ConfigSpecsOptions, specs: &ConfigSpecs) -> Result<()> {
        if !self.specs_enabled {
            return Ok(());
        }
        let field = self.cache_field(sdk_key, options)?;
        self.specs.set(&self.cache_key(sdk_key), &field, specs).await?;
        if options.is_ssr() {
            self.ssr_holders.lock().insert(sdk_key.to_string());
        }
        Ok(())
    }

    /// Cache a response assembled from the global view
    pub async fn cache_unscoped_specs(
        &self,
        sdk_key: &str,
        options: &ConfigSpecsOptions,
        specs: &ConfigSpecs,
    ) -> Result<()> {
        if !self.specs_enabled {
            return Ok(());
        }
        self.cache_specs(sdk_key, options, specs).await?;
        self.unscoped_holders.lock().insert(sdk_key.to_string());
        Ok(())
    }

    /// Drop every cached request of the given SDK keys
    pub async fn clear_specs<'a, I>(&self, sdk_keys: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut cleared = 0usize;
        for sdk_key in sdk_keys {
            self.specs.clear(&self.cache_key(sdk_key), None).await?;
            cleared += 1;
        }
        if cleared > 0 {
            tracing::debug!(keys = cleared, "cleared cached specs");
        }
        Ok(())
    }

    /// Drop every SSR response
    pub async fn clear_ssr_specs(&self) -> Result<()> {
        let holders = std::mem::take(&mut *self.ssr_holders.lock());
        self.clear_specs(&holders).await
    }

    /// Drop every response served from the global view
    pub async fn clear_unscoped_specs(&self) -> Result<()> {
        let holders = std::mem::take(&mut *self.unscoped_holders.lock());
        self.clear_specs(&holders).await
    }

    pub async fn clear_all_specs(&self) -> Result<()> {
        self.ssr_holders.lock().clear();
        self.unscoped_holders.lock().clear();
        self.specs.clear_all().await
    }

    // =========================================================================
    // SDK Keys
    // =========================================================================

    pub async fn get_sdk_keys(&self) -> Result<Option<NameSet>> {
        self.keys.get().await
    }

    pub async fn cache_sdk_keys(&self, keys: &NameSet) -> Result<()> {
        self.keys.set(keys).await
    }

    pub async fn get_global_sdk_keys(&self) -> Result<Option<NameSet>> {
        self.keys.get_global().await
    }

    pub async fn cache_global_sdk_keys(&self, keys: &NameSet) -> Result<()> {
        self.keys.set_global(keys).await
    }

    pub async fn clear_global_sdk_keys(&self) -> Result<()> {
        self.keys.clear_global().await
    }

    /// Drop everything: specs, the key set and its global subset
    pub async fn clear_all(&self) -> Result<()> {
        self.clear_all_specs().await?;
        self.keys.clear().await?;
        self.keys.clear_global().await
    }
}

impl std::fmt::Debug for CacheHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheHandler")
            .field("specs_enabled", &self.specs_enabled)
            .field("ssr_holders", &self.ssr_holders.lock().len())
            .field("unscoped_holders", &self.unscoped_holders.lock().len())
            .finish()
    }
}
