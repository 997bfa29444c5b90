//! Engine Module
//!
//! The public facade. Every operation sequences a store mutation, the index
//! repair that goes with it, and cache invalidation.
//!
//! ## Responsibilities
//! - CRUD for gates, configs and experiments with target app reconciliation
//! - Target app and SDK key administration
//! - Serve config specs through the specs cache
//! - Invalidate every cached spec a mutation could change before returning
//!
//! ## Outcomes
//! "May not exist" is not an error. Mutators return [`MutationStatus`];
//! `Err` is reserved for storage failures and rule authoring errors.
//!
//! ```text
//!   caller ─▶ Engine ─┬─▶ AssociationStore ─▶ Storage
//!                     ├─▶ SpecAssembler
//!                     └─▶ CacheHandler ─▶ SpecsCache / SdkKeysCache
//! ```

mod configs;
mod experiments;
mod gates;
mod sdk_keys;
mod target_apps;

use std::sync::Arc;

use crate::cache::{CacheHandler, MemorySdkKeysCache, MemorySpecsCache, SdkKeysCache, SpecsCache};
use crate::codec::KeyCodec;
use crate::config::Config;
use crate::error::Result;
use crate::hash::{default_hash, SharedHash};
use crate::model::{NameSet, StoredEntity};
use crate::specs::{ConfigSpecs, ConfigSpecsOptions, SpecAssembler};
use crate::storage::{MemoryStorage, Storage};
use crate::store::{name_set, AssociationStore, MigrationReport};

/// Outcome of a facade mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStatus {
    /// The change was written
    Applied,
    /// The addressed entity, target app or key does not exist
    NotFound,
    /// A business rule forbids the change (started experiment, reserved
    /// or taken name)
    Rejected,
}

impl MutationStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationStatus::Applied)
    }
}

/// Per-item result of a batch operation
#[derive(Debug)]
pub struct BatchItem {
    pub name: String,
    pub outcome: Result<MutationStatus>,
}

/// The gatehouse engine
///
/// Holds no locks of its own. Concurrent callers may observe state before
/// or after any single storage write.
pub struct Engine {
    config: Config,
    hash: SharedHash,
    store: AssociationStore,
    assembler: SpecAssembler,
    cache: CacheHandler,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Engine over `storage` with default hash and in-process caches
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Result<Self> {
        EngineBuilder::default().storage(storage).config(config).build()
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn initialize(&self) -> Result<()> {
        self.store.initialize().await?;
        tracing::info!(prefix = %self.config.key_prefix, "engine initialized");
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.store.shutdown().await?;
        tracing::info!("engine shut down");
        Ok(())
    }

    /// Drop cached specs of one SDK key, or every cache entry when `None`
    pub async fn clear_cache(&self, sdk_key: Option<&str>) -> Result<()> {
        match sdk_key {
            Some(sdk_key) => self.cache.clear_specs(&[sdk_key.to_string()]).await,
            None => self.cache.clear_all().await,
        }
    }

    /// Drop cached specs of every SDK key that can see the given apps
    pub async fn clear_cache_for_target_apps(&self, target_apps: &[String]) -> Result<()> {
        self.invalidate_target_apps(&name_set(target_apps)).await
    }

    // =========================================================================
    // Specs
    // =========================================================================

    /// Config specs visible to `sdk_key`, served from the cache when possible.
    ///
    /// Unregistered keys are served (with a warning) like global keys.
    pub async fn get_config_specs(&self, sdk_key: &str, options: &ConfigSpecsOptions) -> Result<ConfigSpecs> {
        if !self.registered_sdk_keys().await?.contains(sdk_key) {
            tracing::warn!("config specs requested with a non-registered sdk key");
        }

        if let Some(cached) = self.cache.get_specs(sdk_key, options).await? {
            return Ok(cached);
        }

        let specs = self.assembler.assemble(sdk_key, options).await?;
        if self.store.target_apps_for_sdk_key(sdk_key).await?.is_some() {
            self.cache.cache_specs(sdk_key, options, &specs).await?;
        } else {
            self.cache.cache_unscoped_specs(sdk_key, options, &specs).await?;
        }
        Ok(specs)
    }

    // =========================================================================
    // Migration
    // =========================================================================

    /// Rewrite legacy untagged sets and repair entity scoping, then drop
    /// every cache entry
    pub async fn migrate_legacy_encoding(&self) -> Result<MigrationReport> {
        let report = self.store.migrate_legacy_encoding().await?;
        self.cache.clear_all().await?;
        Ok(report)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn hash(&self) -> &SharedHash {
        &self.hash
    }

    /// Direct access to the association store, bypassing cache invalidation
    pub fn store(&self) -> &AssociationStore {
        &self.store
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Load an entity, logging when it is missing
    async fn find<E: StoredEntity>(&self, name: &str, action: &'static str) -> Result<Option<E>> {
        let entity = self.store.get_entity::<E>(name).await?;
        if entity.is_none() {
            tracing::warn!(kind = E::KIND.label(), name, action, "entity does not exist");
        }
        Ok(entity)
    }

    async fn create_entity<E: StoredEntity>(&self, entity: E) -> Result<MutationStatus> {
        if self.store.get_entity::<E>(entity.name()).await?.is_some() {
            tracing::warn!(kind = E::KIND.label(), name = entity.name(), "entity already exists");
            return Ok(MutationStatus::Rejected);
        }
        self.store.add_entity(&entity).await?;
        self.invalidate_target_apps(entity.target_apps()).await?;
        Ok(MutationStatus::Applied)
    }

    /// Persist an edited entity and invalidate its old and new scopes
    async fn commit_update<E: StoredEntity>(
        &self,
        mut entity: E,
        previous_apps: NameSet,
        target_apps: Option<&[String]>,
    ) -> Result<MutationStatus> {
        self.store.update_entity(&mut entity, target_apps).await?;
        let mut affected = previous_apps;
        affected.extend(entity.target_apps().iter().cloned());
        self.invalidate_target_apps(&affected).await?;
        Ok(MutationStatus::Applied)
    }

    async fn delete_entity<E: StoredEntity>(&self, name: &str) -> Result<MutationStatus> {
        let Some(entity) = self.store.remove_entity::<E>(name).await? else {
            tracing::warn!(kind = E::KIND.label(), name, action = "delete", "entity does not exist");
            return Ok(MutationStatus::NotFound);
        };
        self.invalidate_target_apps(entity.target_apps()).await?;
        Ok(MutationStatus::Applied)
    }

    async fn scope_entity<E: StoredEntity>(
        &self,
        name: &str,
        target_apps: &[String],
        add: bool,
    ) -> Result<MutationStatus> {
        let Some(mut entity) = self.find::<E>(name, "scope").await? else {
            return Ok(MutationStatus::NotFound);
        };
        let apps = name_set(target_apps);
        if add {
            self.store.add_target_apps_to_entity(&mut entity, &apps).await?;
        } else {
            self.store.remove_target_apps_from_entity(&mut entity, &apps).await?;
        }
        self.invalidate_target_apps(&apps).await?;
        Ok(MutationStatus::Applied)
    }

    /// Clear specs of every key assigned to the apps, every key served the
    /// global view (registered or not) and every SSR response
    async fn invalidate_target_apps(&self, target_apps: &NameSet) -> Result<()> {
        let mut sdk_keys = self.global_sdk_keys().await?;
        for app in target_apps {
            sdk_keys.extend(self.store.sdk_keys_for_target_app(app).await?);
        }
        tracing::debug!(apps = target_apps.len(), keys = sdk_keys.len(), "invalidating target apps");
        self.cache.clear_specs(&sdk_keys).await?;
        self.cache.clear_unscoped_specs().await?;
        self.cache.clear_ssr_specs().await
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Builder for [`Engine`]
///
/// Every component is optional: storage defaults to [`MemoryStorage`], the
/// hash to [`Djb2Hash`](crate::hash::Djb2Hash) and both caches to their
/// in-process implementations.
#[derive(Default)]
pub struct EngineBuilder {
    storage: Option<Arc<dyn Storage>>,
    config: Option<Config>,
    hash: Option<SharedHash>,
    specs_cache: Option<Arc<dyn SpecsCache>>,
    keys_cache: Option<Arc<dyn SdkKeysCache>>,
}

impl EngineBuilder {
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn hash(mut self, hash: SharedHash) -> Self {
        self.hash = Some(hash);
        self
    }

    pub fn specs_cache(mut self, cache: Arc<dyn SpecsCache>) -> Self {
        self.specs_cache = Some(cache);
        self
    }

    pub fn sdk_keys_cache(mut self, cache: Arc<dyn SdkKeysCache>) -> Self {
        self.keys_cache = Some(cache);
        self
    }

    /// Validate the config and wire the components together
    pub fn build(self) -> Result<Engine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let hash = self.hash.unwrap_or_else(default_hash);
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(MemoryStorage::new()));
        let specs_cache = self
            .specs_cache
            .unwrap_or_else(|| Arc::new(MemorySpecsCache::new()));
        let keys_cache = self
            .keys_cache
            .unwrap_or_else(|| Arc::new(MemorySdkKeysCache::new()));

        let store = AssociationStore::new(storage, KeyCodec::new(config.key_prefix.clone(), hash.clone()));
        let assembler = SpecAssembler::new(store.clone(), hash.clone());
        let cache = CacheHandler::new(specs_cache, keys_cache, hash.clone(), config.specs_cache_enabled);

        Ok(Engine {
            config,
            hash,
            store,
            assembler,
            cache,
        })
    }
}
