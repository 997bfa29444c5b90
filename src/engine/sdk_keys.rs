//! SDK key registry and key ↔ target app assignment

use crate::error::Result;
use crate::model::NameSet;
use crate::store::name_set;

use super::{Engine, MutationStatus};

impl Engine {
    // =========================================================================
    // Registry
    // =========================================================================

    pub async fn register_sdk_key(&self, sdk_key: &str) -> Result<MutationStatus> {
        let registered = self.store.add_sdk_key(sdk_key).await?;
        self.cache.cache_sdk_keys(&registered).await?;
        self.cache.clear_global_sdk_keys().await?;
        self.cache.clear_ssr_specs().await?;
        Ok(MutationStatus::Applied)
    }

    /// Deregister a key and drop its cached specs and every SSR response.
    /// Its target app assignments are kept.
    pub async fn deactivate_sdk_key(&self, sdk_key: &str) -> Result<MutationStatus> {
        if !self.store.is_sdk_key_registered(sdk_key).await? {
            tracing::warn!("attempting to deactivate a non-registered sdk key");
            return Ok(MutationStatus::NotFound);
        }
        let registered = self.store.remove_sdk_key(sdk_key).await?;
        self.cache.cache_sdk_keys(&registered).await?;
        self.cache.clear_specs(&[sdk_key.to_string()]).await?;
        self.cache.clear_ssr_specs().await?;
        self.cache.clear_global_sdk_keys().await?;
        Ok(MutationStatus::Applied)
    }

    /// Registered keys, read through the key cache
    pub async fn registered_sdk_keys(&self) -> Result<NameSet> {
        if let Some(cached) = self.cache.get_sdk_keys().await? {
            return Ok(cached);
        }
        let registered = self.store.registered_sdk_keys().await?;
        self.cache.cache_sdk_keys(&registered).await?;
        Ok(registered)
    }

    /// Registered keys with no target app, read through the key cache
    pub async fn global_sdk_keys(&self) -> Result<NameSet> {
        if let Some(cached) = self.cache.get_global_sdk_keys().await? {
            return Ok(cached);
        }
        let mut global = NameSet::new();
        for sdk_key in self.registered_sdk_keys().await? {
            if self.store.target_apps_for_sdk_key(&sdk_key).await?.is_none() {
                global.insert(sdk_key);
            }
        }
        self.cache.cache_global_sdk_keys(&global).await?;
        Ok(global)
    }

    // =========================================================================
    // Key ↔ Target App
    // =========================================================================

    pub async fn assign_target_apps_to_sdk_key(&self, target_apps: &[String], sdk_key: &str) -> Result<MutationStatus> {
        self.store
            .assign_target_apps_to_sdk_key(&name_set(target_apps), sdk_key)
            .await?;
        self.invalidate_sdk_key(sdk_key).await?;
        Ok(MutationStatus::Applied)
    }

    pub async fn remove_target_apps_from_sdk_key(
        &self,
        target_apps: &[String],
        sdk_key: &str,
    ) -> Result<MutationStatus> {
        self.store
            .remove_target_apps_from_sdk_key(&name_set(target_apps), sdk_key)
            .await?;
        self.invalidate_sdk_key(sdk_key).await?;
        Ok(MutationStatus::Applied)
    }

    /// Make a key global again
    pub async fn clear_target_apps_from_sdk_key(&self, sdk_key: &str) -> Result<MutationStatus> {
        let previous = self.store.clear_target_apps_from_sdk_key(sdk_key).await?;
        tracing::debug!(apps = previous.len(), "cleared sdk key target apps");
        self.invalidate_sdk_key(sdk_key).await?;
        Ok(MutationStatus::Applied)
    }

    async fn invalidate_sdk_key(&self, sdk_key: &str) -> Result<()> {
        self.cache.clear_specs(&[sdk_key.to_string()]).await?;
        self.cache.clear_ssr_specs().await?;
        self.cache.clear_global_sdk_keys().await
    }
}
