//! SDK key registry and the key ↔ target app association

use crate::codec::Assoc;
use crate::error::Result;
use crate::model::NameSet;

use super::{AssociationStore, SetEdit};

/// Value of the per-key registration marker
const REGISTERED: &str = "registered";

impl AssociationStore {
    // =========================================================================
    // Registry
    // =========================================================================

    pub async fn registered_sdk_keys(&self) -> Result<NameSet> {
        self.read_set(Assoc::SdkKeys).await
    }

    pub async fn is_sdk_key_registered(&self, sdk_key: &str) -> Result<bool> {
        Ok(self.get_raw(Assoc::SdkKey(sdk_key)).await?.is_some())
    }

    /// Register a key; returns the new registry
    pub async fn add_sdk_key(&self, sdk_key: &str) -> Result<NameSet> {
        self.set_raw(Assoc::SdkKey(sdk_key), REGISTERED).await?;
        self.edit_set(Assoc::SdkKeys, &NameSet::from([sdk_key.to_string()]), SetEdit::Add)
            .await
    }

    /// Deregister a key; returns the new registry
    pub async fn remove_sdk_key(&self, sdk_key: &str) -> Result<NameSet> {
        self.delete_raw(Assoc::SdkKey(sdk_key)).await?;
        self.edit_set(Assoc::SdkKeys, &NameSet::from([sdk_key.to_string()]), SetEdit::Remove)
            .await
    }

    // =========================================================================
    // Key ↔ Target App
    // =========================================================================

    /// Target apps assigned to a key; `None` means the key is global
    pub async fn target_apps_for_sdk_key(&self, sdk_key: &str) -> Result<Option<NameSet>> {
        let apps = self.read_set(Assoc::SdkKeyTargetApps(sdk_key)).await?;
        Ok(if apps.is_empty() { None } else { Some(apps) })
    }

    pub async fn sdk_keys_for_target_app(&self, target_app: &str) -> Result<NameSet> {
        self.read_set(Assoc::TargetAppSdkKeys(target_app)).await
    }

    /// Set union on both directions
    pub async fn assign_target_apps_to_sdk_key(&self, target_apps: &NameSet, sdk_key: &str) -> Result<()> {
        self.edit_set(Assoc::SdkKeyTargetApps(sdk_key), target_apps, SetEdit::Add)
            .await?;
        let key = NameSet::from([sdk_key.to_string()]);
        for app in target_apps {
            self.edit_set(Assoc::TargetAppSdkKeys(app), &key, SetEdit::Add).await?;
        }
        Ok(())
    }

    /// Set difference on both directions
    pub async fn remove_target_apps_from_sdk_key(&self, target_apps: &NameSet, sdk_key: &str) -> Result<()> {
        self.edit_set(Assoc::SdkKeyTargetApps(sdk_key), target_apps, SetEdit::Remove)
            .await?;
        let key = NameSet::from([sdk_key.to_string()]);
        for app in target_apps {
            self.edit_set(Assoc::TargetAppSdkKeys(app), &key, SetEdit::Remove)
                .await?;
        }
        Ok(())
    }

    /// Drop every assignment of a key; returns the apps it had
    pub async fn clear_target_apps_from_sdk_key(&self, sdk_key: &str) -> Result<NameSet> {
        let previous = self.read_set(Assoc::SdkKeyTargetApps(sdk_key)).await?;
        self.delete_raw(Assoc::SdkKeyTargetApps(sdk_key)).await?;

        let key = NameSet::from([sdk_key.to_string()]);
        for app in &previous {
            self.edit_set(Assoc::TargetAppSdkKeys(app), &key, SetEdit::Remove)
                .await?;
        }
        Ok(previous)
    }
}
