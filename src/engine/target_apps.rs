//! Target app administration

use crate::error::Result;
use crate::model::{EntityNames, NameSet, TargetAppUpdate, GLOBAL_SCOPE};
use crate::store::SetEdit;

use super::{Engine, MutationStatus};

impl Engine {
    /// Register a target app scoping the given entities.
    ///
    /// Rejected for the reserved global name and for names already taken.
    pub async fn create_target_app(&self, name: &str, entities: &EntityNames) -> Result<MutationStatus> {
        if name == GLOBAL_SCOPE {
            tracing::error!("invalid name for target app: the empty name is reserved");
            return Ok(MutationStatus::Rejected);
        }
        if self.store.target_app_exists(name).await? {
            tracing::warn!(name, "target app already exists");
            return Ok(MutationStatus::Rejected);
        }
        self.store.add_target_app(name, entities).await?;
        self.invalidate_target_apps(&NameSet::from([name.to_string()]))
            .await?;
        Ok(MutationStatus::Applied)
    }

    /// Replace the entity sets given in `update`; the others are kept
    pub async fn update_target_app(&self, name: &str, update: &TargetAppUpdate) -> Result<MutationStatus> {
        if !self.store.update_target_app(name, update).await? {
            tracing::warn!(name, "attempting to update non-existent target app");
            return Ok(MutationStatus::NotFound);
        }
        self.invalidate_target_apps(&NameSet::from([name.to_string()]))
            .await?;
        Ok(MutationStatus::Applied)
    }

    /// Delete a target app. SDK keys assigned only to it become global.
    pub async fn delete_target_app(&self, name: &str) -> Result<MutationStatus> {
        if !self.store.target_app_exists(name).await? {
            tracing::warn!(name, "attempting to delete non-existent target app");
            return Ok(MutationStatus::NotFound);
        }
        let detached = self.store.remove_target_app(name).await?;
        self.cache.clear_global_sdk_keys().await?;
        self.cache.clear_specs(&detached).await?;
        self.invalidate_target_apps(&NameSet::new()).await?;
        Ok(MutationStatus::Applied)
    }

    /// Scope existing entities to a target app (both directions)
    pub async fn add_entities_to_target_app(&self, name: &str, entities: &EntityNames) -> Result<MutationStatus> {
        self.edit_target_app_entities(name, entities, SetEdit::Add).await
    }

    /// Unscope entities from a target app (both directions)
    pub async fn remove_entities_from_target_app(
        &self,
        name: &str,
        entities: &EntityNames,
    ) -> Result<MutationStatus> {
        self.edit_target_app_entities(name, entities, SetEdit::Remove)
            .await
    }

    /// Target apps of one SDK key (`None` when the key is global), or every
    /// registered target app
    pub async fn target_app_names(&self, sdk_key: Option<&str>) -> Result<Option<NameSet>> {
        match sdk_key {
            Some(sdk_key) => self.store.target_apps_for_sdk_key(sdk_key).await,
            None => Ok(Some(self.store.target_app_names().await?)),
        }
    }

    async fn edit_target_app_entities(&self, name: &str, entities: &EntityNames, edit: SetEdit) -> Result<MutationStatus> {
        if !self.store.target_app_exists(name).await? {
            tracing::warn!(name, "attempting to edit entities of non-existent target app");
            return Ok(MutationStatus::NotFound);
        }
        match edit {
            SetEdit::Add => self.store.add_entity_assocs(entities, Some(name)).await?,
            SetEdit::Remove => self.store.remove_entity_assocs(entities, Some(name)).await?,
        }
        self.store.link_entities(name, entities, edit).await?;
        self.invalidate_target_apps(&NameSet::from([name.to_string()]))
            .await?;
        Ok(MutationStatus::Applied)
    }
}
