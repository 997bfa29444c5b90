//! Target app registry and entity scoping by app

use crate::codec::Assoc;
use crate::error::Result;
use crate::model::{
    DynamicConfig, EntityKind, EntityNames, Experiment, FeatureGate, NameSet, StoredEntity, TargetAppUpdate,
};

use super::{AssociationStore, SetEdit};

impl AssociationStore {
    pub async fn target_app_names(&self) -> Result<NameSet> {
        self.read_set(Assoc::TargetApps).await
    }

    pub async fn target_app_exists(&self, name: &str) -> Result<bool> {
        Ok(self.target_app_names().await?.contains(name))
    }

    /// Register a target app with initial entities.
    ///
    /// Entities already indexed under the name (scoped before the app was
    /// registered) are kept. Each listed entity gains the app in its own
    /// `targetApps`.
    pub async fn add_target_app(&self, name: &str, entities: &EntityNames) -> Result<()> {
        let mut index = self.entity_assocs(Some(name)).await?.unwrap_or_default();
        index.merge(entities);
        self.write_entity_names(name, &index).await?;
        self.edit_set(Assoc::TargetApps, &NameSet::from([name.to_string()]), SetEdit::Add)
            .await?;
        self.link_entities(name, entities, SetEdit::Add).await
    }

    /// Replace some of a target app's entity sets.
    ///
    /// Returns `false` if the app has no index. Entities entering or leaving
    /// the app have their `targetApps` adjusted.
    pub async fn update_target_app(&self, name: &str, update: &TargetAppUpdate) -> Result<bool> {
        let Some(current) = self.entity_assocs(Some(name)).await? else {
            return Ok(false);
        };
        let next = update.applied_to(&current);

        let mut added = next.clone();
        added.subtract(&current);
        let mut removed = current.clone();
        removed.subtract(&next);

        self.write_entity_names(name, &next).await?;
        self.link_entities(name, &added, SetEdit::Add).await?;
        self.link_entities(name, &removed, SetEdit::Remove).await?;
        Ok(true)
    }

    /// Delete a target app: its index, its registration, its entities'
    /// scoping and its SDK key assignments.
    ///
    /// Returns the SDK keys that were assigned to it.
    pub async fn remove_target_app(&self, name: &str) -> Result<NameSet> {
        if let Some(index) = self.entity_assocs(Some(name)).await? {
            self.link_entities(name, &index, SetEdit::Remove).await?;
        }
        self.delete_raw(Assoc::EntityNames(name)).await?;
        self.edit_set(Assoc::TargetApps, &NameSet::from([name.to_string()]), SetEdit::Remove)
            .await?;

        let sdk_keys = self.sdk_keys_for_target_app(name).await?;
        let app = NameSet::from([name.to_string()]);
        for sdk_key in &sdk_keys {
            self.edit_set(Assoc::SdkKeyTargetApps(sdk_key), &app, SetEdit::Remove)
                .await?;
        }
        self.delete_raw(Assoc::TargetAppSdkKeys(name)).await?;
        Ok(sdk_keys)
    }

    /// Edit the entity → app direction for every listed entity that exists
    pub(crate) async fn link_entities(&self, app: &str, entities: &EntityNames, edit: SetEdit) -> Result<()> {
        for (kind, name) in entities.iter() {
            match kind {
                EntityKind::FeatureGate => self.link_entity::<FeatureGate>(app, name, edit).await?,
                EntityKind::DynamicConfig => self.link_entity::<DynamicConfig>(app, name, edit).await?,
                EntityKind::Experiment => self.link_entity::<Experiment>(app, name, edit).await?,
            }
        }
        Ok(())
    }

    async fn link_entity<E: StoredEntity>(&self, app: &str, name: &str, edit: SetEdit) -> Result<()> {
        let Some(mut entity) = self.get_entity::<E>(name).await? else {
            tracing::debug!(kind = E::KIND.label(), name, app, "skipping link of missing entity");
            return Ok(());
        };
        let changed = match edit {
            SetEdit::Add => entity.target_apps_mut().insert(app.to_string()),
            SetEdit::Remove => entity.target_apps_mut().remove(app),
        };
        if changed {
            self.put_entity(&entity).await?;
        }
        Ok(())
    }
}
