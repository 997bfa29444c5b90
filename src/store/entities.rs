//! Entity payloads and the target app → entity index

use crate::codec::{decode, encode, Assoc};
use crate::error::Result;
use crate::model::{EntityNames, NameSet, StoredEntity, GLOBAL_SCOPE};

use super::{name_set, AssociationStore, SetEdit};

impl AssociationStore {
    // =========================================================================
    // Entity Payloads
    // =========================================================================

    /// Load an entity by name; `None` if absent
    pub async fn get_entity<E: StoredEntity>(&self, name: &str) -> Result<Option<E>> {
        match self.get_raw(Assoc::entity(E::KIND, name)).await? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Write the payload only; indices are untouched
    pub async fn put_entity<E: StoredEntity>(&self, entity: &E) -> Result<()> {
        self.set_raw(Assoc::entity(E::KIND, entity.name()), &encode(entity)?)
            .await
    }

    /// Persist a new entity and index it globally and under each of its
    /// target apps
    pub async fn add_entity<E: StoredEntity>(&self, entity: &E) -> Result<()> {
        self.put_entity(entity).await?;

        let names = EntityNames::single(E::KIND, entity.name());
        self.add_entity_assocs(&names, None).await?;
        for app in entity.target_apps() {
            self.add_entity_assocs(&names, Some(app)).await?;
        }
        Ok(())
    }

    /// Persist an updated entity.
    ///
    /// With `new_target_apps`, every known target app (the registry plus the
    /// entity's previous apps) is reconciled: apps in the list gain the
    /// entity, the rest lose it. Apps unknown to the system are skipped and
    /// do not end up in the entity's `targetApps`.
    pub async fn update_entity<E: StoredEntity>(
        &self,
        entity: &mut E,
        new_target_apps: Option<&[String]>,
    ) -> Result<()> {
        let Some(new_target_apps) = new_target_apps else {
            return self.put_entity(entity).await;
        };

        let requested = name_set(new_target_apps);
        let mut known = self.target_app_names().await?;
        known.extend(entity.target_apps().iter().cloned());

        *entity.target_apps_mut() = requested.intersection(&known).cloned().collect();
        self.put_entity(entity).await?;

        let names = EntityNames::single(E::KIND, entity.name());
        for app in &known {
            let edit = if requested.contains(app) {
                SetEdit::Add
            } else {
                SetEdit::Remove
            };
            self.edit_entity_names(app, &names, edit).await?;
        }

        let skipped: Vec<&String> = requested.difference(&known).collect();
        if !skipped.is_empty() {
            tracing::debug!(
                kind = E::KIND.label(),
                name = entity.name(),
                ?skipped,
                "ignoring unknown target apps"
            );
        }
        Ok(())
    }

    /// Delete an entity and drop it from every index that references it.
    ///
    /// Returns the removed entity, or `None` if it did not exist.
    pub async fn remove_entity<E: StoredEntity>(&self, name: &str) -> Result<Option<E>> {
        let Some(entity) = self.get_entity::<E>(name).await? else {
            return Ok(None);
        };

        self.delete_raw(Assoc::entity(E::KIND, name)).await?;

        let names = EntityNames::single(E::KIND, name);
        let mut apps = self.target_app_names().await?;
        apps.extend(entity.target_apps().iter().cloned());
        for app in &apps {
            self.edit_entity_names(app, &names, SetEdit::Remove).await?;
        }
        self.remove_entity_assocs(&names, None).await?;
        Ok(Some(entity))
    }

    /// Scope an entity to additional target apps (both directions)
    pub async fn add_target_apps_to_entity<E: StoredEntity>(&self, entity: &mut E, apps: &NameSet) -> Result<()> {
        SetEdit::Add.apply(entity.target_apps_mut(), apps);
        self.put_entity(entity).await?;

        let names = EntityNames::single(E::KIND, entity.name());
        for app in apps {
            self.edit_entity_names(app, &names, SetEdit::Add).await?;
        }
        Ok(())
    }

    /// Unscope an entity from target apps (both directions)
    pub async fn remove_target_apps_from_entity<E: StoredEntity>(
        &self,
        entity: &mut E,
        apps: &NameSet,
    ) -> Result<()> {
        SetEdit::Remove.apply(entity.target_apps_mut(), apps);
        self.put_entity(entity).await?;

        let names = EntityNames::single(E::KIND, entity.name());
        for app in apps {
            self.edit_entity_names(app, &names, SetEdit::Remove).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Entity Indices
    // =========================================================================

    /// Entity names indexed under a target app (`None` = global index).
    /// Returns `None` when no index exists.
    pub async fn entity_assocs(&self, target_app: Option<&str>) -> Result<Option<EntityNames>> {
        let scope = target_app.unwrap_or(GLOBAL_SCOPE);
        match self.get_raw(Assoc::EntityNames(scope)).await? {
            Some(raw) => Ok(Some(decode(&raw)?)),
            None => Ok(None),
        }
    }

    /// Union names into one index
    pub async fn add_entity_assocs(&self, names: &EntityNames, target_app: Option<&str>) -> Result<()> {
        self.edit_entity_names(target_app.unwrap_or(GLOBAL_SCOPE), names, SetEdit::Add)
            .await
    }

    /// Subtract names from one index
    pub async fn remove_entity_assocs(&self, names: &EntityNames, target_app: Option<&str>) -> Result<()> {
        self.edit_entity_names(target_app.unwrap_or(GLOBAL_SCOPE), names, SetEdit::Remove)
            .await
    }

    /// Everything visible through a set of target apps.
    ///
    /// `None` resolves to the global index; otherwise the de-duplicated
    /// union of each app's index.
    pub async fn entity_assocs_for_target_apps(&self, target_apps: Option<&NameSet>) -> Result<EntityNames> {
        let Some(target_apps) = target_apps else {
            return Ok(self.entity_assocs(None).await?.unwrap_or_default());
        };

        let mut visible = EntityNames::new();
        for app in target_apps {
            if let Some(names) = self.entity_assocs(Some(app)).await? {
                visible.merge(&names);
            }
        }
        Ok(visible)
    }

    pub(crate) async fn write_entity_names(&self, scope: &str, names: &EntityNames) -> Result<()> {
        self.set_raw(Assoc::EntityNames(scope), &encode(names)?).await
    }

    /// Read-modify-write of one index. Removing from a missing index is a
    /// no-op and does not create it.
    async fn edit_entity_names(&self, scope: &str, names: &EntityNames, edit: SetEdit) -> Result<()> {
        let existing = self.entity_assocs(Some(scope)).await?;
        let mut current = match (existing, edit) {
            (Some(current), _) => current,
            (None, SetEdit::Add) => EntityNames::new(),
            (None, SetEdit::Remove) => return Ok(()),
        };
        match edit {
            SetEdit::Add => current.merge(names),
            SetEdit::Remove => current.subtract(names),
        }
        self.write_entity_names(scope, &current).await
    }
}
