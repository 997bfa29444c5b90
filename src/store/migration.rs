//! Legacy encoding migration
//!
//! Older deployments stored sets as bare JSON arrays and wrote entities
//! before entities carried their own `targetApps`. This pass walks every
//! enumerated namespace, rewrites sets into the tagged encoding and repairs
//! the entity → target app direction from the app indices. Index names whose
//! entity payload is gone are pruned from every index.
//!
//! ## Namespaces
//! ```text
//! {p}:sdkKeys               registry
//! {p}:targetApps            registry
//! {p}:entities:             global index
//! {p}:entities:{h(app)}     per app
//! {p}:{h(app)}:sdkKeys      per app
//! {p}:{h(key)}:targetApps   per sdk key
//! {p}:gate|config|experiment:{h(name)}   targetApps field
//! ```
//!
//! Re-running is safe: tagged values are left alone.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::codec::tagged::{is_tagged_set, retag_legacy_set};
use crate::codec::{decode_set, Assoc};
use crate::error::{GatehouseError, Result};
use crate::model::{
    DynamicConfig, EntityKind, EntityNames, Experiment, FeatureGate, NameSet, StoredEntity, GLOBAL_SCOPE,
};

use super::AssociationStore;

const ENTITY_SET_FIELDS: [&str; 3] = ["gates", "configs", "experiments"];

/// Outcome of a migration run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Stored values inspected
    pub keys_scanned: u64,

    /// Values rewritten into the current encoding
    pub keys_rewritten: u64,

    /// Values that were already current
    pub keys_current: u64,

    /// Entities whose `targetApps` gained missing apps
    pub entities_repaired: u64,

    /// Index names pruned because their entity no longer exists
    pub dangling_pruned: u64,
}

impl MigrationReport {
    fn record(&mut self, rewritten: bool) {
        self.keys_scanned += 1;
        if rewritten {
            self.keys_rewritten += 1;
        } else {
            self.keys_current += 1;
        }
    }
}

impl AssociationStore {
    /// Rewrite legacy set encodings and repair entity scoping
    pub async fn migrate_legacy_encoding(&self) -> Result<MigrationReport> {
        let mut report = MigrationReport::default();

        let sdk_keys = self.migrate_set(Assoc::SdkKeys, &mut report).await?;
        let target_apps = self.migrate_set(Assoc::TargetApps, &mut report).await?;

        // (kind, name) → apps whose index lists the entity
        let mut scoping: BTreeMap<(EntityKind, String), NameSet> = BTreeMap::new();
        let mut note_scope = |names: &EntityNames, app: Option<&str>| {
            for (kind, name) in names.iter() {
                let apps = scoping.entry((kind, name.to_string())).or_default();
                if let Some(app) = app {
                    apps.insert(app.to_string());
                }
            }
        };

        if let Some(global) = self.migrate_entity_names(GLOBAL_SCOPE, &mut report).await? {
            note_scope(&global, None);
        }
        for app in &target_apps {
            if let Some(names) = self.migrate_entity_names(app, &mut report).await? {
                note_scope(&names, Some(app.as_str()));
            }
            self.migrate_set(Assoc::TargetAppSdkKeys(app), &mut report).await?;
        }
        for sdk_key in &sdk_keys {
            self.migrate_set(Assoc::SdkKeyTargetApps(sdk_key), &mut report).await?;
        }

        let mut dangling = EntityNames::new();
        for ((kind, name), apps) in &scoping {
            let exists = match kind {
                EntityKind::FeatureGate => self.migrate_entity::<FeatureGate>(name, apps, &mut report).await?,
                EntityKind::DynamicConfig => self.migrate_entity::<DynamicConfig>(name, apps, &mut report).await?,
                EntityKind::Experiment => self.migrate_entity::<Experiment>(name, apps, &mut report).await?,
            };
            if !exists {
                dangling.insert(*kind, name.clone());
            }
        }

        if !dangling.is_empty() {
            tracing::warn!(names = dangling.len(), "pruning index names of missing entities");
            self.remove_entity_assocs(&dangling, None).await?;
            for app in &target_apps {
                self.remove_entity_assocs(&dangling, Some(app.as_str())).await?;
            }
            report.dangling_pruned = dangling.len() as u64;
        }

        tracing::info!(
            scanned = report.keys_scanned,
            rewritten = report.keys_rewritten,
            current = report.keys_current,
            repaired = report.entities_repaired,
            pruned = report.dangling_pruned,
            "legacy encoding migration complete"
        );
        Ok(report)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Retag one top-level set; returns its names (empty if absent)
    async fn migrate_set(&self, assoc: Assoc<'_>, report: &mut MigrationReport) -> Result<NameSet> {
        let Some(raw) = self.get_raw(assoc).await? else {
            return Ok(NameSet::new());
        };
        let value: Value = serde_json::from_str(&raw)?;

        match retag_legacy_set(&value) {
            Some(retagged) => {
                let encoded = serde_json::to_string(&retagged)?;
                self.set_raw(assoc, &encoded).await?;
                report.record(true);
                decode_set(&encoded)
            }
            None if is_tagged_set(&value) => {
                report.record(false);
                decode_set(&raw)
            }
            None => Err(GatehouseError::Corruption(format!(
                "{} does not hold a set: {}",
                self.codec().key(assoc),
                raw
            ))),
        }
    }

    /// Retag the three sets of one entity index
    async fn migrate_entity_names(&self, scope: &str, report: &mut MigrationReport) -> Result<Option<EntityNames>> {
        let Some(raw) = self.get_raw(Assoc::EntityNames(scope)).await? else {
            return Ok(None);
        };
        let mut value: Value = serde_json::from_str(&raw)?;

        let mut rewritten = false;
        if let Some(obj) = value.as_object_mut() {
            for field in ENTITY_SET_FIELDS {
                if let Some(retagged) = obj.get(field).and_then(retag_legacy_set) {
                    obj.insert(field.to_string(), retagged);
                    rewritten = true;
                }
            }
        }

        let names: EntityNames = serde_json::from_value(value)?;
        if rewritten {
            self.write_entity_names(scope, &names).await?;
        }
        report.record(rewritten);
        Ok(Some(names))
    }

    /// Retag an entity's `targetApps` and add any apps whose index lists it.
    ///
    /// Returns `false` when the entity payload does not exist.
    async fn migrate_entity<E: StoredEntity>(
        &self,
        name: &str,
        listed_in: &NameSet,
        report: &mut MigrationReport,
    ) -> Result<bool> {
        let Some(raw) = self.get_raw(Assoc::entity(E::KIND, name)).await? else {
            tracing::debug!(kind = E::KIND.label(), name, "index names a missing entity");
            return Ok(false);
        };
        let mut value: Value = serde_json::from_str(&raw)?;

        let mut rewritten = false;
        if let Some(obj) = value.as_object_mut() {
            if let Some(retagged) = obj.get("targetApps").and_then(retag_legacy_set) {
                obj.insert("targetApps".to_string(), retagged);
                rewritten = true;
            }
        }

        let mut entity: E = serde_json::from_value(value)?;
        let missing: Vec<String> = listed_in.difference(entity.target_apps()).cloned().collect();
        if !missing.is_empty() {
            tracing::debug!(kind = E::KIND.label(), name, ?missing, "repairing entity target apps");
            entity.target_apps_mut().extend(missing);
            report.entities_repaired += 1;
        }

        // also catches payloads written before targetApps existed
        let stored: Value = serde_json::from_str(&raw)?;
        let rewritten = rewritten || stored != serde_json::to_value(&entity)?;
        if rewritten {
            self.put_entity(&entity).await?;
        }
        report.record(rewritten);
        Ok(true)
    }
}
