//! Feature gate operations

use crate::error::Result;
use crate::model::{new_salt, FeatureGate, FeatureGateArgs, FeatureGateUpdate};

use super::{BatchItem, Engine, MutationStatus};

impl Engine {
    pub async fn get_gate(&self, name: &str) -> Result<Option<FeatureGate>> {
        self.store.get_entity(name).await
    }

    /// Create a gate with a fresh salt; rejected if the name is taken
    pub async fn create_gate(&self, name: &str, args: FeatureGateArgs) -> Result<MutationStatus> {
        let gate = FeatureGate::new(name, args, new_salt(), &self.config.default_id_type);
        self.create_entity(gate).await
    }

    pub async fn update_gate(&self, name: &str, update: &FeatureGateUpdate) -> Result<MutationStatus> {
        let Some(mut gate) = self.find::<FeatureGate>(name, "update").await? else {
            return Ok(MutationStatus::NotFound);
        };
        let previous_apps = gate.target_apps.clone();
        gate.apply(update);
        self.commit_update(gate, previous_apps, update.target_apps.as_deref())
            .await
    }

    pub async fn delete_gate(&self, name: &str) -> Result<MutationStatus> {
        self.delete_entity::<FeatureGate>(name).await
    }

    pub async fn add_target_apps_to_gate(&self, name: &str, target_apps: &[String]) -> Result<MutationStatus> {
        self.scope_entity::<FeatureGate>(name, target_apps, true).await
    }

    pub async fn remove_target_apps_from_gate(&self, name: &str, target_apps: &[String]) -> Result<MutationStatus> {
        self.scope_entity::<FeatureGate>(name, target_apps, false).await
    }

    /// Apply each update independently; one failure does not stop the rest
    pub async fn update_gates(&self, updates: &[(String, FeatureGateUpdate)]) -> Vec<BatchItem> {
        let mut results = Vec::with_capacity(updates.len());
        for (name, update) in updates {
            results.push(BatchItem {
                name: name.clone(),
                outcome: self.update_gate(name, update).await,
            });
        }
        results
    }
}
