//! Experiment operations
//!
//! A started experiment is frozen: updates are rejected, and starting it a
//! second time is rejected too. Deleting and re-scoping stay allowed.

use crate::error::Result;
use crate::model::{new_salt, Experiment, ExperimentArgs, ExperimentUpdate};

use super::{BatchItem, Engine, MutationStatus};

impl Engine {
    pub async fn get_experiment(&self, name: &str) -> Result<Option<Experiment>> {
        self.store.get_entity(name).await
    }

    pub async fn create_experiment(&self, name: &str, args: ExperimentArgs) -> Result<MutationStatus> {
        let experiment = Experiment::new(name, args, new_salt(), &self.config.default_id_type);
        self.create_entity(experiment).await
    }

    pub async fn update_experiment(&self, name: &str, update: &ExperimentUpdate) -> Result<MutationStatus> {
        let Some(mut experiment) = self.find::<Experiment>(name, "update").await? else {
            return Ok(MutationStatus::NotFound);
        };
        if experiment.started {
            tracing::warn!(name, "cannot update an experiment that has already started");
            return Ok(MutationStatus::Rejected);
        }
        let previous_apps = experiment.target_apps.clone();
        experiment.apply(update);
        self.commit_update(experiment, previous_apps, update.target_apps.as_deref())
            .await
    }

    pub async fn start_experiment(&self, name: &str) -> Result<MutationStatus> {
        let Some(mut experiment) = self.find::<Experiment>(name, "start").await? else {
            return Ok(MutationStatus::NotFound);
        };
        if experiment.started {
            tracing::warn!(name, "experiment has already started");
            return Ok(MutationStatus::Rejected);
        }
        experiment.started = true;
        let previous_apps = experiment.target_apps.clone();
        self.commit_update(experiment, previous_apps, None).await
    }

    pub async fn delete_experiment(&self, name: &str) -> Result<MutationStatus> {
        self.delete_entity::<Experiment>(name).await
    }

    pub async fn add_target_apps_to_experiment(&self, name: &str, target_apps: &[String]) -> Result<MutationStatus> {
        self.scope_entity::<Experiment>(name, target_apps, true).await
    }

    pub async fn remove_target_apps_from_experiment(
        &self,
        name: &str,
        target_apps: &[String],
    ) -> Result<MutationStatus> {
        self.scope_entity::<Experiment>(name, target_apps, false).await
    }

    pub async fn update_experiments(&self, updates: &[(String, ExperimentUpdate)]) -> Vec<BatchItem> {
        let mut results = Vec::with_capacity(updates.len());
        for (name, update) in updates {
            results.push(BatchItem {
                name: name.clone(),
                outcome: self.update_experiment(name, update).await,
            });
        }
        results
    }
}
