//! Dynamic config operations, including rule editing

use crate::error::Result;
use crate::model::{new_salt, DynamicConfig, DynamicConfigArgs, DynamicConfigUpdate};
use crate::rules::ConfigRuleBuilder;

use super::{BatchItem, Engine, MutationStatus};

impl Engine {
    pub async fn get_config(&self, name: &str) -> Result<Option<DynamicConfig>> {
        self.store.get_entity(name).await
    }

    /// Create a config with no rules; rejected if the name is taken
    pub async fn create_config(&self, name: &str, args: DynamicConfigArgs) -> Result<MutationStatus> {
        let config = DynamicConfig::new(name, args, new_salt(), &self.config.default_id_type);
        self.create_entity(config).await
    }

    pub async fn update_config(&self, name: &str, update: &DynamicConfigUpdate) -> Result<MutationStatus> {
        let Some(mut config) = self.find::<DynamicConfig>(name, "update").await? else {
            return Ok(MutationStatus::NotFound);
        };
        let previous_apps = config.target_apps.clone();
        config.apply(update);
        self.commit_update(config, previous_apps, update.target_apps.as_deref())
            .await
    }

    /// Edit a config's rule list in place.
    ///
    /// The closure gets a builder over the persisted rules; its error aborts
    /// the edit without writing anything.
    ///
    /// ```ignore
    /// engine.update_config_rules("pricing", |rules| {
    ///     let rule = rules.add_rule(NewRule::new("beta", json!({"price": 5})))?;
    ///     rules.move_rule_up(&rule.id);
    ///     Ok(())
    /// }).await?;
    /// ```
    pub async fn update_config_rules<F>(&self, name: &str, edit: F) -> Result<MutationStatus>
    where
        F: FnOnce(&mut ConfigRuleBuilder) -> Result<()>,
    {
        let Some(mut config) = self.find::<DynamicConfig>(name, "edit rules of").await? else {
            return Ok(MutationStatus::NotFound);
        };
        let mut builder = ConfigRuleBuilder::from_config(&config, self.hash.clone());
        edit(&mut builder)?;
        config.rules_json = Some(builder.to_json()?);

        let previous_apps = config.target_apps.clone();
        self.commit_update(config, previous_apps, None).await
    }

    pub async fn delete_config(&self, name: &str) -> Result<MutationStatus> {
        self.delete_entity::<DynamicConfig>(name).await
    }

    pub async fn add_target_apps_to_config(&self, name: &str, target_apps: &[String]) -> Result<MutationStatus> {
        self.scope_entity::<DynamicConfig>(name, target_apps, true).await
    }

    pub async fn remove_target_apps_from_config(&self, name: &str, target_apps: &[String]) -> Result<MutationStatus> {
        self.scope_entity::<DynamicConfig>(name, target_apps, false)
            .await
    }

    pub async fn update_configs(&self, updates: &[(String, DynamicConfigUpdate)]) -> Vec<BatchItem> {
        let mut results = Vec::with_capacity(updates.len());
        for (name, update) in updates {
            results.push(BatchItem {
                name: name.clone(),
                outcome: self.update_config(name, update).await,
            });
        }
        results
    }
}
