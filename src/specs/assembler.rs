//! Spec assembly
//!
//! ```text
//!   sdk key ─▶ target apps ─▶ visible EntityNames ─▶ payloads ─▶ adapters ─▶ ConfigSpecs
//!                (none ⇒ global index)
//! ```

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::Result;
use crate::hash::SharedHash;
use crate::model::{DynamicConfig, EntityNames, Experiment, FeatureGate};
use crate::store::AssociationStore;

use super::entity::{ConfigEntity, Entity, ExperimentEntity, GateEntity};
use super::options::{ConfigSpecsOptions, Selection, SsrOptions};
use super::wire::{ApiEntityNames, ConfigSpecs};

/// Compiles config specs from the association store
#[derive(Clone)]
pub struct SpecAssembler {
    store: AssociationStore,
    hash: SharedHash,
}

impl SpecAssembler {
    pub fn new(store: AssociationStore, hash: SharedHash) -> Self {
        Self { store, hash }
    }

    /// Build the spec document for one SDK key, bypassing any cache
    pub async fn assemble(&self, sdk_key: &str, options: &ConfigSpecsOptions) -> Result<ConfigSpecs> {
        let target_apps = self.store.target_apps_for_sdk_key(sdk_key).await?;
        let visible = self
            .store
            .entity_assocs_for_target_apps(target_apps.as_ref())
            .await?;

        let mut feature_gates = Vec::with_capacity(visible.gates.len());
        for name in &visible.gates {
            if let Some(gate) = self.store.get_entity::<FeatureGate>(name).await? {
                feature_gates.push(GateEntity(&gate).to_spec());
            }
        }

        let mut dynamic_configs = Vec::with_capacity(visible.configs.len() + visible.experiments.len());
        for name in &visible.configs {
            if let Some(config) = self.store.get_entity::<DynamicConfig>(name).await? {
                dynamic_configs.push(ConfigEntity(&config).to_spec());
            }
        }
        for name in &visible.experiments {
            if let Some(experiment) = self.store.get_entity::<Experiment>(name).await? {
                dynamic_configs.push(ExperimentEntity(&experiment).to_spec());
            }
        }

        let hashed_sdk_keys_to_entities = match &options.ssr {
            Some(ssr) => Some(self.hashed_sdk_keys_to_entities(ssr).await?),
            None => None,
        };

        tracing::debug!(
            gates = feature_gates.len(),
            configs = dynamic_configs.len(),
            scoped = target_apps.is_some(),
            "assembled config specs"
        );

        Ok(ConfigSpecs {
            feature_gates,
            dynamic_configs,
            layer_configs: Vec::new(),
            layers: BTreeMap::new(),
            has_updates: true,
            time: now_millis(),
            hashed_sdk_keys_to_entities,
        })
    }

    /// Map `hash(source)` to the entities each requested client key or
    /// target app can see.
    ///
    /// Client keys without target apps and target apps without an index are
    /// left out.
    pub async fn hashed_sdk_keys_to_entities(&self, ssr: &SsrOptions) -> Result<BTreeMap<String, ApiEntityNames>> {
        let mut mapping = BTreeMap::new();

        if let Some(selection) = &ssr.client_keys {
            let keys = match selection {
                Selection::All => self.store.registered_sdk_keys().await?.into_iter().collect(),
                Selection::List(keys) => keys.clone(),
            };
            for key in keys {
                let Some(apps) = self.store.target_apps_for_sdk_key(&key).await? else {
                    continue;
                };
                let names = self.store.entity_assocs_for_target_apps(Some(&apps)).await?;
                mapping.insert(self.hash.hash(&key), flatten(&names));
            }
        }

        if let Some(selection) = &ssr.target_apps {
            let apps = match selection {
                Selection::All => self.store.target_app_names().await?.into_iter().collect(),
                Selection::List(apps) => apps.clone(),
            };
            for app in apps {
                if let Some(names) = self.store.entity_assocs(Some(&app)).await? {
                    mapping.insert(self.hash.hash(&app), flatten(&names));
                }
            }
        }

        Ok(mapping)
    }
}

fn flatten(names: &EntityNames) -> ApiEntityNames {
    ApiEntityNames {
        gates: names.gates.iter().cloned().collect(),
        configs: names
            .configs
            .iter()
            .chain(names.experiments.iter())
            .cloned()
            .collect(),
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
