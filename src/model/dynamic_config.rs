//! Dynamic config

use serde::{Deserialize, Serialize};

use super::{default_id_type, EntityKind, JsonMap, NameSet, StoredEntity};

/// A stored dynamic config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicConfig {
    pub name: String,
    pub salt: String,
    #[serde(default = "default_id_type")]
    pub id_type: String,
    #[serde(default, with = "crate::codec::tagged_set")]
    pub target_apps: NameSet,
    pub enabled: bool,
    #[serde(default)]
    pub default_value: JsonMap,
    /// Serialized ordered rule list, see [`crate::rules`]
    #[serde(rename = "rulesJSON", default, skip_serializing_if = "Option::is_none")]
    pub rules_json: Option<String>,
}

/// Creation arguments
#[derive(Debug, Clone, Default)]
pub struct DynamicConfigArgs {
    pub enabled: bool,
    pub default_value: JsonMap,
    pub id_type: Option<String>,
    pub target_apps: Vec<String>,
}

impl DynamicConfigArgs {
    pub fn new(enabled: bool, default_value: JsonMap) -> Self {
        Self {
            enabled,
            default_value,
            ..Self::default()
        }
    }

    pub fn target_apps<I, S>(mut self, apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_apps = apps.into_iter().map(Into::into).collect();
        self
    }

    pub fn id_type(mut self, id_type: impl Into<String>) -> Self {
        self.id_type = Some(id_type.into());
        self
    }
}

/// Partial update; `None` leaves the field untouched.
/// Rules are edited through [`crate::Engine::update_config_rules`].
#[derive(Debug, Clone, Default)]
pub struct DynamicConfigUpdate {
    pub enabled: Option<bool>,
    pub default_value: Option<JsonMap>,
    pub id_type: Option<String>,
    pub target_apps: Option<Vec<String>>,
}

impl DynamicConfig {
    pub fn new(name: impl Into<String>, args: DynamicConfigArgs, salt: String, default_id_type: &str) -> Self {
        Self {
            name: name.into(),
            salt,
            id_type: args.id_type.unwrap_or_else(|| default_id_type.to_string()),
            target_apps: args.target_apps.into_iter().collect(),
            enabled: args.enabled,
            default_value: args.default_value,
            rules_json: None,
        }
    }

    pub fn apply(&mut self, update: &DynamicConfigUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(default_value) = &update.default_value {
            self.default_value = default_value.clone();
        }
        if let Some(id_type) = &update.id_type {
            self.id_type = id_type.clone();
        }
    }
}

impl StoredEntity for DynamicConfig {
    const KIND: EntityKind = EntityKind::DynamicConfig;

    fn name(&self) -> &str {
        &self.name
    }

    fn target_apps(&self) -> &NameSet {
        &self.target_apps
    }

    fn target_apps_mut(&mut self) -> &mut NameSet {
        &mut self.target_apps
    }
}
