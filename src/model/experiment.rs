//! Experiment

use serde::{Deserialize, Serialize};

use super::{default_id_type, EntityKind, JsonMap, NameSet, StoredEntity};

/// A stored experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Experiment {
    pub name: String,
    pub salt: String,
    #[serde(default = "default_id_type")]
    pub id_type: String,
    #[serde(default, with = "crate::codec::tagged_set")]
    pub target_apps: NameSet,
    pub enabled: bool,
    #[serde(default)]
    pub default_value: JsonMap,
    #[serde(default)]
    pub started: bool,
    /// Order is significant: it fixes each group's bucket range
    #[serde(default)]
    pub groups: Vec<ExperimentGroup>,
}

/// One arm of an experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentGroup {
    pub name: String,
    #[serde(default)]
    pub parameters: JsonMap,
}

impl ExperimentGroup {
    pub fn new(name: impl Into<String>, parameters: JsonMap) -> Self {
        Self {
            name: name.into(),
            parameters,
        }
    }
}

/// Creation arguments
#[derive(Debug, Clone, Default)]
pub struct ExperimentArgs {
    pub enabled: bool,
    pub default_value: JsonMap,
    pub groups: Vec<ExperimentGroup>,
    pub started: bool,
    pub id_type: Option<String>,
    pub target_apps: Vec<String>,
}

impl ExperimentArgs {
    pub fn new(enabled: bool, default_value: JsonMap, groups: Vec<ExperimentGroup>) -> Self {
        Self {
            enabled,
            default_value,
            groups,
            ..Self::default()
        }
    }

    pub fn started(mut self, started: bool) -> Self {
        self.started = started;
        self
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
/// Rejected by the engine once the experiment has started.
#[derive(Debug, Clone, Default)]
pub struct ExperimentUpdate {
    pub enabled: Option<bool>,
    pub default_value: Option<JsonMap>,
    pub groups: Option<Vec<ExperimentGroup>>,
    pub started: Option<bool>,
    pub id_type: Option<String>,
    pub target_apps: Option<Vec<String>>,
}

impl Experiment {
    pub fn new(name: impl Into<String>, args: ExperimentArgs, salt: String, default_id_type: &str) -> Self {
        Self {
            name: name.into(),
            salt,
            id_type: args.id_type.unwrap_or_else(|| default_id_type.to_string()),
            target_apps: args.target_apps.into_iter().collect(),
            enabled: args.enabled,
            default_value: args.default_value,
            started: args.started,
            groups: args.groups,
        }
    }

    pub fn apply(&mut self, update: &ExperimentUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(default_value) = &update.default_value {
            self.default_value = default_value.clone();
        }
        if let Some(groups) = &update.groups {
            self.groups = groups.clone();
        }
        if let Some(started) = update.started {
            self.started = started;
        }
        if let Some(id_type) = &update.id_type {
            self.id_type = id_type.clone();
        }
    }
}

impl StoredEntity for Experiment {
    const KIND: EntityKind = EntityKind::Experiment;

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
