//! Feature gate

use serde::{Deserialize, Serialize};

use super::{default_id_type, EntityKind, NameSet, StoredEntity};

/// A stored feature gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureGate {
    pub name: String,
    pub salt: String,
    #[serde(default = "default_id_type")]
    pub id_type: String,
    #[serde(default, with = "crate::codec::tagged_set")]
    pub target_apps: NameSet,
    pub enabled: bool,
}

/// Creation arguments
#[derive(Debug, Clone, Default)]
pub struct FeatureGateArgs {
    pub enabled: bool,
    pub id_type: Option<String>,
    pub target_apps: Vec<String>,
}

impl FeatureGateArgs {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled,
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
/// `target_apps: Some(..)` fully reconciles the gate's scoping.
#[derive(Debug, Clone, Default)]
pub struct FeatureGateUpdate {
    pub enabled: Option<bool>,
    pub id_type: Option<String>,
    pub target_apps: Option<Vec<String>>,
}

impl FeatureGate {
    pub fn new(name: impl Into<String>, args: FeatureGateArgs, salt: String, default_id_type: &str) -> Self {
        Self {
            name: name.into(),
            salt,
            id_type: args.id_type.unwrap_or_else(|| default_id_type.to_string()),
            target_apps: args.target_apps.into_iter().collect(),
            enabled: args.enabled,
        }
    }

    /// Merge metadata from an update. Scoping is reconciled by the store.
    pub fn apply(&mut self, update: &FeatureGateUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(id_type) = &update.id_type {
            self.id_type = id_type.clone();
        }
    }
}

impl StoredEntity for FeatureGate {
    const KIND: EntityKind = EntityKind::FeatureGate;

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
