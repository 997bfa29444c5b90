//! Model Module
//!
//! Domain types persisted by the association store.
//!
//! ## Entities
//! - [`FeatureGate`]: on/off gate
//! - [`DynamicConfig`]: default value plus an ordered, editable rule list
//! - [`Experiment`]: default value plus groups that split traffic evenly
//!
//! Every entity carries its own `targetApps` set; the reverse direction
//! lives in the per-target-app [`EntityNames`] index.

mod dynamic_config;
mod experiment;
mod gate;

pub use dynamic_config::{DynamicConfig, DynamicConfigArgs, DynamicConfigUpdate};
pub use experiment::{Experiment, ExperimentArgs, ExperimentGroup, ExperimentUpdate};
pub use gate::{FeatureGate, FeatureGateArgs, FeatureGateUpdate};

use std::collections::BTreeSet;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Set of names. Ordered so encodings and spec output are deterministic.
pub type NameSet = BTreeSet<String>;

/// JSON object used for default values and return values
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Reserved scope id meaning "no target app"
pub const GLOBAL_SCOPE: &str = "";

/// Generate a fresh salt for an entity or rule
pub fn new_salt() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub(crate) fn default_id_type() -> String {
    crate::config::DEFAULT_ID_TYPE.to_string()
}

/// The three entity kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    FeatureGate,
    DynamicConfig,
    Experiment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::FeatureGate,
        EntityKind::DynamicConfig,
        EntityKind::Experiment,
    ];

    /// Human-readable label used in log lines
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::FeatureGate => "gate",
            EntityKind::DynamicConfig => "config",
            EntityKind::Experiment => "experiment",
        }
    }
}

/// Common view over persisted entities, used by the generic store paths
pub trait StoredEntity: Serialize + DeserializeOwned + Clone + Send + Sync {
    const KIND: EntityKind;

    fn name(&self) -> &str;
    fn target_apps(&self) -> &NameSet;
    fn target_apps_mut(&mut self) -> &mut NameSet;
}

/// Names of gates, configs and experiments visible in one scope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNames {
    #[serde(default, with = "crate::codec::tagged_set")]
    pub gates: NameSet,
    #[serde(default, with = "crate::codec::tagged_set")]
    pub configs: NameSet,
    #[serde(default, with = "crate::codec::tagged_set")]
    pub experiments: NameSet,
}

impl EntityNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names containing a single entity
    pub fn single(kind: EntityKind, name: impl Into<String>) -> Self {
        let mut names = Self::default();
        names.insert(kind, name);
        names
    }

    /// Builder-style helper: add names of one kind
    pub fn with<I, S>(mut self, kind: EntityKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.insert(kind, name);
        }
        self
    }

    pub fn names(&self, kind: EntityKind) -> &NameSet {
        match kind {
            EntityKind::FeatureGate => &self.gates,
            EntityKind::DynamicConfig => &self.configs,
            EntityKind::Experiment => &self.experiments,
        }
    }

    pub fn names_mut(&mut self, kind: EntityKind) -> &mut NameSet {
        match kind {
            EntityKind::FeatureGate => &mut self.gates,
            EntityKind::DynamicConfig => &mut self.configs,
            EntityKind::Experiment => &mut self.experiments,
        }
    }

    pub fn insert(&mut self, kind: EntityKind, name: impl Into<String>) -> bool {
        self.names_mut(kind).insert(name.into())
    }

    pub fn remove(&mut self, kind: EntityKind, name: &str) -> bool {
        self.names_mut(kind).remove(name)
    }

    pub fn contains(&self, kind: EntityKind, name: &str) -> bool {
        self.names(kind).contains(name)
    }

    /// Set union, in place
    pub fn merge(&mut self, other: &EntityNames) {
        for kind in EntityKind::ALL {
            self.names_mut(kind).extend(other.names(kind).iter().cloned());
        }
    }

    /// Set difference, in place
    pub fn subtract(&mut self, other: &EntityNames) {
        for kind in EntityKind::ALL {
            let names = self.names_mut(kind);
            for name in other.names(kind) {
                names.remove(name);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        EntityKind::ALL.iter().all(|kind| self.names(*kind).is_empty())
    }

    /// Total number of names across all kinds
    pub fn len(&self) -> usize {
        EntityKind::ALL.iter().map(|kind| self.names(*kind).len()).sum()
    }

    /// Iterate over (kind, name) pairs
    pub fn iter(&self) -> impl Iterator<Item = (EntityKind, &str)> + '_ {
        EntityKind::ALL
            .into_iter()
            .flat_map(move |kind| self.names(kind).iter().map(move |name| (kind, name.as_str())))
    }
}

/// Partial replacement of a target app's entity sets; `None` keeps a kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetAppUpdate {
    pub gates: Option<NameSet>,
    pub configs: Option<NameSet>,
    pub experiments: Option<NameSet>,
}

impl TargetAppUpdate {
    pub fn names(&self, kind: EntityKind) -> Option<&NameSet> {
        match kind {
            EntityKind::FeatureGate => self.gates.as_ref(),
            EntityKind::DynamicConfig => self.configs.as_ref(),
            EntityKind::Experiment => self.experiments.as_ref(),
        }
    }

    /// Apply to the current sets, yielding the replacement
    pub fn applied_to(&self, current: &EntityNames) -> EntityNames {
        let mut next = current.clone();
        for kind in EntityKind::ALL {
            if let Some(names) = self.names(kind) {
                *next.names_mut(kind) = names.clone();
            }
        }
        next
    }
}
