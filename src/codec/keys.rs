//! Storage key derivation
//!
//! Maps {association kind, source id} to a storage key.

use crate::hash::SharedHash;
use crate::model::EntityKind;

/// Every association kept in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assoc<'a> {
    /// Payload of a feature gate, by name
    FeatureGate(&'a str),
    /// Payload of a dynamic config, by name
    DynamicConfig(&'a str),
    /// Payload of an experiment, by name
    Experiment(&'a str),
    /// Target app → entity names (the global sentinel holds every entity)
    EntityNames(&'a str),
    /// Registry of known target apps
    TargetApps,
    /// SDK key → target apps
    SdkKeyTargetApps(&'a str),
    /// Target app → SDK keys
    TargetAppSdkKeys(&'a str),
    /// Registration marker of a single SDK key
    SdkKey(&'a str),
    /// Registry of registered SDK keys
    SdkKeys,
}

impl<'a> Assoc<'a> {
    /// Payload association for an entity of the given kind
    pub fn entity(kind: EntityKind, name: &'a str) -> Self {
        match kind {
            EntityKind::FeatureGate => Assoc::FeatureGate(name),
            EntityKind::DynamicConfig => Assoc::DynamicConfig(name),
            EntityKind::Experiment => Assoc::Experiment(name),
        }
    }
}

/// Derives storage keys with a fixed prefix and a pluggable hash
#[derive(Clone)]
pub struct KeyCodec {
    prefix: String,
    hash: SharedHash,
}

impl KeyCodec {
    pub fn new(prefix: impl Into<String>, hash: SharedHash) -> Self {
        Self {
            prefix: prefix.into(),
            hash,
        }
    }

    /// Storage key for an association
    pub fn key(&self, assoc: Assoc<'_>) -> String {
        let p = &self.prefix;
        match assoc {
            Assoc::FeatureGate(id) => format!("{}:gate:{}", p, self.hashed(id)),
            Assoc::DynamicConfig(id) => format!("{}:config:{}", p, self.hashed(id)),
            Assoc::Experiment(id) => format!("{}:experiment:{}", p, self.hashed(id)),
            Assoc::EntityNames(id) => format!("{}:entities:{}", p, self.hashed(id)),
            Assoc::TargetApps => format!("{}:targetApps", p),
            Assoc::SdkKeyTargetApps(id) => format!("{}:{}:targetApps", p, self.hashed(id)),
            Assoc::TargetAppSdkKeys(id) => format!("{}:{}:sdkKeys", p, self.hashed(id)),
            Assoc::SdkKey(id) => format!("{}:sdkKey:{}", p, self.hashed(id)),
            Assoc::SdkKeys => format!("{}:sdkKeys", p),
        }
    }

    /// Hash an id with the configured hash service
    pub fn hash(&self, id: &str) -> String {
        self.hash.hash(id)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    // The global sentinel ("") maps to an empty segment, not hash("")
    fn hashed(&self, id: &str) -> String {
        if id.is_empty() {
            String::new()
        } else {
            self.hash.hash(id)
        }
    }
}

impl std::fmt::Debug for KeyCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCodec").field("prefix", &self.prefix).finish()
    }
}
