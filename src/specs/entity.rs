//! Entity adapters
//!
//! A uniform view over the three entity kinds, used by the assembler to
//! compile each one into an [`ApiConfigSpec`].

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{DynamicConfig, EntityKind, Experiment, FeatureGate};
use crate::rules::{load_rules, number_value, ConfigRule, Operator};

use super::wire::{ApiCondition, ApiConditionType, ApiConfigSpec, ApiConfigType, ApiEntityType, ApiRule};

/// Width of the bucket space experiment groups split
pub const BUCKET_SPACE: f64 = 1000.0;

/// Compiled view of a stored entity
pub trait Entity {
    fn kind(&self) -> EntityKind;
    fn name(&self) -> &str;
    fn salt(&self) -> &str;
    fn is_enabled(&self) -> bool;
    fn default_value(&self) -> Value;
    fn id_type(&self) -> &str;
    fn rules(&self) -> Vec<ApiRule>;

    fn is_device_based(&self) -> bool {
        false
    }

    fn config_type(&self) -> ApiConfigType {
        match self.kind() {
            EntityKind::FeatureGate => ApiConfigType::FeatureGate,
            EntityKind::DynamicConfig | EntityKind::Experiment => ApiConfigType::DynamicConfig,
        }
    }

    fn entity_type(&self) -> ApiEntityType {
        match self.kind() {
            EntityKind::FeatureGate => ApiEntityType::FeatureGate,
            EntityKind::DynamicConfig => ApiEntityType::DynamicConfig,
            EntityKind::Experiment => ApiEntityType::Experiment,
        }
    }

    fn to_spec(&self) -> ApiConfigSpec {
        ApiConfigSpec {
            name: self.name().to_string(),
            config_type: self.config_type(),
            salt: self.salt().to_string(),
            default_value: self.default_value(),
            enabled: self.is_enabled(),
            rules: self.rules(),
            is_device_based: self.is_device_based(),
            id_type: self.id_type().to_string(),
            entity: self.entity_type(),
            is_active: None,
        }
    }
}

// =============================================================================
// Feature Gate
// =============================================================================

pub struct GateEntity<'a>(pub &'a FeatureGate);

/// Id, name and salt of the single rule every gate compiles to
const GATE_RULE: &str = "rule1";

impl Entity for GateEntity<'_> {
    fn kind(&self) -> EntityKind {
        EntityKind::FeatureGate
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn salt(&self) -> &str {
        &self.0.salt
    }

    fn is_enabled(&self) -> bool {
        self.0.enabled
    }

    fn default_value(&self) -> Value {
        Value::Bool(false)
    }

    fn id_type(&self) -> &str {
        &self.0.id_type
    }

    /// One rule passing everyone; `enabled` decides the outcome
    fn rules(&self) -> Vec<ApiRule> {
        vec![ApiRule {
            name: GATE_RULE.to_string(),
            group_name: None,
            pass_percentage: 100.0,
            conditions: vec![ApiCondition {
                condition_type: ApiConditionType::Public,
                target_value: Value::Null,
                operator: None,
                field: None,
                additional_values: Some(BTreeMap::new()),
                id_type: self.id_type().to_string(),
            }],
            return_value: Value::Bool(true),
            id: GATE_RULE.to_string(),
            salt: GATE_RULE.to_string(),
            id_type: self.id_type().to_string(),
            is_experiment_group: None,
        }]
    }
}

// =============================================================================
// Dynamic Config
// =============================================================================

pub struct ConfigEntity<'a>(pub &'a DynamicConfig);

impl ConfigEntity<'_> {
    /// Persisted rules that survive validation
    pub fn config_rules(&self) -> Vec<ConfigRule> {
        load_rules(self.0.rules_json.as_deref())
    }
}

impl Entity for ConfigEntity<'_> {
    fn kind(&self) -> EntityKind {
        EntityKind::DynamicConfig
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn salt(&self) -> &str {
        &self.0.salt
    }

    fn is_enabled(&self) -> bool {
        self.0.enabled
    }

    fn default_value(&self) -> Value {
        Value::Object(self.0.default_value.clone())
    }

    fn id_type(&self) -> &str {
        &self.0.id_type
    }

    fn rules(&self) -> Vec<ApiRule> {
        self.config_rules().iter().map(ConfigRule::to_api).collect()
    }
}

// =============================================================================
// Experiment
// =============================================================================

pub struct ExperimentEntity<'a>(pub &'a Experiment);

impl ExperimentEntity<'_> {
    /// Whether the experiment has started
    pub fn is_active(&self) -> bool {
        self.0.started
    }

    /// Lower bucket bound of each group: `i * 1000 / n`, unrounded
    pub fn bucket_thresholds(&self) -> Vec<f64> {
        let groups = self.0.groups.len();
        if groups == 0 {
            return Vec::new();
        }
        let span = BUCKET_SPACE / groups as f64;
        (0..groups).map(|i| span * i as f64).collect()
    }
}

impl Entity for ExperimentEntity<'_> {
    fn kind(&self) -> EntityKind {
        EntityKind::Experiment
    }

    fn name(&self) -> &str {
        &self.0.name
    }

    fn salt(&self) -> &str {
        &self.0.salt
    }

    fn is_enabled(&self) -> bool {
        self.0.enabled
    }

    fn default_value(&self) -> Value {
        Value::Object(self.0.default_value.clone())
    }

    fn id_type(&self) -> &str {
        &self.0.id_type
    }

    /// One rule per group, bucketed on the experiment salt
    fn rules(&self) -> Vec<ApiRule> {
        let additional_values = BTreeMap::from([("salt".to_string(), self.0.salt.clone())]);

        self.0
            .groups
            .iter()
            .zip(self.bucket_thresholds())
            .enumerate()
            .map(|(i, (group, threshold))| {
                let rule_id = format!("rule-{}", i);
                ApiRule {
                    name: rule_id.clone(),
                    group_name: Some(group.name.clone()),
                    pass_percentage: 100.0,
                    conditions: vec![ApiCondition {
                        condition_type: ApiConditionType::UserBucket,
                        target_value: number_value(threshold),
                        operator: Some(Operator::Lt),
                        field: None,
                        additional_values: Some(additional_values.clone()),
                        id_type: self.id_type().to_string(),
                    }],
                    return_value: Value::Object(group.parameters.clone()),
                    id: rule_id.clone(),
                    salt: rule_id,
                    id_type: self.id_type().to_string(),
                    is_experiment_group: Some(true),
                }
            })
            .collect()
    }

    fn to_spec(&self) -> ApiConfigSpec {
        ApiConfigSpec {
            name: self.name().to_string(),
            config_type: self.config_type(),
            salt: self.salt().to_string(),
            default_value: self.default_value(),
            enabled: self.is_enabled(),
            rules: self.rules(),
            is_device_based: self.is_device_based(),
            id_type: self.id_type().to_string(),
            entity: self.entity_type(),
            is_active: Some(self.is_active()),
        }
    }
}
