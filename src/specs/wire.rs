//! Config spec wire format
//!
//! The document consumed by evaluation SDKs. Field names and casing are
//! part of the contract.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::rules::{serialize_number, Operator};

/// Everything visible to one SDK key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSpecs {
    pub feature_gates: Vec<ApiConfigSpec>,
    /// Dynamic configs followed by experiments
    pub dynamic_configs: Vec<ApiConfigSpec>,
    /// Always empty
    pub layer_configs: Vec<ApiConfigSpec>,
    /// Always empty
    pub layers: BTreeMap<String, Vec<String>>,
    pub has_updates: bool,
    /// Assembly time, epoch milliseconds
    pub time: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashed_sdk_keys_to_entities: Option<BTreeMap<String, ApiEntityNames>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiConfigType {
    FeatureGate,
    DynamicConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiEntityType {
    FeatureGate,
    DynamicConfig,
    Experiment,
}

/// One compiled entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfigSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub config_type: ApiConfigType,
    pub salt: String,
    /// `false` for gates, a JSON object otherwise
    pub default_value: Value,
    pub enabled: bool,
    pub rules: Vec<ApiRule>,
    pub is_device_based: bool,
    pub id_type: String,
    pub entity: ApiEntityType,
    /// Experiments only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRule {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
    #[serde(serialize_with = "serialize_number")]
    pub pass_percentage: f64,
    pub conditions: Vec<ApiCondition>,
    pub return_value: Value,
    pub id: String,
    pub salt: String,
    pub id_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_experiment_group: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiConditionType {
    Public,
    UserField,
    UnitId,
    UserBucket,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCondition {
    #[serde(rename = "type")]
    pub condition_type: ApiConditionType,
    pub target_value: Value,
    pub operator: Option<Operator>,
    pub field: Option<String>,
    pub additional_values: Option<BTreeMap<String, String>>,
    pub id_type: String,
}

/// Entity names visible to one SSR source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEntityNames {
    pub gates: Vec<String>,
    /// Config names followed by experiment names
    pub configs: Vec<String>,
}
