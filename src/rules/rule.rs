//! Config rules and their persisted form

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_ID_TYPE;
use crate::specs::ApiRule;

use super::condition::{load_conditions, Condition, ConditionJson};
use super::list::Keyed;
use super::operator::serialize_number;

/// One rule of a dynamic config
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRule {
    pub id: String,
    pub name: String,
    pub conditions: Vec<Condition>,
    pub pass_percentage: f64,
    /// Boolean or JSON object
    pub return_value: Value,
    pub salt: String,
    pub id_type: String,
}

/// Persisted form of a rule
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigRuleJson {
    pub id: String,
    pub name: String,
    pub conditions: Vec<ConditionJson>,
    #[serde(serialize_with = "serialize_number")]
    pub pass_percentage: f64,
    pub return_value: Value,
    pub salt: String,
    pub id_type: String,
}

/// Loose shape used while loading; conditions are validated one by one
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRule {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    conditions: Vec<Value>,
    pass_percentage: f64,
    return_value: Value,
    #[serde(default)]
    salt: Option<String>,
    #[serde(default)]
    id_type: Option<String>,
}

impl ConfigRule {
    pub fn to_json(&self) -> ConfigRuleJson {
        ConfigRuleJson {
            id: self.id.clone(),
            name: self.name.clone(),
            conditions: self.conditions.iter().map(Condition::to_json).collect(),
            pass_percentage: self.pass_percentage,
            return_value: self.return_value.clone(),
            salt: self.salt.clone(),
            id_type: self.id_type.clone(),
        }
    }

    /// Evaluator form
    pub fn to_api(&self) -> ApiRule {
        ApiRule {
            name: self.name.clone(),
            group_name: None,
            pass_percentage: self.pass_percentage,
            conditions: self.conditions.iter().map(Condition::to_api).collect(),
            return_value: self.return_value.clone(),
            id: self.id.clone(),
            salt: self.salt.clone(),
            id_type: self.id_type.clone(),
            is_experiment_group: None,
        }
    }

    fn from_stored(stored: StoredRule) -> Self {
        let StoredRule {
            id,
            name,
            conditions,
            pass_percentage,
            return_value,
            salt,
            id_type,
        } = stored;
        Self {
            name: name.unwrap_or_else(|| id.clone()),
            salt: salt.unwrap_or_else(|| id.clone()),
            conditions: load_conditions(&conditions),
            pass_percentage,
            return_value,
            id_type: id_type.unwrap_or_else(|| DEFAULT_ID_TYPE.to_string()),
            id,
        }
    }
}

impl Keyed for ConfigRule {
    fn key(&self) -> &str {
        &self.id
    }
}

/// Load a persisted rule list.
///
/// Never fails: absent or unparseable data yields no rules, malformed rules
/// and invalid conditions are dropped with a warning.
pub fn load_rules(data: Option<&str>) -> Vec<ConfigRule> {
    let Some(data) = data else {
        return Vec::new();
    };

    let values: Vec<Value> = match serde_json::from_str(data) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!(error = %e, "rules JSON is not an array, treating as empty");
            return Vec::new();
        }
    };

    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<StoredRule>(value.clone()) {
            Ok(stored) => Some(ConfigRule::from_stored(stored)),
            Err(e) => {
                tracing::warn!(rule = %value, error = %e, "dropping unparseable config rule");
                None
            }
        })
        .collect()
}
