//! Rule list editing for one dynamic config

use serde_json::Value;

use crate::config::DEFAULT_ID_TYPE;
use crate::error::{GatehouseError, Result};
use crate::hash::SharedHash;
use crate::model::{new_salt, DynamicConfig};

use super::condition::Condition;
use super::list::KeyedList;
use super::rule::{load_rules, ConfigRule, ConfigRuleJson};

/// Arguments for [`ConfigRuleBuilder::add_rule`]
#[derive(Debug, Clone)]
pub struct NewRule {
    pub name: String,
    pub conditions: Vec<Condition>,
    /// Boolean or JSON object returned when the rule passes
    pub value: Value,
    pub pass_percentage: f64,
    pub id_type: String,
}

impl NewRule {
    /// A rule passing 100% of matched units, bucketed on `userID`
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            conditions: Vec::new(),
            value,
            pass_percentage: 100.0,
            id_type: DEFAULT_ID_TYPE.to_string(),
        }
    }

    pub fn condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn pass_percentage(mut self, pass_percentage: f64) -> Self {
        self.pass_percentage = pass_percentage;
        self
    }

    pub fn id_type(mut self, id_type: impl Into<String>) -> Self {
        self.id_type = id_type.into();
        self
    }
}

/// Mutable, order-preserving view over a config's rules.
///
/// Rules are addressed by id (the hash of the rule name). Moving a rule
/// exchanges it with its neighbour; it never re-derives positions.
pub struct ConfigRuleBuilder {
    rules: KeyedList<ConfigRule>,
    hash: SharedHash,
}

impl ConfigRuleBuilder {
    /// Load from persisted rule JSON
    pub fn new(rules_json: Option<&str>, hash: SharedHash) -> Self {
        Self {
            rules: KeyedList::from_items(load_rules(rules_json)),
            hash,
        }
    }

    pub fn from_config(config: &DynamicConfig, hash: SharedHash) -> Self {
        Self::new(config.rules_json.as_deref(), hash)
    }

    /// Append a new rule with a fresh salt
    pub fn add_rule(&mut self, input: NewRule) -> Result<ConfigRule> {
        if input.name.is_empty() {
            return Err(GatehouseError::InvalidRule("rule name must not be empty".to_string()));
        }
        check_pass_percentage(input.pass_percentage)?;

        let id = self.hash.hash(&input.name);
        if self.rules.contains(&id) {
            return Err(GatehouseError::DuplicateRule(format!("{} ({})", input.name, id)));
        }

        let rule = ConfigRule {
            id,
            name: input.name,
            conditions: input.conditions,
            pass_percentage: input.pass_percentage,
            return_value: input.value,
            salt: new_salt(),
            id_type: input.id_type,
        };
        self.rules.push_back(rule.clone());
        Ok(rule)
    }

    /// Replace the rule with the same id; `Ok(false)` if there is none
    pub fn update_rule(&mut self, rule: ConfigRule) -> Result<bool> {
        check_pass_percentage(rule.pass_percentage)?;
        Ok(self.rules.update(rule))
    }

    pub fn delete_rule(&mut self, id: &str) -> bool {
        self.rules.remove(id).is_some()
    }

    /// Exchange with the previous rule; false at the head or if unknown
    pub fn move_rule_up(&mut self, id: &str) -> bool {
        let Some(prev) = self.rules.prev(id).map(|r| r.id.clone()) else {
            return false;
        };
        self.rules.swap(&prev, id)
    }

    /// Exchange with the next rule; false at the tail or if unknown
    pub fn move_rule_down(&mut self, id: &str) -> bool {
        let Some(next) = self.rules.next(id).map(|r| r.id.clone()) else {
            return false;
        };
        self.rules.swap(&next, id)
    }

    pub fn swap_rules(&mut self, a: &str, b: &str) -> bool {
        self.rules.swap(a, b)
    }

    pub fn rule(&self, id: &str) -> Option<&ConfigRule> {
        self.rules.get(id)
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> Vec<ConfigRule> {
        self.rules.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Serialize the current order into the persisted rule format
    pub fn to_json(&self) -> Result<String> {
        let rules: Vec<ConfigRuleJson> = self.rules.iter().map(ConfigRule::to_json).collect();
        Ok(serde_json::to_string(&rules)?)
    }
}

fn check_pass_percentage(pass_percentage: f64) -> Result<()> {
    if !(0.0..=100.0).contains(&pass_percentage) {
        return Err(GatehouseError::InvalidRule(format!(
            "pass percentage must be within [0, 100], got {}",
            pass_percentage
        )));
    }
    Ok(())
}
