//! Conditions
//!
//! A closed set of condition variants. Each variant fixes which operators it
//! accepts, the target value shapes those operators take, and whether the
//! compared field is supplied by the caller or implied by the variant.
//!
//! ```text
//! variant       field             operators      values
//! ───────────── ───────────────── ────────────── ─────────────────────────
//! public        -                 -              -
//! custom_field  caller, non-empty all            strings and numbers
//! email         "email"           string ops     string, string[], null
//! locale        "locale"          string ops     string, string[], null
//! user_id       "userID"          string ops     string, string[], null
//! unit_id       id type (caller)  string ops     string, string[], null
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DEFAULT_ID_TYPE;
use crate::error::{GatehouseError, Result};
use crate::specs::{ApiCondition, ApiConditionType};

use super::operator::{Operator, TargetValue, ALL_OPERATORS, STRING_OPERATORS};

const EMAIL_FIELD: &str = "email";
const LOCALE_FIELD: &str = "locale";
const USER_ID_FIELD: &str = "userID";

/// Persisted condition type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Public,
    CustomField,
    Email,
    Locale,
    UnitId,
    UserId,
}

impl ConditionType {
    fn operators(&self) -> &'static [Operator] {
        match self {
            ConditionType::Public => &[],
            ConditionType::CustomField => ALL_OPERATORS,
            _ => STRING_OPERATORS,
        }
    }

    fn allows_numbers(&self) -> bool {
        matches!(self, ConditionType::CustomField)
    }

    /// Field implied by the variant, if any
    fn implicit_field(&self) -> Option<&'static str> {
        match self {
            ConditionType::Email => Some(EMAIL_FIELD),
            ConditionType::Locale => Some(LOCALE_FIELD),
            ConditionType::UserId => Some(USER_ID_FIELD),
            _ => None,
        }
    }
}

/// Validated operator and target value
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    operator: Operator,
    target_value: TargetValue,
}

impl Predicate {
    fn checked(kind: ConditionType, operator: Operator, target_value: TargetValue) -> Result<Self> {
        if !kind.operators().contains(&operator) {
            return Err(GatehouseError::InvalidCondition(format!(
                "operator '{}' is not allowed on {:?} conditions",
                operator, kind
            )));
        }
        if !target_value.fits(operator.value_shape()) {
            return Err(GatehouseError::InvalidCondition(format!(
                "operator '{}' expects a {:?} target value, got {:?}",
                operator,
                operator.value_shape(),
                target_value
            )));
        }
        if target_value.is_numeric() && !kind.allows_numbers() {
            return Err(GatehouseError::InvalidCondition(format!(
                "{:?} conditions compare strings only, got {:?}",
                kind, target_value
            )));
        }
        Ok(Self { operator, target_value })
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn target_value(&self) -> &TargetValue {
        &self.target_value
    }
}

/// A single typed predicate of a rule
///
/// Built through the validating constructors; a `Condition` value always
/// satisfies its variant's operator, value and field constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Public,
    CustomField { field: String, predicate: Predicate },
    Email(Predicate),
    Locale(Predicate),
    UnitId { id_type: String, predicate: Predicate },
    UserId(Predicate),
}

/// Persisted form of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionJson {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    #[serde(default)]
    pub operator: Option<Operator>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub target_value: TargetValue,
}

impl Condition {
    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn public() -> Self {
        Condition::Public
    }

    /// Compare an arbitrary user field
    pub fn custom_field(field: impl Into<String>, operator: Operator, value: impl Into<TargetValue>) -> Result<Self> {
        let field = field.into();
        if field.is_empty() {
            return Err(GatehouseError::InvalidCondition(
                "custom field conditions need a field name".to_string(),
            ));
        }
        let predicate = Predicate::checked(ConditionType::CustomField, operator, value.into())?;
        Ok(Condition::CustomField { field, predicate })
    }

    pub fn email(operator: Operator, value: impl Into<TargetValue>) -> Result<Self> {
        Predicate::checked(ConditionType::Email, operator, value.into()).map(Condition::Email)
    }

    pub fn locale(operator: Operator, value: impl Into<TargetValue>) -> Result<Self> {
        Predicate::checked(ConditionType::Locale, operator, value.into()).map(Condition::Locale)
    }

    pub fn user_id(operator: Operator, value: impl Into<TargetValue>) -> Result<Self> {
        Predicate::checked(ConditionType::UserId, operator, value.into()).map(Condition::UserId)
    }

    /// Compare the unit id of the given id type
    pub fn unit_id(id_type: impl Into<String>, operator: Operator, value: impl Into<TargetValue>) -> Result<Self> {
        let id_type = id_type.into();
        if id_type.is_empty() {
            return Err(GatehouseError::InvalidCondition(
                "unit id conditions need an id type".to_string(),
            ));
        }
        let predicate = Predicate::checked(ConditionType::UnitId, operator, value.into())?;
        Ok(Condition::UnitId { id_type, predicate })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn condition_type(&self) -> ConditionType {
        match self {
            Condition::Public => ConditionType::Public,
            Condition::CustomField { .. } => ConditionType::CustomField,
            Condition::Email(_) => ConditionType::Email,
            Condition::Locale(_) => ConditionType::Locale,
            Condition::UnitId { .. } => ConditionType::UnitId,
            Condition::UserId(_) => ConditionType::UserId,
        }
    }

    fn predicate(&self) -> Option<&Predicate> {
        match self {
            Condition::Public => None,
            Condition::CustomField { predicate, .. }
            | Condition::UnitId { predicate, .. }
            | Condition::Email(predicate)
            | Condition::Locale(predicate)
            | Condition::UserId(predicate) => Some(predicate),
        }
    }

    pub fn operator(&self) -> Option<Operator> {
        self.predicate().map(Predicate::operator)
    }

    pub fn target_value(&self) -> TargetValue {
        self.predicate()
            .map(|p| p.target_value().clone())
            .unwrap_or(TargetValue::Null)
    }

    /// Compared field; `None` for public conditions
    pub fn field(&self) -> Option<&str> {
        match self {
            Condition::Public => None,
            Condition::CustomField { field, .. } => Some(field),
            Condition::UnitId { id_type, .. } => Some(id_type),
            other => other.condition_type().implicit_field(),
        }
    }

    /// Unit id type the evaluator buckets on
    pub fn id_type(&self) -> &str {
        match self {
            Condition::UnitId { id_type, .. } => id_type,
            _ => DEFAULT_ID_TYPE,
        }
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    pub fn to_json(&self) -> ConditionJson {
        ConditionJson {
            condition_type: self.condition_type(),
            operator: self.operator(),
            field: self.field().map(str::to_string),
            target_value: self.target_value(),
        }
    }

    /// Re-validate a persisted condition
    pub fn from_json(json: ConditionJson) -> Result<Self> {
        let kind = json.condition_type;
        if kind == ConditionType::Public {
            return Ok(Condition::Public);
        }

        let operator = json
            .operator
            .ok_or_else(|| GatehouseError::InvalidCondition(format!("{:?} condition has no operator", kind)))?;

        match kind {
            ConditionType::Public => Ok(Condition::Public),
            ConditionType::CustomField => {
                let field = json.field.unwrap_or_default();
                Condition::custom_field(field, operator, json.target_value)
            }
            ConditionType::UnitId => {
                let id_type = json.field.unwrap_or_default();
                Condition::unit_id(id_type, operator, json.target_value)
            }
            ConditionType::Email | ConditionType::Locale | ConditionType::UserId => {
                let implicit = kind.implicit_field().unwrap_or_default();
                if let Some(field) = json.field.as_deref() {
                    if field != implicit {
                        return Err(GatehouseError::InvalidCondition(format!(
                            "{:?} conditions compare '{}', got field '{}'",
                            kind, implicit, field
                        )));
                    }
                }
                let predicate = Predicate::checked(kind, operator, json.target_value)?;
                Ok(match kind {
                    ConditionType::Email => Condition::Email(predicate),
                    ConditionType::Locale => Condition::Locale(predicate),
                    _ => Condition::UserId(predicate),
                })
            }
        }
    }

    /// Evaluator form
    pub fn to_api(&self) -> ApiCondition {
        let condition_type = match self {
            Condition::Public => ApiConditionType::Public,
            Condition::UnitId { .. } => ApiConditionType::UnitId,
            _ => ApiConditionType::UserField,
        };
        ApiCondition {
            condition_type,
            target_value: self.target_value().to_json(),
            operator: self.operator(),
            field: self.field().map(str::to_string),
            additional_values: None,
            id_type: self.id_type().to_string(),
        }
    }
}

/// Load persisted conditions, dropping any that fail validation
pub fn load_conditions(values: &[Value]) -> Vec<Condition> {
    values
        .iter()
        .filter_map(|value| {
            let parsed = serde_json::from_value::<ConditionJson>(value.clone())
                .map_err(GatehouseError::from)
                .and_then(Condition::from_json);
            match parsed {
                Ok(condition) => Some(condition),
                Err(e) => {
                    tracing::warn!(condition = %value, error = %e, "dropping unparseable config condition");
                    None
                }
            }
        })
        .collect()
}
