//! Operators and target values
//!
//! Each operator fixes the shape of the target value it compares against.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operator understood by the evaluator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Any,
    #[serde(rename = "none")]
    NoneOf,
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    VersionGt,
    VersionGte,
    VersionLt,
    VersionLte,
    VersionEq,
    StrContainsAny,
    StrContainsNone,
    StrStartsWithAny,
    StrEndsWithAny,
    StrMatches,
    Before,
    After,
    On,
}

/// Value shape an operator accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// List of strings or numbers, or null
    Multi,
    /// One string or number, or null
    Single,
    /// List of strings
    StringList,
    /// One string
    String,
    /// One number
    Number,
}

impl Operator {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Any => "any",
            Operator::NoneOf => "none",
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::VersionGt => "version_gt",
            Operator::VersionGte => "version_gte",
            Operator::VersionLt => "version_lt",
            Operator::VersionLte => "version_lte",
            Operator::VersionEq => "version_eq",
            Operator::StrContainsAny => "str_contains_any",
            Operator::StrContainsNone => "str_contains_none",
            Operator::StrStartsWithAny => "str_starts_with_any",
            Operator::StrEndsWithAny => "str_ends_with_any",
            Operator::StrMatches => "str_matches",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::On => "on",
        }
    }

    pub fn value_shape(&self) -> ValueShape {
        match self {
            Operator::Any | Operator::NoneOf => ValueShape::Multi,
            Operator::Eq
            | Operator::Neq
            | Operator::VersionGt
            | Operator::VersionGte
            | Operator::VersionLt
            | Operator::VersionLte
            | Operator::VersionEq => ValueShape::Single,
            Operator::StrContainsAny
            | Operator::StrContainsNone
            | Operator::StrStartsWithAny
            | Operator::StrEndsWithAny => ValueShape::StringList,
            Operator::StrMatches => ValueShape::String,
            Operator::Gt
            | Operator::Gte
            | Operator::Lt
            | Operator::Lte
            | Operator::Before
            | Operator::After
            | Operator::On => ValueShape::Number,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operators that compare strings only
pub const STRING_OPERATORS: &[Operator] = &[
    Operator::Any,
    Operator::NoneOf,
    Operator::Eq,
    Operator::Neq,
    Operator::StrContainsAny,
    Operator::StrContainsNone,
    Operator::StrStartsWithAny,
    Operator::StrEndsWithAny,
    Operator::StrMatches,
];

/// Every operator
pub const ALL_OPERATORS: &[Operator] = &[
    Operator::Any,
    Operator::NoneOf,
    Operator::Eq,
    Operator::Neq,
    Operator::Gt,
    Operator::Gte,
    Operator::Lt,
    Operator::Lte,
    Operator::VersionGt,
    Operator::VersionGte,
    Operator::VersionLt,
    Operator::VersionLte,
    Operator::VersionEq,
    Operator::StrContainsAny,
    Operator::StrContainsNone,
    Operator::StrStartsWithAny,
    Operator::StrEndsWithAny,
    Operator::StrMatches,
    Operator::Before,
    Operator::After,
    Operator::On,
];

/// Target value of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetValue {
    Null,
    String(String),
    Number(f64),
    StringList(Vec<String>),
    NumberList(Vec<f64>),
}

impl Default for TargetValue {
    fn default() -> Self {
        TargetValue::Null
    }
}

impl TargetValue {
    pub fn strings<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TargetValue::StringList(values.into_iter().map(Into::into).collect())
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, TargetValue::Number(_) | TargetValue::NumberList(_))
    }

    /// Whether this value fits the given shape
    pub fn fits(&self, shape: ValueShape) -> bool {
        match shape {
            ValueShape::Multi => matches!(
                self,
                TargetValue::Null | TargetValue::StringList(_) | TargetValue::NumberList(_)
            ),
            ValueShape::Single => matches!(
                self,
                TargetValue::Null | TargetValue::String(_) | TargetValue::Number(_)
            ),
            // an empty list decodes as StringList
            ValueShape::StringList => matches!(self, TargetValue::StringList(_)),
            ValueShape::String => matches!(self, TargetValue::String(_)),
            ValueShape::Number => matches!(self, TargetValue::Number(_)),
        }
    }

    /// Wire value; integral numbers are written without a fraction
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            TargetValue::Null => Value::Null,
            TargetValue::String(s) => Value::String(s.clone()),
            TargetValue::Number(n) => number_value(*n),
            TargetValue::StringList(items) => {
                Value::Array(items.iter().cloned().map(Value::String).collect())
            }
            TargetValue::NumberList(items) => Value::Array(items.iter().map(|n| number_value(*n)).collect()),
        }
    }
}

impl From<&str> for TargetValue {
    fn from(value: &str) -> Self {
        TargetValue::String(value.to_string())
    }
}

impl From<String> for TargetValue {
    fn from(value: String) -> Self {
        TargetValue::String(value)
    }
}

impl From<f64> for TargetValue {
    fn from(value: f64) -> Self {
        TargetValue::Number(value)
    }
}

impl From<Vec<String>> for TargetValue {
    fn from(value: Vec<String>) -> Self {
        TargetValue::StringList(value)
    }
}

impl From<Vec<f64>> for TargetValue {
    fn from(value: Vec<f64>) -> Self {
        TargetValue::NumberList(value)
    }
}

/// JSON number, integral values without a fraction
pub fn number_value(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 9.0e15 {
        serde_json::Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// `serialize_with` adapter around [`number_value`]
pub fn serialize_number<S: serde::Serializer>(n: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    number_value(*n).serialize(serializer)
}
