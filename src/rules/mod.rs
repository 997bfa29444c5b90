//! Rules Module
//!
//! The rule and condition model behind dynamic configs.
//!
//! ## Responsibilities
//! - Validate conditions against their variant at construction
//! - Load persisted rule JSON leniently (bad conditions are dropped, not fatal)
//! - Edit a config's rule list by rule id while preserving order
//!
//! ## Persisted Format
//! ```text
//! [
//!   { "id": "...", "name": "...",
//!     "conditions": [ { "type", "operator", "field", "targetValue" }, ... ],
//!     "passPercentage": 100, "returnValue": {...},
//!     "salt": "...", "idType": "userID" },
//!   ...
//! ]
//! ```

mod builder;
mod condition;
mod list;
mod operator;
mod rule;

pub use builder::{ConfigRuleBuilder, NewRule};
pub use condition::{load_conditions, Condition, ConditionJson, ConditionType, Predicate};
pub use list::{Iter, Keyed, KeyedList};
pub use operator::{number_value, serialize_number, Operator, TargetValue, ValueShape};
pub use rule::{load_rules, ConfigRule, ConfigRuleJson};
