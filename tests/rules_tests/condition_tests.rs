//! Tests for Conditions
//!
//! These tests verify:
//! - Each variant accepts only its own operators and value shapes
//! - Persisted and evaluator encodings
//! - Loading drops invalid conditions without aborting the list

use gatehouse::rules::{load_conditions, Condition, ConditionJson, ConditionType, Operator, TargetValue};
use gatehouse::GatehouseError;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn strings(values: &[&str]) -> TargetValue {
    TargetValue::strings(values.iter().copied())
}

fn assert_invalid(result: gatehouse::Result<Condition>) {
    match result {
        Err(GatehouseError::InvalidCondition(_)) => {}
        other => panic!("expected InvalidCondition, got {:?}", other),
    }
}

// =============================================================================
// Construction Tests
// =============================================================================

#[test]
fn test_public_condition() {
    let condition = Condition::public();
    assert_eq!(condition.condition_type(), ConditionType::Public);
    assert_eq!(condition.operator(), None);
    assert_eq!(condition.field(), None);
    assert_eq!(condition.target_value(), TargetValue::Null);
}

#[test]
fn test_string_variants_accept_string_operators() {
    assert!(Condition::email(Operator::Any, strings(&["a@x.com"])).is_ok());
    assert!(Condition::locale(Operator::StrMatches, "en_.*").is_ok());
    assert!(Condition::user_id(Operator::Eq, "u1").is_ok());
    assert!(Condition::unit_id("stableID", Operator::NoneOf, strings(&["d1"])).is_ok());
}

#[test]
fn test_string_variants_reject_numeric_operators() {
    assert_invalid(Condition::email(Operator::Gt, 3.0));
    assert_invalid(Condition::user_id(Operator::VersionGt, "1.2.0"));
    assert_invalid(Condition::locale(Operator::Before, 1_700_000_000_000.0));
}

#[test]
fn test_custom_field_accepts_every_operator() {
    assert!(Condition::custom_field("age", Operator::Gte, 18.0).is_ok());
    assert!(Condition::custom_field("appVersion", Operator::VersionGte, "2.1.0").is_ok());
    assert!(Condition::custom_field("plan", Operator::Any, strings(&["pro", "team"])).is_ok());
    assert!(Condition::custom_field("score", Operator::Any, vec![1.0, 2.0]).is_ok());
}

#[test]
fn test_value_shape_is_enforced() {
    // list operators need a list
    assert_invalid(Condition::email(Operator::Any, "a@x.com"));
    // prefix/suffix operators need a list of strings
    assert_invalid(Condition::email(Operator::StrStartsWithAny, "admin"));
    assert!(Condition::email(Operator::StrStartsWithAny, strings(&["admin"])).is_ok());
    assert!(Condition::email(Operator::StrEndsWithAny, strings(&["@x.com"])).is_ok());
    // numeric comparisons need a number
    assert_invalid(Condition::custom_field("age", Operator::Gt, "18"));
}

#[test]
fn test_caller_supplied_fields_must_be_present() {
    assert_invalid(Condition::custom_field("", Operator::Eq, "x"));
    assert_invalid(Condition::unit_id("", Operator::Eq, "x"));
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_persisted_form() {
    let condition = Condition::email(Operator::StrContainsAny, strings(&["@x.com"])).unwrap();
    assert_eq!(
        serde_json::to_value(condition.to_json()).unwrap(),
        json!({
            "type": "email",
            "operator": "str_contains_any",
            "field": "email",
            "targetValue": ["@x.com"],
        })
    );
    assert_eq!(Condition::from_json(condition.to_json()).unwrap(), condition);
}

#[test]
fn test_user_field_api_form() {
    let condition = Condition::user_id(Operator::Any, strings(&["u1", "u2"])).unwrap();
    assert_eq!(
        serde_json::to_value(condition.to_api()).unwrap(),
        json!({
            "type": "user_field",
            "targetValue": ["u1", "u2"],
            "operator": "any",
            "field": "userID",
            "additionalValues": null,
            "idType": "userID",
        })
    );
}

#[test]
fn test_unit_id_api_form_uses_id_type() {
    let condition = Condition::unit_id("stableID", Operator::Eq, "device-1").unwrap();
    let api = serde_json::to_value(condition.to_api()).unwrap();
    assert_eq!(api["type"], json!("unit_id"));
    assert_eq!(api["field"], json!("stableID"));
    assert_eq!(api["idType"], json!("stableID"));
}

#[test]
fn test_integral_numbers_have_no_fraction() {
    let condition = Condition::custom_field("age", Operator::Gte, 18.0).unwrap();
    let api = serde_json::to_value(condition.to_api()).unwrap();
    assert_eq!(api["targetValue"].to_string(), "18");
}

#[test]
fn test_public_api_form() {
    let api = serde_json::to_value(Condition::public().to_api()).unwrap();
    assert_eq!(api["type"], json!("public"));
    assert_eq!(api["operator"], Value::Null);
    assert_eq!(api["field"], Value::Null);
}

// =============================================================================
// Loading Tests
// =============================================================================

#[test]
fn test_load_drops_only_invalid_conditions() {
    let stored = vec![
        json!({"type": "public"}),
        json!({"type": "email", "operator": "gt", "field": "email", "targetValue": 5}),
        json!({"type": "user_id", "operator": "any", "field": "userID", "targetValue": ["u1"]}),
        json!({"type": "no_such_type"}),
        json!({"type": "custom_field", "operator": "eq", "targetValue": "x"}),
        json!({"type": "locale", "operator": "str_starts_with_any", "field": "locale", "targetValue": ["en"]}),
    ];

    let loaded = load_conditions(&stored);

    let types: Vec<ConditionType> = loaded.iter().map(Condition::condition_type).collect();
    assert_eq!(
        types,
        vec![ConditionType::Public, ConditionType::UserId, ConditionType::Locale]
    );
}

#[test]
fn test_from_json_requires_operator() {
    let json: ConditionJson = serde_json::from_value(json!({"type": "user_id", "targetValue": "u1"})).unwrap();
    assert!(Condition::from_json(json).is_err());
}
