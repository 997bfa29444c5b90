//! Tests for Engine
//!
//! These tests verify:
//! - Entity lifecycle as seen through config specs
//! - Scoped SDK keys see the union of their target apps
//! - Cached specs are invalidated by every visible mutation, for
//!   registered, unregistered and deactivated keys alike
//! - Started experiments are frozen
//! - Not-found and rejected outcomes, per item in batches
//! - Config rule editing through the engine

use std::collections::BTreeMap;
use std::sync::Arc;

use gatehouse::model::{
    DynamicConfigArgs, DynamicConfigUpdate, EntityKind, EntityNames, ExperimentArgs, ExperimentGroup,
    ExperimentUpdate, FeatureGate, FeatureGateArgs, FeatureGateUpdate, JsonMap,
};
use gatehouse::specs::{ApiConditionType, ApiEntityNames, ConfigSpecs};
use gatehouse::{
    Config, ConfigSpecsOptions, Engine, GatehouseError, MemoryStorage, MutationStatus, NewRule, SsrOptions,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

async fn engine() -> Engine {
    engine_with(Config::default()).await
}

async fn engine_with(config: Config) -> Engine {
    let engine = Engine::new(Arc::new(MemoryStorage::new()), config).unwrap();
    engine.initialize().await.unwrap();
    engine
}

async fn specs(engine: &Engine, sdk_key: &str) -> ConfigSpecs {
    engine
        .get_config_specs(sdk_key, &ConfigSpecsOptions::default())
        .await
        .unwrap()
}

fn gate_names(specs: &ConfigSpecs) -> Vec<&str> {
    specs.feature_gates.iter().map(|s| s.name.as_str()).collect()
}

fn config_names(specs: &ConfigSpecs) -> Vec<&str> {
    specs.dynamic_configs.iter().map(|s| s.name.as_str()).collect()
}

fn apps(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn params(value: Value) -> JsonMap {
    value.as_object().cloned().unwrap_or_default()
}

fn ab_experiment() -> ExperimentArgs {
    ExperimentArgs::new(
        true,
        params(json!({"color": "grey"})),
        vec![
            ExperimentGroup::new("A", params(json!({"color": "red"}))),
            ExperimentGroup::new("B", params(json!({"color": "blue"}))),
        ],
    )
}

// =============================================================================
// Gate Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_gate_lifecycle() {
    let engine = engine().await;
    engine.register_sdk_key("k1").await.unwrap();

    let status = engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();
    assert_eq!(status, MutationStatus::Applied);

    let served = specs(&engine, "k1").await;
    assert_eq!(gate_names(&served), vec!["g1"]);
    let gate = &served.feature_gates[0];
    assert!(gate.enabled);
    assert_eq!(gate.rules.len(), 1);
    assert_eq!(gate.rules[0].pass_percentage, 100.0);
    assert_eq!(gate.rules[0].conditions[0].condition_type, ApiConditionType::Public);

    let disable = FeatureGateUpdate {
        enabled: Some(false),
        ..Default::default()
    };
    engine.update_gate("g1", &disable).await.unwrap();
    assert!(!specs(&engine, "k1").await.feature_gates[0].enabled);

    assert_eq!(engine.delete_gate("g1").await.unwrap(), MutationStatus::Applied);
    assert!(specs(&engine, "k1").await.feature_gates.is_empty());
    assert!(engine.get_gate("g1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_unregistered_key_sees_global_specs() {
    let engine = engine().await;
    engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();

    let served = specs(&engine, "never-registered").await;
    assert_eq!(gate_names(&served), vec!["g1"]);
    assert!(served.has_updates);
    assert!(served.layer_configs.is_empty());
    assert!(served.hashed_sdk_keys_to_entities.is_none());
}

#[tokio::test]
async fn test_scoped_key_sees_union_of_apps() {
    let engine = engine().await;
    for name in ["g1", "g2", "g3"] {
        engine.create_gate(name, FeatureGateArgs::enabled(true)).await.unwrap();
    }
    engine
        .create_target_app("web", &EntityNames::single(EntityKind::FeatureGate, "g1"))
        .await
        .unwrap();
    engine
        .create_target_app(
            "ios",
            &EntityNames::new().with(EntityKind::FeatureGate, ["g1", "g2"]),
        )
        .await
        .unwrap();
    engine.register_sdk_key("scoped").await.unwrap();
    engine.register_sdk_key("global").await.unwrap();
    engine
        .assign_target_apps_to_sdk_key(&apps(&["web", "ios"]), "scoped")
        .await
        .unwrap();

    assert_eq!(gate_names(&specs(&engine, "scoped").await), vec!["g1", "g2"]);
    assert_eq!(gate_names(&specs(&engine, "global").await), vec!["g1", "g2", "g3"]);
}

// =============================================================================
// Cache Coherence Tests
// =============================================================================

#[tokio::test]
async fn test_cached_specs_follow_mutations() {
    let engine = engine().await;
    engine.register_sdk_key("global").await.unwrap();
    engine.register_sdk_key("scoped").await.unwrap();
    engine.create_target_app("web", &EntityNames::new()).await.unwrap();
    engine
        .assign_target_apps_to_sdk_key(&apps(&["web"]), "scoped")
        .await
        .unwrap();

    // warm both caches
    assert!(specs(&engine, "global").await.feature_gates.is_empty());
    assert!(specs(&engine, "scoped").await.feature_gates.is_empty());

    engine
        .create_gate("g1", FeatureGateArgs::enabled(true).target_apps(["web"]))
        .await
        .unwrap();
    assert_eq!(gate_names(&specs(&engine, "global").await), vec!["g1"]);
    assert_eq!(gate_names(&specs(&engine, "scoped").await), vec!["g1"]);

    engine
        .remove_target_apps_from_gate("g1", &apps(&["web"]))
        .await
        .unwrap();
    assert!(specs(&engine, "scoped").await.feature_gates.is_empty());

    engine
        .update_gate(
            "g1",
            &FeatureGateUpdate {
                target_apps: Some(apps(&["web"])),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(gate_names(&specs(&engine, "scoped").await), vec!["g1"]);

    engine.clear_target_apps_from_sdk_key("scoped").await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "scoped").await), vec!["g1"]);
    assert!(engine.global_sdk_keys().await.unwrap().contains("scoped"));
}

#[tokio::test]
async fn test_same_results_with_cache_disabled() {
    let cached = engine().await;
    let uncached = engine_with(Config::builder().specs_cache_enabled(false).build()).await;

    for engine in [&cached, &uncached] {
        engine.register_sdk_key("k1").await.unwrap();
        specs(engine, "k1").await;
        engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();
        engine
            .create_config("c1", DynamicConfigArgs::new(true, params(json!({"x": 1}))))
            .await
            .unwrap();
    }

    // salts are random per engine, so compare everything else
    let shape = |specs: &ConfigSpecs| -> Vec<(String, bool, Value, usize)> {
        specs
            .feature_gates
            .iter()
            .chain(specs.dynamic_configs.iter())
            .map(|s| (s.name.clone(), s.enabled, s.default_value.clone(), s.rules.len()))
            .collect()
    };
    let a = specs(&cached, "k1").await;
    let b = specs(&uncached, "k1").await;
    assert_eq!(shape(&a), shape(&b));
    assert_eq!(shape(&a).len(), 2);
}

/// Gates seen by each observed key, plus the SSR mapping over every key and app
async fn observe(engine: &Engine) -> (Vec<Vec<String>>, BTreeMap<String, ApiEntityNames>) {
    let mut seen = Vec::new();
    for sdk_key in ["k1", "never-registered", "gone"] {
        let names = gate_names(&specs(engine, sdk_key).await)
            .into_iter()
            .map(str::to_string)
            .collect();
        seen.push(names);
    }
    let ssr = engine
        .get_config_specs("server", &ConfigSpecsOptions::ssr(SsrOptions::all()))
        .await
        .unwrap();
    (seen, ssr.hashed_sdk_keys_to_entities.unwrap_or_default())
}

async fn apply_step(engine: &Engine, step: usize) {
    match step {
        0 => {
            engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();
        }
        1 => {
            engine.register_sdk_key("k1").await.unwrap();
            engine.register_sdk_key("gone").await.unwrap();
        }
        2 => {
            engine
                .create_target_app("web", &EntityNames::single(EntityKind::FeatureGate, "g1"))
                .await
                .unwrap();
        }
        3 => {
            engine.assign_target_apps_to_sdk_key(&apps(&["web"]), "gone").await.unwrap();
        }
        4 => {
            engine.create_gate("g2", FeatureGateArgs::enabled(true)).await.unwrap();
        }
        5 => {
            engine.deactivate_sdk_key("gone").await.unwrap();
        }
        6 => {
            engine
                .add_entities_to_target_app("web", &EntityNames::single(EntityKind::FeatureGate, "g2"))
                .await
                .unwrap();
        }
        7 => {
            engine.delete_gate("g1").await.unwrap();
        }
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn test_cached_and_uncached_agree_through_mutations() {
    let cached = engine().await;
    let uncached = engine_with(Config::builder().specs_cache_enabled(false).build()).await;
    observe(&cached).await;

    for step in 0..8 {
        apply_step(&cached, step).await;
        apply_step(&uncached, step).await;
        assert_eq!(observe(&cached).await, observe(&uncached).await, "after step {}", step);
    }

    let (seen, ssr) = observe(&cached).await;
    assert_eq!(seen, vec![vec!["g2".to_string()]; 3]);
    assert_eq!(ssr.len(), 1);
}

#[tokio::test]
async fn test_unregistered_key_specs_follow_mutations() {
    let engine = engine().await;
    engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "never-registered").await), vec!["g1"]);

    engine.create_gate("g2", FeatureGateArgs::enabled(true)).await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "never-registered").await), vec!["g1", "g2"]);

    engine.delete_gate("g1").await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "never-registered").await), vec!["g2"]);
}

#[tokio::test]
async fn test_deactivated_key_specs_follow_mutations() {
    let engine = engine().await;
    engine.register_sdk_key("k1").await.unwrap();
    engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "k1").await), vec!["g1"]);

    engine.deactivate_sdk_key("k1").await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "k1").await), vec!["g1"]);

    engine.create_gate("g2", FeatureGateArgs::enabled(true)).await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "k1").await), vec!["g1", "g2"]);
}

#[tokio::test]
async fn test_clear_cache_forces_reassembly() {
    let engine = engine().await;
    engine.register_sdk_key("k1").await.unwrap();
    engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();

    let first = specs(&engine, "k1").await;
    let second = specs(&engine, "k1").await;
    assert_eq!(first.time, second.time);

    // the store is edited behind the engine's back
    engine.store().remove_entity::<FeatureGate>("g1").await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "k1").await), vec!["g1"]);

    engine.clear_cache(Some("k1")).await.unwrap();
    assert!(specs(&engine, "k1").await.feature_gates.is_empty());
}

#[tokio::test]
async fn test_clear_cache_for_target_apps() {
    let engine = engine().await;
    engine.create_target_app("web", &EntityNames::new()).await.unwrap();
    engine.register_sdk_key("scoped").await.unwrap();
    engine
        .assign_target_apps_to_sdk_key(&apps(&["web"]), "scoped")
        .await
        .unwrap();
    engine
        .create_gate("g1", FeatureGateArgs::enabled(true).target_apps(["web"]))
        .await
        .unwrap();
    assert_eq!(gate_names(&specs(&engine, "scoped").await), vec!["g1"]);

    engine.store().remove_entity::<FeatureGate>("g1").await.unwrap();
    engine.clear_cache_for_target_apps(&apps(&["ios"])).await.unwrap();
    assert_eq!(gate_names(&specs(&engine, "scoped").await), vec!["g1"]);

    engine.clear_cache_for_target_apps(&apps(&["web"])).await.unwrap();
    assert!(specs(&engine, "scoped").await.feature_gates.is_empty());

    // dropping every cache entry re-reads the key registry from storage
    engine.clear_cache(None).await.unwrap();
    assert!(engine.registered_sdk_keys().await.unwrap().contains("scoped"));
}

// =============================================================================
// Experiment Tests
// =============================================================================

#[tokio::test]
async fn test_experiment_groups_become_bucket_rules() {
    let engine = engine().await;
    engine.create_experiment("e1", ab_experiment()).await.unwrap();

    let served = specs(&engine, "k1").await;
    assert_eq!(config_names(&served), vec!["e1"]);
    let spec = &served.dynamic_configs[0];
    assert_eq!(spec.is_active, Some(false));

    let thresholds: Vec<Value> = spec
        .rules
        .iter()
        .map(|rule| rule.conditions[0].target_value.clone())
        .collect();
    assert_eq!(thresholds, vec![json!(0), json!(500)]);
    assert_eq!(spec.rules[1].return_value, json!({"color": "blue"}));
}

#[tokio::test]
async fn test_started_experiment_is_frozen() {
    let engine = engine().await;
    engine.create_experiment("e1", ab_experiment()).await.unwrap();

    assert_eq!(engine.start_experiment("e1").await.unwrap(), MutationStatus::Applied);
    assert_eq!(engine.start_experiment("e1").await.unwrap(), MutationStatus::Rejected);

    let update = ExperimentUpdate {
        enabled: Some(false),
        ..Default::default()
    };
    assert_eq!(
        engine.update_experiment("e1", &update).await.unwrap(),
        MutationStatus::Rejected
    );

    let stored = engine.get_experiment("e1").await.unwrap().unwrap();
    assert!(stored.started);
    assert!(stored.enabled);
    assert_eq!(specs(&engine, "k1").await.dynamic_configs[0].is_active, Some(true));

    assert_eq!(engine.delete_experiment("e1").await.unwrap(), MutationStatus::Applied);
}

// =============================================================================
// Outcome Tests
// =============================================================================

#[tokio::test]
async fn test_missing_entities_are_not_found() {
    let engine = engine().await;
    let web = apps(&["web"]);

    assert_eq!(
        engine.update_gate("nope", &FeatureGateUpdate::default()).await.unwrap(),
        MutationStatus::NotFound
    );
    assert_eq!(engine.delete_config("nope").await.unwrap(), MutationStatus::NotFound);
    assert_eq!(engine.start_experiment("nope").await.unwrap(), MutationStatus::NotFound);
    assert_eq!(
        engine.add_target_apps_to_gate("nope", &web).await.unwrap(),
        MutationStatus::NotFound
    );
    assert_eq!(
        engine.update_config_rules("nope", |_| Ok(())).await.unwrap(),
        MutationStatus::NotFound
    );
    assert_eq!(engine.deactivate_sdk_key("nope").await.unwrap(), MutationStatus::NotFound);
}

#[tokio::test]
async fn test_duplicate_create_is_rejected() {
    let engine = engine().await;
    engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();
    let salt = engine.get_gate("g1").await.unwrap().unwrap().salt;

    let status = engine.create_gate("g1", FeatureGateArgs::enabled(false)).await.unwrap();

    assert_eq!(status, MutationStatus::Rejected);
    let gate = engine.get_gate("g1").await.unwrap().unwrap();
    assert!(gate.enabled);
    assert_eq!(gate.salt, salt);
}

#[tokio::test]
async fn test_batch_reports_each_item() {
    let engine = engine().await;
    engine.create_gate("g1", FeatureGateArgs::enabled(true)).await.unwrap();
    engine
        .create_config("c1", DynamicConfigArgs::new(true, JsonMap::new()))
        .await
        .unwrap();

    let off = FeatureGateUpdate {
        enabled: Some(false),
        ..Default::default()
    };
    let results = engine
        .update_gates(&[("missing".to_string(), off.clone()), ("g1".to_string(), off)])
        .await;

    let outcomes: Vec<(&str, MutationStatus)> = results
        .iter()
        .map(|item| (item.name.as_str(), *item.outcome.as_ref().unwrap()))
        .collect();
    assert_eq!(
        outcomes,
        vec![("missing", MutationStatus::NotFound), ("g1", MutationStatus::Applied)]
    );
    assert!(!engine.get_gate("g1").await.unwrap().unwrap().enabled);

    let results = engine
        .update_configs(&[(
            "c1".to_string(),
            DynamicConfigUpdate {
                default_value: Some(params(json!({"limit": 3}))),
                ..Default::default()
            },
        )])
        .await;
    assert!(results[0].outcome.as_ref().unwrap().is_applied());
}

// =============================================================================
// Config Rule Tests
// =============================================================================

#[tokio::test]
async fn test_update_config_rules() {
    let engine = engine().await;
    engine.register_sdk_key("k1").await.unwrap();
    engine
        .create_config("pricing", DynamicConfigArgs::new(true, params(json!({"price": 10}))))
        .await
        .unwrap();
    specs(&engine, "k1").await;

    let status = engine
        .update_config_rules("pricing", |rules| {
            rules.add_rule(NewRule::new("everyone", json!({"price": 8})))?;
            let beta = rules.add_rule(NewRule::new("beta", json!({"price": 5})).pass_percentage(10.0))?;
            rules.move_rule_up(&beta.id);
            Ok(())
        })
        .await
        .unwrap();
    assert_eq!(status, MutationStatus::Applied);

    let served = specs(&engine, "k1").await;
    let rules: Vec<(&str, f64)> = served.dynamic_configs[0]
        .rules
        .iter()
        .map(|rule| (rule.name.as_str(), rule.pass_percentage))
        .collect();
    assert_eq!(rules, vec![("beta", 10.0), ("everyone", 100.0)]);
}

#[tokio::test]
async fn test_failed_rule_edit_writes_nothing() {
    let engine = engine().await;
    engine
        .create_config("pricing", DynamicConfigArgs::new(true, JsonMap::new()))
        .await
        .unwrap();

    let err = engine
        .update_config_rules("pricing", |rules| {
            rules.add_rule(NewRule::new("a", json!({})))?;
            rules.add_rule(NewRule::new("a", json!({})))?;
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GatehouseError::DuplicateRule(_)));
    let config = engine.get_config("pricing").await.unwrap().unwrap();
    assert!(config.rules_json.is_none());
}
