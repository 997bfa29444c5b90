//! Tests for the Association Store
//!
//! These tests verify:
//! - Entity create/update/delete keep every index in step
//! - Reconciliation only considers target apps that exist
//! - SDK key ↔ target app edits are symmetric
//! - Visible entities resolve through the global sentinel or an app union

use std::sync::Arc;

use gatehouse::codec::KeyCodec;
use gatehouse::hash::default_hash;
use gatehouse::model::{
    DynamicConfig, DynamicConfigArgs, EntityKind, EntityNames, FeatureGate, FeatureGateArgs, JsonMap, NameSet,
    TargetAppUpdate,
};
use gatehouse::storage::MemoryStorage;
use gatehouse::store::AssociationStore;
use pretty_assertions::assert_eq;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_store() -> (Arc<MemoryStorage>, AssociationStore) {
    let storage = Arc::new(MemoryStorage::new());
    let store = AssociationStore::new(storage.clone(), KeyCodec::new("statsig", default_hash()));
    (storage, store)
}

fn set(names: &[&str]) -> NameSet {
    names.iter().map(|s| s.to_string()).collect()
}

fn apps(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn gate(name: &str, target_apps: &[&str]) -> FeatureGate {
    FeatureGate::new(
        name,
        FeatureGateArgs::enabled(true).target_apps(target_apps.iter().copied()),
        "salt".to_string(),
        "userID",
    )
}

async fn gates_in(store: &AssociationStore, app: Option<&str>) -> NameSet {
    store
        .entity_assocs(app)
        .await
        .unwrap()
        .map(|names| names.gates)
        .unwrap_or_default()
}

async fn register_apps(store: &AssociationStore, names: &[&str]) {
    for name in names {
        store.add_target_app(name, &EntityNames::new()).await.unwrap();
    }
}

// =============================================================================
// Entity Lifecycle Tests
// =============================================================================

#[tokio::test]
async fn test_add_entity_indexes_globally_and_per_app() {
    let (_storage, store) = setup_store();
    register_apps(&store, &["a", "b"]).await;

    store.add_entity(&gate("g1", &["a"])).await.unwrap();

    assert_eq!(gates_in(&store, None).await, set(&["g1"]));
    assert_eq!(gates_in(&store, Some("a")).await, set(&["g1"]));
    assert!(gates_in(&store, Some("b")).await.is_empty());

    let loaded: FeatureGate = store.get_entity("g1").await.unwrap().unwrap();
    assert_eq!(loaded.target_apps, set(&["a"]));
}

#[tokio::test]
async fn test_get_missing_entity_is_none() {
    let (_storage, store) = setup_store();
    let missing: Option<FeatureGate> = store.get_entity("nope").await.unwrap();
    assert!(missing.is_none());
    assert!(store.entity_assocs(Some("nope")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_reconciles_against_known_apps() {
    let (_storage, store) = setup_store();
    register_apps(&store, &["a", "b", "c"]).await;

    let mut g = gate("g1", &["a", "b"]);
    store.add_entity(&g).await.unwrap();

    store
        .update_entity(&mut g, Some(&apps(&["b", "c", "unknown"])))
        .await
        .unwrap();

    assert!(gates_in(&store, Some("a")).await.is_empty());
    assert_eq!(gates_in(&store, Some("b")).await, set(&["g1"]));
    assert_eq!(gates_in(&store, Some("c")).await, set(&["g1"]));
    assert!(store.entity_assocs(Some("unknown")).await.unwrap().is_none());

    let loaded: FeatureGate = store.get_entity("g1").await.unwrap().unwrap();
    assert_eq!(loaded.target_apps, set(&["b", "c"]));
}

#[tokio::test]
async fn test_update_without_target_apps_keeps_indices() {
    let (_storage, store) = setup_store();
    register_apps(&store, &["a"]).await;

    let mut g = gate("g1", &["a"]);
    store.add_entity(&g).await.unwrap();
    g.enabled = false;
    store.update_entity(&mut g, None).await.unwrap();

    assert_eq!(gates_in(&store, Some("a")).await, set(&["g1"]));
    let loaded: FeatureGate = store.get_entity("g1").await.unwrap().unwrap();
    assert!(!loaded.enabled);
}

#[tokio::test]
async fn test_remove_entity_cascades() {
    let (_storage, store) = setup_store();
    register_apps(&store, &["a", "b"]).await;
    store.add_entity(&gate("g1", &["a", "b"])).await.unwrap();
    store.add_entity(&gate("g2", &["a"])).await.unwrap();

    let removed: Option<FeatureGate> = store.remove_entity("g1").await.unwrap();
    assert_eq!(removed.map(|g| g.name), Some("g1".to_string()));

    assert_eq!(gates_in(&store, None).await, set(&["g2"]));
    assert_eq!(gates_in(&store, Some("a")).await, set(&["g2"]));
    assert!(gates_in(&store, Some("b")).await.is_empty());

    let again: Option<FeatureGate> = store.remove_entity("g1").await.unwrap();
    assert!(again.is_none());
}

#[tokio::test]
async fn test_entity_target_app_edits_are_bidirectional() {
    let (_storage, store) = setup_store();
    register_apps(&store, &["a", "b"]).await;
    let mut config = DynamicConfig::new("c1", DynamicConfigArgs::new(true, JsonMap::new()), "s".into(), "userID");
    store.add_entity(&config).await.unwrap();

    store
        .add_target_apps_to_entity(&mut config, &set(&["a", "b"]))
        .await
        .unwrap();
    let names = store.entity_assocs(Some("b")).await.unwrap().unwrap();
    assert_eq!(names.configs, set(&["c1"]));

    store
        .remove_target_apps_from_entity(&mut config, &set(&["a"]))
        .await
        .unwrap();
    let loaded: DynamicConfig = store.get_entity("c1").await.unwrap().unwrap();
    assert_eq!(loaded.target_apps, set(&["b"]));
    assert!(store.entity_assocs(Some("a")).await.unwrap().unwrap().configs.is_empty());
}

// =============================================================================
// SDK Key Tests
// =============================================================================

#[tokio::test]
async fn test_sdk_key_registry() {
    let (_storage, store) = setup_store();
    assert_eq!(store.add_sdk_key("k1").await.unwrap(), set(&["k1"]));
    assert_eq!(store.add_sdk_key("k2").await.unwrap(), set(&["k1", "k2"]));
    assert!(store.is_sdk_key_registered("k1").await.unwrap());

    assert_eq!(store.remove_sdk_key("k1").await.unwrap(), set(&["k2"]));
    assert!(!store.is_sdk_key_registered("k1").await.unwrap());
    assert_eq!(store.registered_sdk_keys().await.unwrap(), set(&["k2"]));
}

#[tokio::test]
async fn test_assign_and_remove_are_symmetric() {
    let (_storage, store) = setup_store();
    store
        .assign_target_apps_to_sdk_key(&set(&["a", "b"]), "k1")
        .await
        .unwrap();

    assert_eq!(store.target_apps_for_sdk_key("k1").await.unwrap(), Some(set(&["a", "b"])));
    assert_eq!(store.sdk_keys_for_target_app("a").await.unwrap(), set(&["k1"]));

    store
        .remove_target_apps_from_sdk_key(&set(&["a"]), "k1")
        .await
        .unwrap();
    assert_eq!(store.target_apps_for_sdk_key("k1").await.unwrap(), Some(set(&["b"])));
    assert!(store.sdk_keys_for_target_app("a").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_assign_then_clear_restores_storage() {
    let (storage, store) = setup_store();
    store.add_sdk_key("k1").await.unwrap();
    let before = storage.keys();

    store
        .assign_target_apps_to_sdk_key(&set(&["a", "b"]), "k1")
        .await
        .unwrap();
    let previous = store.clear_target_apps_from_sdk_key("k1").await.unwrap();

    assert_eq!(previous, set(&["a", "b"]));
    assert_eq!(store.target_apps_for_sdk_key("k1").await.unwrap(), None);
    assert_eq!(storage.keys(), before);
}

// =============================================================================
// Visibility Tests
// =============================================================================

#[tokio::test]
async fn test_visible_entities_union_is_deduplicated() {
    let (_storage, store) = setup_store();
    register_apps(&store, &["a", "b"]).await;
    store.add_entity(&gate("shared", &["a", "b"])).await.unwrap();
    store.add_entity(&gate("only-a", &["a"])).await.unwrap();
    store.add_entity(&gate("global", &[])).await.unwrap();

    let visible = store
        .entity_assocs_for_target_apps(Some(&set(&["a", "b", "missing"])))
        .await
        .unwrap();
    assert_eq!(visible.gates, set(&["only-a", "shared"]));

    let global = store.entity_assocs_for_target_apps(None).await.unwrap();
    assert_eq!(global.gates, set(&["global", "only-a", "shared"]));
}

// =============================================================================
// Target App Tests
// =============================================================================

#[tokio::test]
async fn test_add_target_app_links_entities() {
    let (_storage, store) = setup_store();
    store.add_entity(&gate("g1", &[])).await.unwrap();

    let entities = EntityNames::single(EntityKind::FeatureGate, "g1");
    store.add_target_app("a", &entities).await.unwrap();

    assert!(store.target_app_exists("a").await.unwrap());
    let loaded: FeatureGate = store.get_entity("g1").await.unwrap().unwrap();
    assert_eq!(loaded.target_apps, set(&["a"]));
}

#[tokio::test]
async fn test_update_target_app_replaces_given_kinds() {
    let (_storage, store) = setup_store();
    store.add_entity(&gate("g1", &[])).await.unwrap();
    store.add_entity(&gate("g2", &[])).await.unwrap();
    store
        .add_target_app("a", &EntityNames::single(EntityKind::FeatureGate, "g1"))
        .await
        .unwrap();

    let update = TargetAppUpdate {
        gates: Some(set(&["g2"])),
        ..TargetAppUpdate::default()
    };
    assert!(store.update_target_app("a", &update).await.unwrap());
    assert_eq!(gates_in(&store, Some("a")).await, set(&["g2"]));

    let g1: FeatureGate = store.get_entity("g1").await.unwrap().unwrap();
    let g2: FeatureGate = store.get_entity("g2").await.unwrap().unwrap();
    assert!(g1.target_apps.is_empty());
    assert_eq!(g2.target_apps, set(&["a"]));

    assert!(!store.update_target_app("missing", &update).await.unwrap());
}

#[tokio::test]
async fn test_remove_target_app_detaches_everything() {
    let (_storage, store) = setup_store();
    store.add_entity(&gate("g1", &[])).await.unwrap();
    store
        .add_target_app("a", &EntityNames::single(EntityKind::FeatureGate, "g1"))
        .await
        .unwrap();
    store
        .assign_target_apps_to_sdk_key(&set(&["a"]), "k1")
        .await
        .unwrap();

    let detached = store.remove_target_app("a").await.unwrap();

    assert_eq!(detached, set(&["k1"]));
    assert!(!store.target_app_exists("a").await.unwrap());
    assert!(store.entity_assocs(Some("a")).await.unwrap().is_none());
    assert_eq!(store.target_apps_for_sdk_key("k1").await.unwrap(), None);
    let g1: FeatureGate = store.get_entity("g1").await.unwrap().unwrap();
    assert!(g1.target_apps.is_empty());
}
