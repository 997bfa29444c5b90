//! Tests for the cache layer
//!
//! These tests verify:
//! - The in-memory specs cache clears by key or by (key, field)
//! - Requests with different options are cached independently
//! - SSR responses are tracked and dropped together
//! - Responses served from the global view are tracked and dropped together
//! - A disabled specs cache never stores anything

use std::collections::BTreeMap;
use std::sync::Arc;

use gatehouse::cache::{CacheHandler, MemorySdkKeysCache, MemorySpecsCache, SdkKeysCache, SpecsCache};
use gatehouse::hash::default_hash;
use gatehouse::model::NameSet;
use gatehouse::specs::{ConfigSpecs, ConfigSpecsOptions, Selection, SsrOptions};

// =============================================================================
// Helper Functions
// =============================================================================

fn specs(time: u64) -> ConfigSpecs {
    ConfigSpecs {
        feature_gates: Vec::new(),
        dynamic_configs: Vec::new(),
        layer_configs: Vec::new(),
        layers: BTreeMap::new(),
        has_updates: true,
        time,
        hashed_sdk_keys_to_entities: None,
    }
}

fn handler(enabled: bool) -> (Arc<MemorySpecsCache>, CacheHandler) {
    let specs_cache = Arc::new(MemorySpecsCache::new());
    let handler = CacheHandler::new(
        specs_cache.clone(),
        Arc::new(MemorySdkKeysCache::new()),
        default_hash(),
        enabled,
    );
    (specs_cache, handler)
}

fn ssr() -> ConfigSpecsOptions {
    ConfigSpecsOptions::ssr(SsrOptions::default().target_apps(Selection::All))
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Memory Cache Tests
// =============================================================================

#[tokio::test]
async fn test_memory_specs_cache_clear_granularity() {
    let cache = MemorySpecsCache::new();
    cache.set("k", "f1", &specs(1)).await.unwrap();
    cache.set("k", "f2", &specs(2)).await.unwrap();
    cache.set("other", "f1", &specs(3)).await.unwrap();
    assert_eq!(cache.len(), 3);

    cache.clear("k", Some("f1")).await.unwrap();
    assert!(cache.get("k", "f1").await.unwrap().is_none());
    assert_eq!(cache.get("k", "f2").await.unwrap().map(|s| s.time), Some(2));

    cache.clear("k", None).await.unwrap();
    assert!(cache.get("k", "f2").await.unwrap().is_none());
    assert_eq!(cache.len(), 1);

    cache.clear_all().await.unwrap();
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_memory_keys_cache() {
    let cache = MemorySdkKeysCache::new();
    assert!(cache.get().await.unwrap().is_none());

    let registered: NameSet = ["a", "b"].iter().map(|s| s.to_string()).collect();
    cache.set(&registered).await.unwrap();
    cache.set_global(&NameSet::from(["a".to_string()])).await.unwrap();
    assert_eq!(cache.get().await.unwrap(), Some(registered));

    cache.clear_global().await.unwrap();
    assert!(cache.get_global().await.unwrap().is_none());
    assert!(cache.get().await.unwrap().is_some());
}

// =============================================================================
// Cache Handler Tests
// =============================================================================

#[tokio::test]
async fn test_options_are_part_of_the_field() {
    let (_cache, handler) = handler(true);
    let plain = ConfigSpecsOptions::default();

    assert_ne!(
        handler.cache_field("k1", &plain).unwrap(),
        handler.cache_field("k1", &ssr()).unwrap()
    );
    assert_ne!(
        handler.cache_field("k1", &plain).unwrap(),
        handler.cache_field("k2", &plain).unwrap()
    );

    handler.cache_specs("k1", &plain, &specs(1)).await.unwrap();
    handler.cache_specs("k1", &ssr(), &specs(2)).await.unwrap();

    assert_eq!(handler.get_specs("k1", &plain).await.unwrap().map(|s| s.time), Some(1));
    assert_eq!(handler.get_specs("k1", &ssr()).await.unwrap().map(|s| s.time), Some(2));
}

#[tokio::test]
async fn test_clear_specs_drops_every_request_of_a_key() {
    let (cache, handler) = handler(true);
    handler
        .cache_specs("k1", &ConfigSpecsOptions::default(), &specs(1))
        .await
        .unwrap();
    handler.cache_specs("k1", &ssr(), &specs(2)).await.unwrap();
    handler
        .cache_specs("k2", &ConfigSpecsOptions::default(), &specs(3))
        .await
        .unwrap();

    handler.clear_specs(&keys(&["k1"])).await.unwrap();

    assert_eq!(cache.len(), 1);
    assert!(handler
        .get_specs("k2", &ConfigSpecsOptions::default())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_ssr_holders_are_cleared_together() {
    let (cache, handler) = handler(true);
    handler.cache_specs("k1", &ssr(), &specs(1)).await.unwrap();
    handler.cache_specs("k2", &ssr(), &specs(2)).await.unwrap();
    handler
        .cache_specs("k3", &ConfigSpecsOptions::default(), &specs(3))
        .await
        .unwrap();

    handler.clear_ssr_specs().await.unwrap();

    assert_eq!(cache.len(), 1);
    assert!(handler.get_specs("k1", &ssr()).await.unwrap().is_none());
    assert!(handler
        .get_specs("k3", &ConfigSpecsOptions::default())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_unscoped_holders_are_cleared_together() {
    let (cache, handler) = handler(true);
    let plain = ConfigSpecsOptions::default();
    handler.cache_unscoped_specs("anon", &plain, &specs(1)).await.unwrap();
    handler.cache_unscoped_specs("global", &plain, &specs(2)).await.unwrap();
    handler.cache_specs("scoped", &plain, &specs(3)).await.unwrap();

    handler.clear_unscoped_specs().await.unwrap();

    assert_eq!(cache.len(), 1);
    assert!(handler.get_specs("anon", &plain).await.unwrap().is_none());
    assert!(handler.get_specs("scoped", &plain).await.unwrap().is_some());

    // holders are forgotten once cleared
    handler.cache_specs("anon", &plain, &specs(4)).await.unwrap();
    handler.clear_unscoped_specs().await.unwrap();
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_disabled_specs_cache_stores_nothing() {
    let (cache, handler) = handler(false);
    handler
        .cache_specs("k1", &ConfigSpecsOptions::default(), &specs(1))
        .await
        .unwrap();

    assert!(cache.is_empty());
    assert!(handler
        .get_specs("k1", &ConfigSpecsOptions::default())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_clear_all_resets_key_caches() {
    let (cache, handler) = handler(true);
    let registered = NameSet::from(["k1".to_string()]);
    handler.cache_sdk_keys(&registered).await.unwrap();
    handler.cache_global_sdk_keys(&registered).await.unwrap();
    handler.cache_specs("k1", &ssr(), &specs(1)).await.unwrap();

    handler.clear_all().await.unwrap();

    assert!(cache.is_empty());
    assert!(handler.get_sdk_keys().await.unwrap().is_none());
    assert!(handler.get_global_sdk_keys().await.unwrap().is_none());
}
