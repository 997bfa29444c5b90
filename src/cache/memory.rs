//! In-process cache implementations (the defaults)

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::Result;
use crate::model::NameSet;
use crate::specs::ConfigSpecs;

use super::{SdkKeysCache, SpecsCache};

/// Two-level map: key → field → specs
#[derive(Debug, Default)]
pub struct MemorySpecsCache {
    entries: RwLock<HashMap<String, HashMap<String, ConfigSpecs>>>,
}

impl MemorySpecsCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached (key, field) entries
    pub fn len(&self) -> usize {
        self.entries.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SpecsCache for MemorySpecsCache {
    async fn get(&self, key: &str, field: &str) -> Result<Option<ConfigSpecs>> {
        Ok(self
            .entries
            .read()
            .get(key)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    async fn set(&self, key: &str, field: &str, specs: &ConfigSpecs) -> Result<()> {
        self.entries
            .write()
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), specs.clone());
        Ok(())
    }

    async fn clear(&self, key: &str, field: Option<&str>) -> Result<()> {
        let mut entries = self.entries.write();
        match field {
            Some(field) => {
                if let Some(fields) = entries.get_mut(key) {
                    fields.remove(field);
                    if fields.is_empty() {
                        entries.remove(key);
                    }
                }
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySdkKeysCache {
    keys: RwLock<Option<NameSet>>,
    global: RwLock<Option<NameSet>>,
}

impl MemorySdkKeysCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SdkKeysCache for MemorySdkKeysCache {
    async fn get(&self) -> Result<Option<NameSet>> {
        Ok(self.keys.read().clone())
    }

    async fn set(&self, keys: &NameSet) -> Result<()> {
        *self.keys.write() = Some(keys.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.keys.write() = None;
        Ok(())
    }

    async fn get_global(&self) -> Result<Option<NameSet>> {
        Ok(self.global.read().clone())
    }

    async fn set_global(&self, keys: &NameSet) -> Result<()> {
        *self.global.write() = Some(keys.clone());
        Ok(())
    }

    async fn clear_global(&self) -> Result<()> {
        *self.global.write() = None;
        Ok(())
    }
}
