//! Association Store
//!
//! CRUD for gates, configs and experiments plus the secondary indices that
//! tie them to target apps and SDK keys.
//!
//! ## Indices
//! ```text
//!   entity ──targetApps──▶ {app}        (inside the entity payload)
//!   app    ──entities────▶ EntityNames  ("" = global, every entity)
//!   app    ──sdkKeys─────▶ {sdk key}
//!   key    ──targetApps──▶ {app}        (empty ⇒ global)
//!   registries: {app}, {sdk key}
//! ```
//!
//! ## Consistency
//! Storage has no multi-key transactions. Both directions of an association
//! are written as separate calls (dual write); a crash in between leaves a
//! one-directional link that [`AssociationStore::migrate_legacy_encoding`]
//! repairs. Every repair is idempotent.

mod entities;
mod migration;
mod sdk_keys;
mod target_apps;

pub use migration::MigrationReport;

use std::sync::Arc;

use crate::codec::{decode_set, encode_set, Assoc, KeyCodec};
use crate::error::Result;
use crate::model::NameSet;
use crate::storage::Storage;

/// Direction of a set edit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SetEdit {
    Add,
    Remove,
}

impl SetEdit {
    pub(crate) fn apply<'a>(self, target: &mut NameSet, names: impl IntoIterator<Item = &'a String>) {
        for name in names {
            match self {
                SetEdit::Add => {
                    target.insert(name.clone());
                }
                SetEdit::Remove => {
                    target.remove(name);
                }
            }
        }
    }
}

/// Entity and index storage over a flat key-value store
#[derive(Clone)]
pub struct AssociationStore {
    storage: Arc<dyn Storage>,
    codec: KeyCodec,
}

impl AssociationStore {
    pub fn new(storage: Arc<dyn Storage>, codec: KeyCodec) -> Self {
        Self { storage, codec }
    }

    pub async fn initialize(&self) -> Result<()> {
        self.storage.initialize().await
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.storage.shutdown().await
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    // =========================================================================
    // Set Helpers
    // =========================================================================

    /// Read a tagged set; absent keys read as empty
    pub(crate) async fn read_set(&self, assoc: Assoc<'_>) -> Result<NameSet> {
        match self.storage.get(&self.codec.key(assoc)).await? {
            Some(raw) => decode_set(&raw),
            None => Ok(NameSet::new()),
        }
    }

    pub(crate) async fn write_set(&self, assoc: Assoc<'_>, set: &NameSet) -> Result<()> {
        self.storage.set(&self.codec.key(assoc), &encode_set(set)?).await
    }

    /// Read-modify-write of a set, returning the new contents. A set that
    /// becomes empty is deleted rather than stored.
    pub(crate) async fn edit_set(&self, assoc: Assoc<'_>, names: &NameSet, edit: SetEdit) -> Result<NameSet> {
        let mut set = self.read_set(assoc).await?;
        edit.apply(&mut set, names);
        if set.is_empty() {
            self.delete_raw(assoc).await?;
        } else {
            self.write_set(assoc, &set).await?;
        }
        Ok(set)
    }

    pub(crate) async fn get_raw(&self, assoc: Assoc<'_>) -> Result<Option<String>> {
        self.storage.get(&self.codec.key(assoc)).await
    }

    pub(crate) async fn set_raw(&self, assoc: Assoc<'_>, value: &str) -> Result<()> {
        self.storage.set(&self.codec.key(assoc), value).await
    }

    pub(crate) async fn delete_raw(&self, assoc: Assoc<'_>) -> Result<()> {
        self.storage.delete(&self.codec.key(assoc)).await
    }
}

impl std::fmt::Debug for AssociationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationStore").field("codec", &self.codec).finish()
    }
}

/// Collect names into a set
pub(crate) fn name_set<I, S>(names: I) -> NameSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|s| s.as_ref().to_string()).collect()
}
