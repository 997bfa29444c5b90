//! File-backed storage
//!
//! Keeps the key space in memory and persists it as one snapshot file.
//!
//! ## File Format
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header line                            │
//! │   "GHKV1 <crc32 of body, 8 hex>\n"     │
//! ├────────────────────────────────────────┤
//! │ Body                                   │
//! │   JSON object { key: value, ... }      │
//! └────────────────────────────────────────┘
//! ```
//!
//! Snapshots are written to `<path>.tmp` and renamed over the target, so a
//! crash mid-write leaves the previous snapshot intact.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::error::{GatehouseError, Result};

use super::Storage;

/// Snapshot magic
const MAGIC: &str = "GHKV1";

/// When mutations reach the snapshot file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// Rewrite the snapshot after every set/delete (safest, slowest)
    EveryWrite,

    /// Only write on `flush` and `shutdown`
    OnShutdown,
}

/// Configuration for [`FileStorage`]
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    /// Snapshot file path
    pub path: PathBuf,

    pub sync_strategy: SyncStrategy,
}

impl FileStorageConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_strategy: SyncStrategy::EveryWrite,
        }
    }

    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.sync_strategy = strategy;
        self
    }
}

/// Snapshot-file key-value storage
///
/// ## Concurrency:
/// - `data`: RwLock, never held across an await
/// - `dirty`: set by writes under `OnShutdown`, cleared by a flush before it
///   takes its snapshot
/// - `flush_lock`: held across snapshot, write and rename
pub struct FileStorage {
    config: FileStorageConfig,
    data: RwLock<BTreeMap<String, String>>,
    dirty: AtomicBool,
    flush_lock: tokio::sync::Mutex<()>,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Self {
        Self {
            config,
            data: RwLock::new(BTreeMap::new()),
            dirty: AtomicBool::new(false),
            flush_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Open with a path (convenience method)
    ///
    /// Uses `SyncStrategy::EveryWrite`
    pub fn open_path(path: &Path) -> Self {
        Self::new(FileStorageConfig::new(path))
    }

    /// Write the current key space to disk
    pub async fn flush(&self) -> Result<()> {
        let _guard = self.flush_lock.lock().await;

        // Writes landing after this point re-mark the storage dirty
        self.dirty.store(false, Ordering::SeqCst);
        let result = self.write_snapshot().await;
        if result.is_err() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        result
    }

    /// Snapshot file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .config
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.config.path.with_file_name(name)
    }

    /// Snapshot, write and rename; caller holds `flush_lock`
    async fn write_snapshot(&self) -> Result<()> {
        let body = {
            let data = self.data.read();
            serde_json::to_string(&*data)?
        };
        let crc = crc32fast::hash(body.as_bytes());
        let contents = format!("{} {:08x}\n{}", MAGIC, crc, body);

        if let Some(parent) = self.config.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, contents.as_bytes()).await?;
        tokio::fs::rename(&tmp_path, &self.config.path).await?;

        tracing::debug!(path = %self.config.path.display(), bytes = contents.len(), "snapshot flushed");
        Ok(())
    }

    /// Parse and verify a snapshot
    fn decode_snapshot(contents: &str) -> Result<BTreeMap<String, String>> {
        let (header, body) = contents
            .split_once('\n')
            .ok_or_else(|| GatehouseError::Corruption("snapshot has no header line".to_string()))?;

        let (magic, crc_hex) = header
            .split_once(' ')
            .ok_or_else(|| GatehouseError::Corruption(format!("malformed snapshot header: {:?}", header)))?;

        if magic != MAGIC {
            return Err(GatehouseError::Corruption(format!(
                "invalid snapshot magic: expected {}, got {:?}",
                MAGIC, magic
            )));
        }

        let expected = u32::from_str_radix(crc_hex.trim(), 16)
            .map_err(|e| GatehouseError::Corruption(format!("invalid snapshot checksum: {}", e)))?;
        let actual = crc32fast::hash(body.as_bytes());
        if expected != actual {
            return Err(GatehouseError::Corruption(format!(
                "snapshot checksum mismatch: expected {:08x}, got {:08x}",
                expected, actual
            )));
        }

        Ok(serde_json::from_str(body)?)
    }

    async fn after_write(&self) -> Result<()> {
        match self.config.sync_strategy {
            SyncStrategy::EveryWrite => self.flush().await,
            SyncStrategy::OnShutdown => {
                self.dirty.store(true, Ordering::SeqCst);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Storage for FileStorage {
    /// Load the snapshot if one exists
    async fn initialize(&self) -> Result<()> {
        let contents = match tokio::fs::read_to_string(&self.config.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.config.path.display(), "no snapshot found, starting empty");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let loaded = Self::decode_snapshot(&contents)?;
        tracing::info!(path = %self.config.path.display(), keys = loaded.len(), "snapshot loaded");
        *self.data.write() = loaded;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn shutdown(&self) -> Result<()> {
        let exists = tokio::fs::try_exists(&self.config.path).await?;
        if self.dirty.load(Ordering::SeqCst) || !exists {
            self.flush().await?;
        }
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.data.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.data.write().insert(key.to_string(), value.to_string());
        self.after_write().await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let removed = self.data.write().remove(key).is_some();
        if removed {
            self.after_write().await?;
        }
        Ok(())
    }
}
