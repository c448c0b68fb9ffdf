//! # Persistence Backends
//!
//! The flat keyed-blob store underneath every table.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Keyed Blob Store                                    │
//! │                                                                         │
//! │  key                      blob                                          │
//! │  ─────────────────────    ────────────────────────────────────          │
//! │  mobilia_products         [{"id":"…","name":"Chair",…}, …]             │
//! │  mobilia_orders           [{"id":"…","total":250,…}, …]                │
//! │  mobilia_raw_materials    […]                                           │
//! │                                                                         │
//! │  One blob per table, rewritten whole on every mutation.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Backends know nothing about records; the codec turns blobs into tables.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A flat key → blob store.
pub trait Backend: Send + fmt::Debug {
    /// Returns the blob under `key`, or `None` if nothing was saved yet.
    fn load(&self, key: &str) -> StoreResult<Option<String>>;

    /// Replaces the blob under `key`.
    fn save(&mut self, key: &str, blob: &str) -> StoreResult<()>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> StoreResult<()>;

    /// All keys currently stored.
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// Builds the persisted key for a table.
pub fn table_key(namespace: &str, table: &str) -> String {
    format!("{}_{}", namespace, table)
}

// =============================================================================
// Memory Backend
// =============================================================================

/// In-memory backend for tests and ephemeral stores.
///
/// Clones share the same map, so a second store opened on a clone sees
/// what the first one persisted (a cheap way to test reloads).
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    blobs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.blobs
            .lock()
            .map_err(|_| StoreError::Storage("memory backend mutex poisoned".to_string()))
    }
}

impl Backend for MemoryBackend {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn save(&mut self, key: &str, blob: &str) -> StoreResult<()> {
        self.lock()?.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self.lock()?.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

// =============================================================================
// File Backend
// =============================================================================

/// One `<key>.json` file per table inside a data directory.
///
/// ## Write Path
/// ```text
/// save("mobilia_products")
///      │
///      ├── write  data/mobilia_products.json.tmp
///      └── rename data/mobilia_products.json.tmp → data/mobilia_products.json
/// ```
/// The rename replaces the old file in one step, so a crash mid-write
/// leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Opens (and creates if needed) a data directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "File backend opened");
        Ok(FileBackend { dir })
    }

    /// The data directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Backend for FileBackend {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn save(&mut self, key: &str, blob: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        debug!(key, bytes = blob.len(), "Blob written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
