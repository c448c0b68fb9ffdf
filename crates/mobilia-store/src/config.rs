//! # Store Configuration
//!
//! Configuration management for the document store.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     MOBILIA_NAMESPACE=mobilia                                          │
//! │     MOBILIA_BACKEND=memory                                             │
//! │     MOBILIA_DATA_DIR=/var/lib/mobilia                                  │
//! │     MOBILIA_CACHE_ENABLED=false                                        │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/mobilia-pos/store.toml (Linux)                           │
//! │     ~/Library/Application Support/com.mobilia.pos/store.toml (macOS)   │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     file backend, namespace "mobilia", cache on, no indexes            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! namespace = "mobilia"
//! backend = "file"
//! data_dir = "./data"
//!
//! [cache]
//! enabled = true
//!
//! [[indexes]]
//! table = "products"
//! field = "category"
//! ```

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use mobilia_core::validation::{validate_field_name, validate_namespace, validate_table_name};
use mobilia_core::DEFAULT_NAMESPACE;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{Backend, FileBackend, MemoryBackend};
use crate::error::{StoreError, StoreResult};

// =============================================================================
// Backend Kind
// =============================================================================

/// Which persistence backend the store opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// One JSON file per table under `data_dir`.
    #[default]
    File,

    /// Nothing survives the process. For tests and demos.
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::File => write!(f, "file"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" | "disk" => Ok(BackendKind::File),
            "memory" | "mem" => Ok(BackendKind::Memory),
            other => Err(StoreError::Config(format!(
                "Unknown backend: '{}'. Valid options: file, memory",
                other
            ))),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// Prefix of every persisted key (`<namespace>_<table>`).
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub backend: BackendKind,

    /// Directory for the file backend.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "mobilia", "pos")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./data"))
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            namespace: default_namespace(),
            backend: BackendKind::default(),
            data_dir: default_data_dir(),
        }
    }
}

/// Front cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

impl Default for CacheSettings {
    fn default() -> Self {
        CacheSettings { enabled: true }
    }
}

/// An index to build when the store opens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub table: String,
    pub field: String,
}

// =============================================================================
// Main Store Configuration
// =============================================================================

/// Complete store configuration.
///
/// ## Example
/// ```rust
/// use mobilia_store::StoreConfig;
///
/// let config = StoreConfig::in_memory()
///     .namespace("test")
///     .index("products", "category")
///     .cache_enabled(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub indexes: Vec<IndexSpec>,
}

impl StoreConfig {
    /// File-backed configuration rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.storage.data_dir = data_dir.into();
        config
    }

    /// In-memory configuration (for testing).
    pub fn in_memory() -> Self {
        let mut config = Self::default();
        config.storage.backend = BackendKind::Memory;
        config
    }

    /// Sets the key namespace.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.storage.namespace = namespace.into();
        self
    }

    /// Sets the file backend's data directory.
    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = dir.into();
        self
    }

    /// Adds an index to build on open.
    pub fn index(mut self, table: impl Into<String>, field: impl Into<String>) -> Self {
        self.indexes.push(IndexSpec {
            table: table.into(),
            field: field.into(),
        });
        self
    }

    /// Turns the front cache on or off.
    pub fn cache_enabled(mut self, enabled: bool) -> Self {
        self.cache.enabled = enabled;
        self
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (store.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading store config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load store config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> StoreResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| StoreError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Store config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> StoreResult<()> {
        validate_namespace(&self.storage.namespace)?;

        if self.storage.backend == BackendKind::File
            && self.storage.data_dir.as_os_str().is_empty()
        {
            return Err(StoreError::Config(
                "data_dir is required for the file backend".into(),
            ));
        }

        for spec in &self.indexes {
            validate_table_name(&spec.table)?;
            validate_field_name(&spec.field)?;
        }

        Ok(())
    }

    /// Applies `MOBILIA_*` overrides from a variable lookup.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(namespace) = lookup("MOBILIA_NAMESPACE") {
            debug!(namespace = %namespace, "Overriding namespace from environment");
            self.storage.namespace = namespace;
        }

        if let Some(backend) = lookup("MOBILIA_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.storage.backend = kind,
                Err(_) => warn!(backend = %backend, "Unknown backend in environment"),
            }
        }

        if let Some(dir) = lookup("MOBILIA_DATA_DIR") {
            debug!(dir = %dir, "Overriding data dir from environment");
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(enabled) = lookup("MOBILIA_CACHE_ENABLED") {
            match enabled.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.cache.enabled = true,
                "0" | "false" | "no" | "off" => self.cache.enabled = false,
                _ => warn!(value = %enabled, "Unknown cache flag in environment"),
            }
        }
    }

    /// Opens the configured backend.
    pub fn open_backend(&self) -> StoreResult<Box<dyn Backend>> {
        match self.storage.backend {
            BackendKind::Memory => Ok(Box::new(MemoryBackend::new())),
            BackendKind::File => Ok(Box::new(FileBackend::open(&self.storage.data_dir)?)),
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "mobilia", "pos")
            .map(|dirs| dirs.config_dir().join("store.toml"))
    }
}
