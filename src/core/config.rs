//! Configuration loading
//!
//! Layers, later wins: built-in defaults, the user config file, the local
//! `.freshline/config.yaml`, then `FRESHLINE_*` environment variables.
//! Loading never fails; bad layers are skipped with a warning.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::core::entry::Actor;
use crate::core::history::DEFAULT_CAPACITY;
use crate::core::rollback::UnauthenticatedPolicy;
use crate::core::slot::{DurableSlot, FileSlot, MemorySlot, SlotError, SqliteSlot, DEFAULT_SLOT_KEY};

/// Local config file, relative to the working directory
pub const LOCAL_CONFIG: &str = ".freshline/config.yaml";

pub const ENV_DATA_DIR: &str = "FRESHLINE_DATA_DIR";
pub const ENV_USER_ID: &str = "FRESHLINE_USER_ID";
pub const ENV_USER_NAME: &str = "FRESHLINE_USER_NAME";
pub const ENV_CAPACITY: &str = "FRESHLINE_HISTORY_CAPACITY";

/// Errors reading a single config layer
#[derive(Debug, Error, miette::Diagnostic)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    #[diagnostic(code(freshline::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    #[diagnostic(code(freshline::config::yaml))]
    Yaml(#[from] serde_yml::Error),
}

/// Storage backend of the durable slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SlotBackend {
    /// `<data_dir>/<slot>.json`
    #[default]
    Json,
    /// Row in `<data_dir>/freshline.db`
    Sqlite,
    /// Process memory only
    Memory,
}

impl std::fmt::Display for SlotBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotBackend::Json => write!(f, "json"),
            SlotBackend::Sqlite => write!(f, "sqlite"),
            SlotBackend::Memory => write!(f, "memory"),
        }
    }
}

/// `history:` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum retained entries
    pub capacity: usize,
    pub backend: SlotBackend,
    /// Durable slot key
    pub slot: String,
    /// Where slots live (default: platform data dir)
    pub data_dir: Option<PathBuf>,
    pub unauthenticated: UnauthenticatedPolicy,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            backend: SlotBackend::default(),
            slot: DEFAULT_SLOT_KEY.to_string(),
            data_dir: None,
            unauthenticated: UnauthenticatedPolicy::default(),
        }
    }
}

/// `user:` section - the identity used by the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl UserConfig {
    /// Actor for this user; the name falls back to the id
    pub fn actor(&self) -> Option<Actor> {
        let id = self.id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(id);
        Some(Actor::new(id, name))
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub history: HistoryConfig,
    pub user: UserConfig,
}

impl Config {
    /// Load all layers from their standard locations
    pub fn load() -> Self {
        let mut paths = Vec::new();
        if let Some(dirs) = project_dirs() {
            paths.push(dirs.config_dir().join("config.yaml"));
        }
        paths.push(PathBuf::from(LOCAL_CONFIG));
        Self::load_from(&paths, |name| std::env::var(name).ok())
    }

    /// Merge the given YAML files in order, then apply variable overrides
    ///
    /// Missing files are skipped silently.
    pub fn load_from(paths: &[PathBuf], vars: impl Fn(&str) -> Option<String>) -> Self {
        let mut merged = serde_yml::Value::Mapping(Default::default());
        for path in paths.iter().filter(|p| p.exists()) {
            match read_layer(path) {
                Ok(layer) => {
                    debug!(path = %path.display(), "loaded config layer");
                    merge_yaml(&mut merged, layer);
                }
                Err(e) => warn!(error = %e, "skipping config layer"),
            }
        }

        let mut config = match serde_yml::from_value::<Config>(merged) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "invalid merged config, using defaults");
                Config::default()
            }
        };
        config.apply_overrides(vars);
        config
    }

    /// Parse a single YAML document
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yml::from_str(content)?)
    }

    /// Apply `FRESHLINE_*` overrides looked up through `vars`
    pub fn apply_overrides(&mut self, vars: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = vars(ENV_DATA_DIR).filter(|s| !s.is_empty()) {
            self.history.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(id) = vars(ENV_USER_ID).filter(|s| !s.is_empty()) {
            self.user.id = Some(id);
        }
        if let Some(name) = vars(ENV_USER_NAME).filter(|s| !s.is_empty()) {
            self.user.name = Some(name);
        }
        if let Some(raw) = vars(ENV_CAPACITY) {
            match raw.parse::<usize>() {
                Ok(capacity) => self.history.capacity = capacity,
                Err(_) => warn!(value = %raw, "ignoring invalid {}", ENV_CAPACITY),
            }
        }
    }

    /// Directory holding the durable slot and short id index
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.history.data_dir {
            return dir.clone();
        }
        project_dirs()
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".freshline"))
    }

    /// Open the configured durable slot
    pub fn open_slot(&self) -> Result<Box<dyn DurableSlot>, SlotError> {
        let key = self.history.slot.clone();
        Ok(match self.history.backend {
            SlotBackend::Json => Box::new(FileSlot::open(&self.data_dir(), key)?),
            SlotBackend::Sqlite => Box::new(SqliteSlot::open(&self.data_dir(), key)?),
            SlotBackend::Memory => Box::new(MemorySlot::new(key)),
        })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "freshline")
}

fn read_layer(path: &Path) -> Result<serde_yml::Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(serde_yml::Value::Mapping(Default::default()));
    }
    let layer: serde_yml::Value = serde_yml::from_str(&content)?;
    // A layer must stand on its own so one bad value cannot void the others
    serde_yml::from_value::<Config>(layer.clone())?;
    Ok(layer)
}

/// Deep-merge `overlay` into `base`; mappings merge, everything else replaces
fn merge_yaml(base: &mut serde_yml::Value, overlay: serde_yml::Value) {
    match (base, overlay) {
        (serde_yml::Value::Mapping(base_map), serde_yml::Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_yaml(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}
