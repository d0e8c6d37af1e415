//! Sync configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.arbor/
//!   config.yaml   (optional — defaults apply when absent)
//!   trees/        (default data dir for the file-backed store)
//! ```
//!
//! Every function that touches disk has two forms: `fn_at(home, …)` with an
//! explicit home (used by tests with a `TempDir`), and `fn(…)` which resolves
//! home through `dirs::home_dir()`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use arbor_core::BranchName;

use crate::error::{config_io_err, ConfigError};

/// Which [`crate::store::TreeStore`] backend to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    File,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Root directory of the file-backed store.
    pub data_dir: PathBuf,
    /// Branch used when a request does not name one.
    pub default_branch: BranchName,
    /// Largest tree accepted by a single sync.
    pub max_nodes: usize,
    pub store: StoreBackend,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".arbor"),
            default_branch: BranchName::from("main"),
            max_nodes: 250_000,
            store: StoreBackend::default(),
        }
    }
}

impl SyncConfig {
    /// Defaults with `data_dir` rooted at `<home>/.arbor`.
    pub fn default_at(home: &Path) -> Self {
        Self {
            data_dir: home.join(".arbor"),
            ..Self::default()
        }
    }
}

/// `<home>/.arbor/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".arbor").join("config.yaml")
}

/// Load the config under `home`, or [`SyncConfig::default_at`] if absent.
///
/// A relative `data_dir` in the file is resolved against `<home>/.arbor`.
pub fn load_at(home: &Path) -> Result<SyncConfig, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Ok(SyncConfig::default_at(home));
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| config_io_err(&path, e))?;
    let mut config: SyncConfig = serde_yaml::from_str(&contents)
        .map_err(|e| ConfigError::Parse { path, source: e })?;
    if config.data_dir.is_relative() {
        config.data_dir = home.join(".arbor").join(&config.data_dir);
    }
    Ok(config)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncConfig, ConfigError> {
    load_at(&home()?)
}

/// Save atomically: write `config.yaml.tmp`, then rename over `config.yaml`.
pub fn save_at(home: &Path, config: &SyncConfig) -> Result<(), ConfigError> {
    let path = config_path_at(home);
    let dir = home.join(".arbor");
    std::fs::create_dir_all(&dir).map_err(|e| config_io_err(&dir, e))?;

    let yaml = serde_yaml::to_string(config)?;
    let tmp = path.with_extension("yaml.tmp");
    std::fs::write(&tmp, yaml).map_err(|e| config_io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(config_io_err(&path, e));
    }
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(config: &SyncConfig) -> Result<(), ConfigError> {
    save_at(&home()?, config)
}

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}
