//! Typed configuration loaded from a single YAML file.
//!
//! Deliberately minimal: one file, one path, no discovery up a directory
//! tree and no environment-variable interpolation inside values.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::adapter::ConflictStrategy;
use crate::adapter::github::LabelConfig;

/// Per-file-kind label settings, as written in the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LabelSection {
    /// Labels applied to every pushed file.
    #[serde(default)]
    pub common: Vec<String>,
    /// Remaining keys are file kinds (`spec`, `plan`, `research`, ...).
    #[serde(flatten)]
    pub by_kind: HashMap<String, Vec<String>>,
}

impl From<LabelSection> for LabelConfig {
    fn from(section: LabelSection) -> Self {
        Self { common: section.common, by_kind: section.by_kind }
    }
}

/// GitHub-tracker connection settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GithubConfig {
    /// Repository owner or organization.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Tracker CLI binary to invoke. Defaults to `gh`.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Per-file-kind label configuration.
    #[serde(default)]
    pub labels: LabelSection,
}

fn default_binary() -> String {
    "gh".to_string()
}

fn default_true() -> bool {
    true
}

/// Root configuration shape.
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Root directory containing spec subdirectories. Defaults to `specs`.
    #[serde(default = "default_specs_root")]
    pub specs_root: String,
    /// Whether files without an explicit `auto_sync: false` participate in
    /// `sync --all`. Defaults to `true`.
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    /// Strategy applied when a conflict is detected and no `--force`/
    /// `--ours`/`--theirs` flag overrides it.
    #[serde(default)]
    pub conflict_strategy: ConflictStrategy,
    /// Tracker connection settings. Only a GitHub-style tracker ships today.
    pub github: GithubConfig,
}

fn default_specs_root() -> String {
    "specs".to_string()
}

/// Errors encountered while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read config file {path}: {source}")]
    Read { path: String, source: std::io::Error },
    /// The file's contents did not match the expected schema.
    #[error("invalid config file {path}: {source}")]
    Parse { path: String, source: serde_yaml::Error },
}

/// Loads and parses a `SyncConfig` from a single YAML file.
///
/// # Errors
///
/// Returns `ConfigError::Read` if the file cannot be read, or
/// `ConfigError::Parse` if its contents do not match the expected schema.
pub fn load_from_path(path: &Path) -> Result<SyncConfig, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
    serde_yaml::from_str(&content)
        .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
}
