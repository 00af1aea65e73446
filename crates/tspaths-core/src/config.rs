//! Runtime and path-mapping configuration.
//!
//! Discovering and parsing a project's manifest (e.g. `tsconfig.json`) is
//! left to an external collaborator behind [`ConfigLoader`]. This module only
//! defines the shapes that collaborator produces, plus [`ExplicitParams`] for
//! callers that pass the mapping directly.

use crate::error::Error;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tspaths_util::path::join_normalized;

/// Manifest fields probed when a candidate is a directory.
pub const DEFAULT_MAIN_FIELDS: &[&str] = &["main"];

/// Pattern to target-template mapping, in declaration order.
pub type PathMapping = IndexMap<String, Vec<String>>;

/// Runtime configuration for the tspaths CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

/// Path-mapping parameters supplied directly by the caller.
///
/// JSON shape:
/// ```json
/// { "baseUrl": "./src", "paths": { "@app/*": ["app/*"] }, "mainFields": ["module", "main"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplicitParams {
    /// Base directory, absolute or relative to the loader's cwd.
    pub base_url: String,
    #[serde(default)]
    pub paths: PathMapping,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_fields: Option<Vec<String>>,
    #[serde(default = "default_add_match_all")]
    pub add_match_all: bool,
    /// Extensions tried before the native ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Vec<String>>,
}

fn default_add_match_all() -> bool {
    true
}

impl ExplicitParams {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            paths: PathMapping::new(),
            main_fields: None,
            add_match_all: true,
            extensions: None,
        }
    }

    /// Add a pattern with its target templates.
    #[must_use]
    pub fn with_path<I, S>(mut self, pattern: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.paths
            .insert(pattern.into(), targets.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_main_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.main_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_add_match_all(mut self, add_match_all: bool) -> Self {
        self.add_match_all = add_match_all;
        self
    }

    /// Read parameters from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// A successfully loaded path-mapping configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedConfig {
    pub absolute_base_url: PathBuf,
    pub paths: PathMapping,
    pub main_fields: Vec<String>,
    pub add_match_all: bool,
    pub extensions: Vec<String>,
}

/// Outcome of loading configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLoaderResult {
    Success(LoadedConfig),
    /// No usable base directory or mapping; registration becomes a no-op.
    Failed { message: String },
}

impl ConfigLoaderResult {
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// Source of path-mapping configuration.
pub trait ConfigLoader {
    /// Load configuration relative to `cwd`.
    fn load(&self, cwd: &Path) -> ConfigLoaderResult;
}

impl ConfigLoader for ExplicitParams {
    fn load(&self, cwd: &Path) -> ConfigLoaderResult {
        if self.base_url.trim().is_empty() {
            return ConfigLoaderResult::failed("Missing baseUrl in explicit path mapping");
        }

        ConfigLoaderResult::Success(LoadedConfig {
            absolute_base_url: join_normalized(cwd, &self.base_url),
            paths: self.paths.clone(),
            main_fields: self.main_fields.clone().unwrap_or_else(|| {
                DEFAULT_MAIN_FIELDS.iter().map(|s| (*s).to_string()).collect()
            }),
            add_match_all: self.add_match_all,
            extensions: self.extensions.clone().unwrap_or_default(),
        })
    }
}

/// A result produced elsewhere is passed through as-is.
impl ConfigLoader for ConfigLoaderResult {
    fn load(&self, _cwd: &Path) -> ConfigLoaderResult {
        self.clone()
    }
}
