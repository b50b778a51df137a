//! Configuration file loading and parsing.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use steamroller_core::ResourceMap;
use thiserror::Error;

use crate::types::{ResourceOverride, SteamrollerConfig};

static ENV_VAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}").expect("env var pattern is valid")
});

/// Config loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config: {source}")]
    ReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("invalid YAML at line {}: {message}", line.map(|l| l.to_string()).unwrap_or_else(|| "unknown".to_string()))]
    ParseError { line: Option<usize>, message: String },

    #[error("validation error: {message}")]
    ValidationError { message: String },

    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("invalid resource override {value:?}: expected key=value")]
    InvalidOverride { value: String },
}

/// Configuration loader.
///
/// Reads the optional config file, then layers `key=value` overrides on top.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    overrides: Vec<ResourceOverride>,
}

impl ConfigLoader {
    /// A loader with no config file and no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the base resource map from `path`.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Add overrides applied after the file.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = ResourceOverride>) -> Self {
        self.overrides.extend(overrides);
        self
    }

    /// Load the file (if any) and apply overrides.
    pub fn load(&self) -> Result<SteamrollerConfig, ConfigError> {
        let mut config = match &self.path {
            Some(path) => Self::load_file(path)?,
            None => SteamrollerConfig::default(),
        };

        config.apply_overrides(&self.overrides);
        self.validate(&config)?;

        tracing::debug!(roots = config.resource_map.len(), "loaded resource map");
        Ok(config)
    }

    /// Load and convert straight to a [`ResourceMap`].
    pub fn resource_map(&self) -> Result<ResourceMap, ConfigError> {
        self.load()?.to_resource_map()
    }

    fn load_file(path: &Path) -> Result<SteamrollerConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let expanded = expand_env_vars(&contents)?;

        // An empty file deserializes to null rather than an empty mapping.
        if expanded.trim().is_empty() {
            return Ok(SteamrollerConfig::default());
        }

        serde_yaml::from_str(&expanded).map_err(|e| ConfigError::ParseError {
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })
    }

    /// Validate configuration values.
    fn validate(&self, config: &SteamrollerConfig) -> Result<(), ConfigError> {
        for (root, dir) in &config.resource_map {
            if dir.is_empty() {
                return Err(ConfigError::ValidationError {
                    message: format!("resource {root:?} has an empty directory"),
                });
            }
        }
        config.to_resource_map().map(|_| ())
    }
}

/// Expand environment variables in the form `${VAR}` or `${VAR:-default}`.
pub fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let expanded = ENV_VAR.replace_all(content, |cap: &regex::Captures<'_>| {
        let var_name = &cap[1];
        match std::env::var(var_name) {
            Ok(value) => value,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => {
                    missing.get_or_insert_with(|| var_name.to_string());
                    String::new()
                }
            },
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(expanded.into_owned()),
    }
}
