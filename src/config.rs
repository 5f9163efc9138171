// Copyright (c) 2025 - Cowboy AI, Inc.
//! Run Configuration
//!
//! The environment table and the paths every component works against. All
//! components receive these values explicitly; nothing below this module
//! reads the process environment.
//!
//! # Environment Variables
//!
//! | Variable                 | Effect                                        |
//! |--------------------------|-----------------------------------------------|
//! | `CAGE_SSH_CONFIG`        | JSON file replacing the built-in table        |
//! | `CAGE_SSH_DIR`           | SSH directory (default `$HOME/.ssh`)          |
//! | `CAGE_SSH_TIMEOUT_SECS`  | Inventory fetch deadline in seconds           |
//! | `CAGE_SSH_NETWORKS`      | Comma-separated tags; skips network detection |

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::{EnvironmentSpec, NetworkTag};

/// Name of the primary SSH config inside the SSH directory
pub const PRIMARY_CONFIG_FILE: &str = "config";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot locate the SSH directory: set CAGE_SSH_DIR or HOME")]
    NoSshDir,

    #[error("Invalid value for {variable}: {value}")]
    InvalidVariable { variable: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Per-user SSH directory; the primary config lives at `<ssh_dir>/config`
    #[serde(default)]
    pub ssh_dir: PathBuf,

    /// Inventory fetch deadline
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Known environments, in processing order
    pub environments: Vec<EnvironmentSpec>,

    /// Tags to use instead of detecting attached networks
    #[serde(default)]
    pub networks: Option<BTreeSet<NetworkTag>>,
}

fn default_timeout() -> u64 {
    2
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssh_dir: PathBuf::new(),
            timeout_secs: default_timeout(),
            environments: vec![
                EnvironmentSpec {
                    name: "production".to_string(),
                    network_tag: NetworkTag::new("prod"),
                    endpoint: "http://10.250.0.1:8181/".to_string(),
                    output_dir: PathBuf::from("prod"),
                    directive: "Include prod.config".to_string(),
                    index_file: Some(PathBuf::from("prod.config")),
                    address_prefixes: vec!["10.251.".to_string()],
                },
                EnvironmentSpec {
                    name: "staging".to_string(),
                    network_tag: NetworkTag::new("stage"),
                    endpoint: "http://10.240.0.1:8181/".to_string(),
                    output_dir: PathBuf::from("staging"),
                    directive: "Include staging.config".to_string(),
                    index_file: Some(PathBuf::from("staging.config")),
                    address_prefixes: vec!["10.241.".to_string()],
                },
            ],
            networks: None,
        }
    }
}

impl Config {
    /// Build a configuration for `ssh_dir` with the built-in table
    pub fn with_ssh_dir(ssh_dir: impl Into<PathBuf>) -> Self {
        Self {
            ssh_dir: ssh_dir.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("CAGE_SSH_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Some(dir) = lookup("CAGE_SSH_DIR") {
            config.ssh_dir = PathBuf::from(dir);
        } else if config.ssh_dir.as_os_str().is_empty() {
            let home = lookup("HOME").ok_or(ConfigError::NoSshDir)?;
            config.ssh_dir = Path::new(&home).join(".ssh");
        }

        if let Some(raw) = lookup("CAGE_SSH_TIMEOUT_SECS") {
            config.timeout_secs = raw.trim().parse().map_err(|_| ConfigError::InvalidVariable {
                variable: "CAGE_SSH_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup("CAGE_SSH_NETWORKS") {
            config.networks = Some(parse_tags(&raw));
        }

        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the table for mistakes that would make runs ambiguous
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environments.is_empty() {
            return Err(ConfigError::Invalid("no environments configured".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }

        let mut names = BTreeSet::new();
        let mut tags = BTreeSet::new();
        for env in &self.environments {
            if !names.insert(env.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate environment name '{}'",
                    env.name
                )));
            }
            if !tags.insert(&env.network_tag) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate network tag '{}'",
                    env.network_tag
                )));
            }
            if env.directive.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "environment '{}' has an empty directive",
                    env.name
                )));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Path of the primary SSH config
    pub fn primary_config_path(&self) -> PathBuf {
        self.ssh_dir.join(PRIMARY_CONFIG_FILE)
    }
}

fn parse_tags(raw: &str) -> BTreeSet<NetworkTag> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(NetworkTag::new)
        .collect()
}
