// Copyright (c) 2025 - Cowboy AI, Inc.
//! Environments and Network Tags
//!
//! An environment (production, staging, ...) is one row of the configured
//! table: the network tag that activates it, where its inventory lives, where
//! its files go and which directive pulls them into the primary SSH config.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque identifier of an attached private network (e.g. `prod`, `stage`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkTag(String);

impl NetworkTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NetworkTag {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// One row of the environment table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSpec {
    /// Human name, e.g. `production`
    pub name: String,

    /// Network tag that activates this environment
    pub network_tag: NetworkTag,

    /// Inventory endpoint (plain HTTP GET)
    pub endpoint: String,

    /// Directory for generated farm files; relative paths resolve against
    /// the SSH directory
    pub output_dir: PathBuf,

    /// Line placed in the primary SSH config, e.g. `Include prod.config`
    pub directive: String,

    /// File the directive includes; written with an `Include` of the
    /// generated farm files when set
    #[serde(default)]
    pub index_file: Option<PathBuf>,

    /// Local address prefixes showing this network is attached
    #[serde(default)]
    pub address_prefixes: Vec<String>,
}

impl EnvironmentSpec {
    /// Absolute output directory under `ssh_dir`
    pub fn output_dir_in(&self, ssh_dir: &Path) -> PathBuf {
        ssh_dir.join(&self.output_dir)
    }

    /// Absolute index file path under `ssh_dir`, if one is configured
    pub fn index_file_in(&self, ssh_dir: &Path) -> Option<PathBuf> {
        self.index_file.as_ref().map(|file| ssh_dir.join(file))
    }

    /// Whether `line` is this environment's directive
    ///
    /// Matching is a prefix test on the trimmed line, so trailing comments or
    /// whitespace added by hand still count as ours.
    pub fn owns_line(&self, line: &str) -> bool {
        let directive = self.directive.trim();
        !directive.is_empty() && line.trim().starts_with(directive)
    }

    /// Host portion of the endpoint (`host:port`), used to probe routing
    pub fn endpoint_authority(&self) -> Option<&str> {
        let rest = self
            .endpoint
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.endpoint);
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if authority.is_empty() {
            None
        } else {
            Some(authority)
        }
    }
}

impl fmt::Display for EnvironmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.network_tag)
    }
}
