// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for a run
//!
//! One variant per failure class an operator can see. Which step failed also
//! decides how far the failure reaches:
//!
//! - `Discovery` ends the run before any file is touched
//! - `Fetch` / `Decode` skip one environment
//! - `Filesystem` skips one farm, or one environment when its directory
//!   cannot be created
//! - `Merge` affects only the primary config; generated files stay on disk

use thiserror::Error;

use crate::adapters::{DiscoveryError, FetchError};
use crate::config::ConfigError;
use crate::materialize::MaterializeError;
use crate::merge::MergeError;

/// Errors that can occur during a run
#[derive(Debug, Error)]
pub enum CageSshError {
    /// Active environments could not be determined
    #[error("Network discovery failed: {0}")]
    Discovery(String),

    /// Inventory could not be retrieved
    #[error("Inventory fetch failed: {0}")]
    Fetch(String),

    /// Inventory was retrieved but is not a farm list
    #[error("Inventory decode failed: {0}")]
    Decode(String),

    /// A directory or generated file could not be written
    #[error("Filesystem error: {0}")]
    Filesystem(String),

    /// The primary SSH config could not be read or written
    #[error("Primary config merge failed: {0}")]
    Merge(String),

    /// Configuration is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for run operations
pub type CageSshResult<T> = Result<T, CageSshError>;

impl From<DiscoveryError> for CageSshError {
    fn from(err: DiscoveryError) -> Self {
        CageSshError::Discovery(err.to_string())
    }
}

impl From<FetchError> for CageSshError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Decode(_) => CageSshError::Decode(err.to_string()),
            other => CageSshError::Fetch(other.to_string()),
        }
    }
}

impl From<MaterializeError> for CageSshError {
    fn from(err: MaterializeError) -> Self {
        CageSshError::Filesystem(err.to_string())
    }
}

impl From<MergeError> for CageSshError {
    fn from(err: MergeError) -> Self {
        CageSshError::Merge(err.to_string())
    }
}

impl From<ConfigError> for CageSshError {
    fn from(err: ConfigError) -> Self {
        CageSshError::Configuration(err.to_string())
    }
}
