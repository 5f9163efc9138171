// Copyright (c) 2025 - Cowboy AI, Inc.
//! Farm and Cage Topology Records
//!
//! A [`Farm`] is a jump host fronting an ordered group of [`Cage`]s. Both are
//! plain values: decoded once per run, rendered, then dropped.
//!
//! # Safety of inventory fields
//!
//! Farm names become `Host` patterns and file names; addresses become
//! `HostName` values. Inventory arrives over plain HTTP, so both are checked
//! before anything is rendered:
//!
//! - names: non-empty, no leading `.`, no whitespace, control characters,
//!   path separators, quotes or SSH pattern characters (`* ? ! , #`)
//! - addresses: non-empty, no whitespace, control characters, quotes or
//!   backslashes

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Inventory record that cannot be rendered safely
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("Farm name is empty")]
    EmptyName,

    #[error("Farm name {name:?} {reason}")]
    UnsafeName { name: String, reason: &'static str },

    #[error("Address {address:?} is empty or contains whitespace, control, quote or escape characters")]
    UnsafeAddress { address: String },
}

/// Check that `name` can be used as an alias stem and a file name
pub fn validate_farm_name(name: &str) -> Result<(), RecordError> {
    let unsafe_name = |reason| RecordError::UnsafeName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(RecordError::EmptyName);
    }
    if name.starts_with('.') {
        return Err(unsafe_name("starts with '.'"));
    }
    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(unsafe_name("contains whitespace or control characters"));
    }
    if name.contains(['/', '\\']) {
        return Err(unsafe_name("contains a path separator"));
    }
    if name.contains(['"', '\'']) {
        return Err(unsafe_name("contains quotes"));
    }
    if name.contains(['*', '?', '!', ',', '#']) {
        return Err(unsafe_name("contains SSH pattern characters"));
    }
    Ok(())
}

/// Check that `address` can be used as a `HostName` value
pub fn validate_address(address: &str) -> Result<(), RecordError> {
    let unsafe_char =
        |c: char| c.is_whitespace() || c.is_control() || matches!(c, '"' | '\'' | '\\');
    if address.is_empty() || address.chars().any(unsafe_char) {
        return Err(RecordError::UnsafeAddress {
            address: address.to_string(),
        });
    }
    Ok(())
}

/// A sub-unit reachable only through its owning farm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cage {
    /// Address used as `HostName`
    pub address: String,

    /// Human identifier; preferred alias discriminator
    pub label: Option<String>,

    /// Hardware identifier (colon-delimited hex groups), used when `label`
    /// is absent or blank
    pub unit_id: Option<String>,
}

impl Cage {
    /// Create a cage identified by a human label
    pub fn labeled(address: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: Some(label.into()),
            unit_id: None,
        }
    }

    /// Create a cage identified only by its unit id
    pub fn with_unit_id(address: impl Into<String>, unit_id: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            label: None,
            unit_id: Some(unit_id.into()),
        }
    }

    /// The label with surrounding whitespace removed, if anything remains
    pub fn trimmed_label(&self) -> Option<&str> {
        self.label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        validate_address(&self.address)
    }
}

/// A top-level host acting as the jump host for its cages
///
/// Identity is `name`, assumed unique within one inventory fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Farm {
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub cages: Vec<Cage>,
}

impl Farm {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            cages: Vec::new(),
        }
    }

    /// Append a cage, keeping inventory order
    pub fn with_cage(mut self, cage: Cage) -> Self {
        self.cages.push(cage);
        self
    }

    /// Name of the generated file: dashes become underscores, `.config` suffix
    ///
    /// Only meaningful for farms that pass [`Farm::validate`].
    pub fn file_name(&self) -> String {
        format!("{}.config", self.name.replace('-', "_"))
    }

    pub fn has_cages(&self) -> bool {
        !self.cages.is_empty()
    }

    /// Check the farm's own name and address; cages are checked one by one
    pub fn validate(&self) -> Result<(), RecordError> {
        validate_farm_name(&self.name)?;
        validate_address(&self.address)
    }

    /// Cages whose address can be rendered, in inventory order
    pub fn renderable_cages(&self) -> impl Iterator<Item = &Cage> {
        self.cages.iter().filter(|cage| cage.validate().is_ok())
    }

    /// Cages skipped by rendering, with the reason
    pub fn rejected_cages(&self) -> impl Iterator<Item = (&Cage, RecordError)> {
        self.cages
            .iter()
            .filter_map(|cage| cage.validate().err().map(|e| (cage, e)))
    }
}
