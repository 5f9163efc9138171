// Copyright (c) 2025 - Cowboy AI, Inc.
//! Primary SSH Config Merge
//!
//! Reconciles the user's primary SSH config with the directives produced by a
//! run. The document is opaque except for lines this tool owns: lines whose
//! trimmed text starts with one of the managed directives.
//!
//! # Policy: strip and prepend
//!
//! ```text
//! existing lines ──filter(owned)──> foreign lines
//! new directives ++ foreign lines ─────────────> merged document
//! ```
//!
//! Every owned line is removed wherever it appears, then the new directives
//! are placed at the top in selection order. Foreign lines keep their text,
//! blank lines and order. Merging twice with the same directives yields the
//! same bytes as merging once.
//!
//! A missing file is bootstrapped with just the directives and a trailing
//! newline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::EnvironmentSpec;
use crate::materialize::{write_private_file, MaterializeError};

/// Errors reading or writing the primary config
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot write primary config: {0}")]
    Write(#[from] MaterializeError),
}

/// What happened to the primary config
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The file did not exist and was created
    Created,
    /// The file changed and was rewritten
    Updated,
    /// The merged document equals the current one; nothing was written
    Unchanged,
}

/// The directive lines owned by this tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagedDirectives {
    directives: Vec<String>,
}

impl ManagedDirectives {
    pub fn new<I, S>(directives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let directives = directives
            .into_iter()
            .map(|d| d.as_ref().trim().to_string())
            .filter(|d| !d.is_empty())
            .collect();
        Self { directives }
    }

    /// Every directive in the environment table, active or not
    pub fn from_environments(environments: &[EnvironmentSpec]) -> Self {
        Self::new(environments.iter().map(|env| env.directive.as_str()))
    }

    /// Whether `line` belongs to this tool
    pub fn owns(&self, line: &str) -> bool {
        let line = line.trim();
        self.directives
            .iter()
            .any(|directive| line.starts_with(directive.as_str()))
    }
}

/// Merge `new_directives` into the lines of an existing document
///
/// Duplicate directives in the input are emitted once. Directives that are
/// not part of `managed` are still treated as owned, so re-running never
/// stacks copies of them.
pub fn merge_lines<S: AsRef<str>>(
    existing: &[S],
    new_directives: &[String],
    managed: &ManagedDirectives,
) -> Vec<String> {
    let mut owned = managed.clone();
    owned
        .directives
        .extend(ManagedDirectives::new(new_directives).directives);

    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + new_directives.len());
    for directive in new_directives {
        let directive = directive.trim();
        if !directive.is_empty() && !merged.iter().any(|line| line == directive) {
            merged.push(directive.to_string());
        }
    }

    for line in existing {
        let line: &str = line.as_ref();
        if !owned.owns(line) {
            merged.push(line.to_string());
        }
    }
    merged
}

/// Merge `new_directives` into a whole document
///
/// `existing` is `None` when the primary config does not exist yet.
pub fn merge_document(
    existing: Option<&str>,
    new_directives: &[String],
    managed: &ManagedDirectives,
) -> String {
    match existing {
        None => {
            let mut document = merge_lines::<&str>(&[], new_directives, managed).join("\n");
            document.push('\n');
            document
        }
        Some(text) => {
            let lines: Vec<&str> = text.split('\n').collect();
            merge_lines(&lines, new_directives, managed).join("\n")
        }
    }
}

/// Read, merge and write back the primary config at `path`
///
/// The file is replaced as a whole and left owner read/write only.
pub fn update_primary_config(
    path: &Path,
    new_directives: &[String],
    managed: &ManagedDirectives,
) -> Result<MergeOutcome, MergeError> {
    let existing = match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(MergeError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let merged = merge_document(existing.as_deref(), new_directives, managed);

    let outcome = match &existing {
        None => MergeOutcome::Created,
        Some(current) if *current == merged => MergeOutcome::Unchanged,
        Some(_) => MergeOutcome::Updated,
    };

    if outcome == MergeOutcome::Unchanged {
        debug!("Primary config {} already up to date", path.display());
        return Ok(outcome);
    }

    write_private_file(path, &merged)?;
    info!(
        "Primary config {} {:?} with: {}",
        path.display(),
        outcome,
        new_directives.join(", ")
    );
    Ok(outcome)
}
