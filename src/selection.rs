// Copyright (c) 2025 - Cowboy AI, Inc.
//! Environment Selection
//!
//! Maps detected network tags onto the configured environment table. Several
//! environments may be active at once; each is processed independently.
//!
//! Order follows the table, never the tag set, so the directives merged into
//! the primary config are stable between runs.

use std::collections::BTreeSet;

use crate::domain::{EnvironmentSpec, NetworkTag};

/// Outcome of environment selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Environments to process, in table order
    Active(Vec<&'a EnvironmentSpec>),

    /// No configured environment is attached; the run ends without touching
    /// any file. `ignored` lists detected tags the table does not know.
    NothingToDo { ignored: Vec<NetworkTag> },
}

impl<'a> Selection<'a> {
    pub fn environments(&self) -> &[&'a EnvironmentSpec] {
        match self {
            Selection::Active(environments) => environments,
            Selection::NothingToDo { .. } => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.environments().is_empty()
    }
}

/// Select the environments whose network tag was detected
///
/// Unknown tags are ignored rather than treated as errors.
pub fn select_environments<'a>(
    detected: &BTreeSet<NetworkTag>,
    table: &'a [EnvironmentSpec],
) -> Selection<'a> {
    let active: Vec<&EnvironmentSpec> = table
        .iter()
        .filter(|env| detected.contains(&env.network_tag))
        .collect();

    if active.is_empty() {
        let ignored = detected.iter().cloned().collect();
        return Selection::NothingToDo { ignored };
    }

    Selection::Active(active)
}
