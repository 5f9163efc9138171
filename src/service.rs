// Copyright (c) 2025 - Cowboy AI, Inc.
//! Run Orchestration
//!
//! One run, start to finish:
//!
//! ```text
//! NetworkProbe ──tags──> select_environments
//!                              │ (per environment, sequentially)
//!                              ▼
//!            InventorySource::fetch ──> write_farm_files ──> write_index_file
//!                              │
//!                              ▼ directives of successful environments
//!                     update_primary_config (once)
//! ```
//!
//! Environments are isolated from each other: a fetch or directory failure
//! skips that environment and the others carry on. The primary config is
//! merged exactly once, after every environment has finished, and only when
//! at least one environment produced its directive.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::adapters::{FetchError, InventorySource, NetworkProbe};
use crate::config::Config;
use crate::domain::{validate_cage_identity, EnvironmentSpec, Farm, NetworkTag};
use crate::errors::CageSshError;
use crate::materialize::{write_farm_files, write_index_file, FarmWrite};
use crate::merge::{update_primary_config, ManagedDirectives, MergeOutcome};
use crate::selection::{select_environments, Selection};

/// What happened to one environment
#[derive(Debug)]
pub struct EnvironmentReport {
    pub name: String,
    pub output_dir: PathBuf,
    pub directive: String,

    /// Per-farm write results, in inventory order
    pub farms: Vec<FarmWrite>,

    /// Cages whose alias came from a fallback rule
    pub degraded_cages: usize,

    /// Cages left out of their farm's file because their address is unsafe
    pub rejected_cages: usize,

    /// Set when the environment as a whole was skipped
    pub failure: Option<CageSshError>,
}

impl EnvironmentReport {
    fn new(env: &EnvironmentSpec, config: &Config) -> Self {
        Self {
            name: env.name.clone(),
            output_dir: env.output_dir_in(&config.ssh_dir),
            directive: env.directive.clone(),
            farms: Vec::new(),
            degraded_cages: 0,
            rejected_cages: 0,
            failure: None,
        }
    }

    /// Whether this environment's directive belongs in the primary config
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn written(&self) -> usize {
        self.farms.iter().filter(|write| write.is_ok()).count()
    }

    pub fn failed_farms(&self) -> impl Iterator<Item = &FarmWrite> {
        self.farms.iter().filter(|write| !write.is_ok())
    }

    pub fn error_count(&self) -> usize {
        self.failed_farms().count() + self.rejected_cages + usize::from(self.failure.is_some())
    }
}

/// What happened to the primary config
#[derive(Debug)]
pub enum MergeReport {
    /// No environment succeeded, so existing directives were left alone
    Skipped,
    Done(MergeOutcome),
    Failed(CageSshError),
}

/// Outcome of a whole run
#[derive(Debug)]
pub enum RunReport {
    /// Attached networks could not be determined; nothing was touched
    DiscoveryFailed(CageSshError),

    /// No configured environment is attached; nothing was touched
    NothingToDo { ignored: Vec<NetworkTag> },

    Completed {
        environments: Vec<EnvironmentReport>,
        merge: MergeReport,
    },
}

impl RunReport {
    /// Number of failures an operator should look at
    pub fn error_count(&self) -> usize {
        match self {
            RunReport::DiscoveryFailed(_) => 1,
            RunReport::NothingToDo { .. } => 0,
            RunReport::Completed {
                environments,
                merge,
            } => {
                let env_errors: usize = environments.iter().map(EnvironmentReport::error_count).sum();
                env_errors + usize::from(matches!(merge, MergeReport::Failed(_)))
            }
        }
    }

    pub fn is_clean(&self) -> bool {
        self.error_count() == 0
    }

    /// Directives placed in the primary config by this run
    pub fn directives(&self) -> Vec<&str> {
        match self {
            RunReport::Completed { environments, .. } => environments
                .iter()
                .filter(|env| env.succeeded())
                .map(|env| env.directive.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunReport::DiscoveryFailed(e) => writeln!(f, "{e}"),
            RunReport::NothingToDo { ignored } if ignored.is_empty() => {
                writeln!(f, "No attached network matches a configured environment.")
            }
            RunReport::NothingToDo { ignored } => {
                let tags: Vec<&str> = ignored.iter().map(NetworkTag::as_str).collect();
                writeln!(
                    f,
                    "No attached network matches a configured environment (ignored: {}).",
                    tags.join(", ")
                )
            }
            RunReport::Completed {
                environments,
                merge,
            } => {
                for env in environments {
                    match &env.failure {
                        Some(e) => writeln!(f, "{}: skipped: {}", env.name, e)?,
                        None => writeln!(
                            f,
                            "{}: {} of {} farm files written to {}",
                            env.name,
                            env.written(),
                            env.farms.len(),
                            env.output_dir.display()
                        )?,
                    }
                    if env.rejected_cages > 0 {
                        writeln!(
                            f,
                            "{}:   {} cage(s) skipped: unsafe address",
                            env.name, env.rejected_cages
                        )?;
                    }
                    for write in env.failed_farms() {
                        if let Err(e) = &write.result {
                            writeln!(f, "{}:   farm {}: {}", env.name, write.farm, e)?;
                        }
                    }
                }
                match merge {
                    MergeReport::Skipped => {
                        writeln!(f, "Primary config left unchanged: no environment succeeded.")
                    }
                    MergeReport::Done(MergeOutcome::Unchanged) => {
                        writeln!(f, "Primary config already up to date.")
                    }
                    MergeReport::Done(_) => writeln!(
                        f,
                        "Primary config updated with: {}",
                        self.directives().join(", ")
                    ),
                    MergeReport::Failed(e) => writeln!(f, "{e}"),
                }
            }
        }
    }
}

/// Drives one run against a probe and an inventory source
pub struct SyncService<P, S> {
    config: Config,
    probe: P,
    inventory: S,
}

impl<P, S> SyncService<P, S>
where
    P: NetworkProbe,
    S: InventorySource,
{
    pub fn new(config: Config, probe: P, inventory: S) -> Self {
        Self {
            config,
            probe,
            inventory,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run detection, generation and the primary config merge
    pub async fn run(&self) -> RunReport {
        let detected: BTreeSet<NetworkTag> = match self.probe.detect().await {
            Ok(tags) => tags,
            Err(e) => {
                error!("Network discovery failed: {}", e);
                return RunReport::DiscoveryFailed(e.into());
            }
        };

        let active = match select_environments(&detected, &self.config.environments) {
            Selection::Active(active) => active,
            Selection::NothingToDo { ignored } => {
                info!("No attached network matches a configured environment");
                return RunReport::NothingToDo { ignored };
            }
        };

        let mut environments = Vec::with_capacity(active.len());
        for env in active {
            environments.push(self.process_environment(env).await);
        }

        let merge = self.merge(&environments);
        RunReport::Completed {
            environments,
            merge,
        }
    }

    /// Fetch and materialize one environment
    async fn process_environment(&self, env: &EnvironmentSpec) -> EnvironmentReport {
        info!("Processing environment {}", env);
        let mut report = EnvironmentReport::new(env, &self.config);

        let farms = match self.fetch(env).await {
            Ok(farms) => farms,
            Err(e) => {
                warn!("Skipping {}: {}", env.name, e);
                report.failure = Some(e.into());
                return report;
            }
        };

        report.degraded_cages = count_degraded_cages(&farms);
        report.rejected_cages = count_rejected_cages(&farms);

        match write_farm_files(&report.output_dir, &farms) {
            Ok(writes) => report.farms = writes,
            Err(e) => {
                error!("Skipping {}: {}", env.name, e);
                report.failure = Some(e.into());
                return report;
            }
        }

        if let Some(index) = env.index_file_in(&self.config.ssh_dir) {
            if let Err(e) = write_index_file(&index, &report.output_dir) {
                error!("Skipping {}: {}", env.name, e);
                report.failure = Some(e.into());
                return report;
            }
        }

        info!(
            "Generated {} of {} farm files for {} in {}",
            report.written(),
            farms.len(),
            env.name,
            report.output_dir.display()
        );
        report
    }

    /// Fetch with the configured deadline, whatever the source
    async fn fetch(&self, env: &EnvironmentSpec) -> Result<Vec<Farm>, FetchError> {
        let timeout = self.config.timeout();
        match tokio::time::timeout(timeout, self.inventory.fetch(env)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                endpoint: env.endpoint.clone(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Reconcile the primary config with every successful directive at once
    fn merge(&self, environments: &[EnvironmentReport]) -> MergeReport {
        let directives: Vec<String> = environments
            .iter()
            .filter(|env| env.succeeded())
            .map(|env| env.directive.clone())
            .collect();

        if directives.is_empty() {
            warn!("No environment succeeded; primary config left untouched");
            return MergeReport::Skipped;
        }

        let managed = ManagedDirectives::from_environments(&self.config.environments);
        match update_primary_config(&self.config.primary_config_path(), &directives, &managed) {
            Ok(outcome) => MergeReport::Done(outcome),
            Err(e) => {
                error!("{}", e);
                MergeReport::Failed(e.into())
            }
        }
    }
}

/// Count cages that needed a fallback alias, logging each one
fn count_degraded_cages(farms: &[Farm]) -> usize {
    let mut degraded = 0;
    for farm in farms {
        for cage in &farm.cages {
            if let Err(e) = validate_cage_identity(cage) {
                warn!("Farm {} cage {:?}: {}", farm.name, cage.address, e);
                degraded += 1;
            }
        }
    }
    degraded
}

/// Count cages rendering will leave out, logging each one
fn count_rejected_cages(farms: &[Farm]) -> usize {
    let mut rejected = 0;
    // Cages of a rejected farm are covered by the farm's own failure
    for farm in farms.iter().filter(|farm| farm.validate().is_ok()) {
        for (cage, e) in farm.rejected_cages() {
            warn!("Farm {} cage {:?}: {}", farm.name, cage.address, e);
            rejected += 1;
        }
    }
    rejected
}
