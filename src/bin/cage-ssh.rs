// Copyright (c) 2025 - Cowboy AI, Inc.
//! cage-ssh
//!
//! Regenerates SSH config for every farm in the environments whose private
//! network is attached, then updates `~/.ssh/config` to include them.
//!
//! Run with: cargo run --bin cage-ssh
//!
//! Configuration comes from environment variables (see [`cage_ssh::config`]):
//! `CAGE_SSH_CONFIG`, `CAGE_SSH_DIR`, `CAGE_SSH_TIMEOUT_SECS`,
//! `CAGE_SSH_NETWORKS`. Log verbosity follows `RUST_LOG`.

use anyhow::{Context, Result};
use cage_ssh::adapters::{HttpInventory, NetworkProbe, RouteProbe, StaticProbe};
use cage_ssh::{Config, RunReport, SyncService};
use std::process::ExitCode;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("SSH directory: {}", config.ssh_dir.display());

    let inventory =
        HttpInventory::new(config.timeout()).context("Failed to create inventory client")?;

    let report = match config.networks.clone() {
        Some(tags) => {
            info!("Using configured networks instead of detection");
            run(config, StaticProbe::from(tags), inventory).await
        }
        None => {
            let probe = RouteProbe::new(config.environments.clone());
            run(config, probe, inventory).await
        }
    };

    print!("{report}");

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

async fn run<P: NetworkProbe>(config: Config, probe: P, inventory: HttpInventory) -> RunReport {
    SyncService::new(config, probe, inventory).run().await
}
