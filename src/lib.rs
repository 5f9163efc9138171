//! Farm and cage topology compiled into SSH client configuration
//!
//! Discovers farms (jump hosts) and their cages from an inventory service and
//! writes one SSH config file per farm, then pulls the generated files into
//! the user's primary SSH config through an `Include` directive. Which
//! environments run depends on which private networks are attached.
//!
//! # Layout
//!
//! - [`domain`] - farm/cage records, environment table rows, alias rules
//! - [`render`] - farm record to SSH config text
//! - [`selection`] - detected network tags to environments
//! - [`materialize`] - owner-only farm files on disk
//! - [`merge`] - idempotent `Include` merge into the primary config
//! - [`adapters`] - network detection and inventory fetch
//! - [`service`] - one full run with per-environment isolation

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod materialize;
pub mod merge;
pub mod render;
pub mod selection;
pub mod service;

// Re-export commonly used types
pub use config::{Config, ConfigError};
pub use domain::{Cage, EnvironmentSpec, Farm, NetworkTag};
pub use errors::{CageSshError, CageSshResult};
pub use materialize::write_farm_files;
pub use merge::{merge_document, update_primary_config, ManagedDirectives, MergeOutcome};
pub use render::render_farm_block;
pub use selection::{select_environments, Selection};
pub use service::{RunReport, SyncService};
