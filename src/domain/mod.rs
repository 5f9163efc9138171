// Copyright (c) 2025 - Cowboy AI, Inc.
//! Topology Domain Models
//!
//! Plain values describing what the inventory service reports and how it is
//! named in SSH configuration. Nothing in here performs I/O.
//!
//! - [`Farm`] / [`Cage`] - inventory records
//! - [`EnvironmentSpec`] / [`NetworkTag`] - the environment table
//! - [`alias`] - deterministic host alias derivation

pub mod alias;
pub mod environment;
pub mod farm;

pub use alias::{
    cage_aliases, cage_discriminator, derive_cage_alias, derive_farm_alias,
    validate_cage_identity, AliasError, CageDiscriminator, DiscriminatorSource,
};
pub use environment::{EnvironmentSpec, NetworkTag};
pub use farm::{validate_address, validate_farm_name, Cage, Farm, RecordError};
