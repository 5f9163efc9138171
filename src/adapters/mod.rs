// Copyright (c) 2025 - Cowboy AI, Inc.

//! External collaborators
//!
//! Adapters for the two things the core never does itself: finding out which
//! private networks are attached, and fetching an environment's inventory.

pub mod inventory;
pub mod network;

pub use inventory::{decode_inventory, FetchError, HttpInventory, InventorySource, StaticInventory};
pub use network::{classify_addresses, DiscoveryError, NetworkProbe, RouteProbe, StaticProbe};
