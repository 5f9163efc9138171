// Copyright (c) 2025 - Cowboy AI, Inc.
//! Inventory Fetch Adapter
//!
//! Retrieves farm records for one environment. The inventory service answers
//! a plain `GET <endpoint>` with a JSON array:
//!
//! ```text
//! [
//!   { "name": "north-1", "ip": "10.250.1.1",
//!     "cages": [
//!       { "ip": "10.250.1.10",
//!         "labels": { "cage": "Cage One", "cage_processing_unit_id": "aa:bb:cc:dd:ee:ff" } }
//!     ] }
//! ]
//! ```
//!
//! Anything but a `200` with a decodable body is a [`FetchError`] for that
//! environment only.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Cage, EnvironmentSpec, Farm};

/// Errors fetching one environment's inventory
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Cannot build HTTP client: {0}")]
    Client(String),

    #[error("Inventory {endpoint} did not answer within {timeout_secs}s")]
    Timeout { endpoint: String, timeout_secs: u64 },

    #[error("Inventory {endpoint} unreachable: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Inventory {endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Inventory body is not a farm list: {0}")]
    Decode(String),

    #[error("No inventory available for environment '{0}'")]
    Unavailable(String),
}

/// Source of farm records for an environment
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// Fetch every farm of `environment`, in inventory order
    async fn fetch(&self, environment: &EnvironmentSpec) -> Result<Vec<Farm>, FetchError>;
}

#[derive(Debug, Deserialize)]
struct WireFarm {
    name: String,
    ip: String,
    #[serde(default)]
    cages: Option<Vec<WireCage>>,
}

#[derive(Debug, Deserialize)]
struct WireCage {
    ip: String,
    #[serde(default)]
    labels: Option<WireLabels>,
}

#[derive(Debug, Default, Deserialize)]
struct WireLabels {
    #[serde(default)]
    cage: Option<String>,
    #[serde(default)]
    cage_processing_unit_id: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<WireCage> for Cage {
    fn from(wire: WireCage) -> Self {
        let labels = wire.labels.unwrap_or_default();
        Cage {
            address: wire.ip,
            label: non_empty(labels.cage),
            unit_id: non_empty(labels.cage_processing_unit_id),
        }
    }
}

impl From<WireFarm> for Farm {
    fn from(wire: WireFarm) -> Self {
        Farm {
            name: wire.name,
            address: wire.ip,
            cages: wire
                .cages
                .unwrap_or_default()
                .into_iter()
                .map(Cage::from)
                .collect(),
        }
    }
}

/// Decode an inventory response body
pub fn decode_inventory(body: &[u8]) -> Result<Vec<Farm>, FetchError> {
    let wire: Vec<WireFarm> =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(wire.into_iter().map(Farm::from).collect())
}

/// Inventory fetched over HTTP with a fixed deadline
pub struct HttpInventory {
    client: Client,
    timeout: Duration,
}

impl HttpInventory {
    /// Create a fetcher whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl InventorySource for HttpInventory {
    async fn fetch(&self, environment: &EnvironmentSpec) -> Result<Vec<Farm>, FetchError> {
        let endpoint = environment.endpoint.as_str();
        debug!("Fetching inventory for {} from {}", environment.name, endpoint);

        let transport_err = |e: reqwest::Error| {
            if e.is_timeout() {
                FetchError::Timeout {
                    endpoint: endpoint.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::Transport {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        let response = self.client.get(endpoint).send().await.map_err(transport_err)?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport_err)?;
        let farms = decode_inventory(&body)?;
        info!("Fetched {} farms for {}", farms.len(), environment.name);
        Ok(farms)
    }
}

/// Inventory held in memory, keyed by environment name
///
/// Environments without an entry fail with [`FetchError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct StaticInventory {
    farms: BTreeMap<String, Vec<Farm>>,
}

impl StaticInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_environment(mut self, name: impl Into<String>, farms: Vec<Farm>) -> Self {
        self.farms.insert(name.into(), farms);
        self
    }
}

#[async_trait]
impl InventorySource for StaticInventory {
    async fn fetch(&self, environment: &EnvironmentSpec) -> Result<Vec<Farm>, FetchError> {
        self.farms
            .get(&environment.name)
            .cloned()
            .ok_or_else(|| FetchError::Unavailable(environment.name.clone()))
    }
}
