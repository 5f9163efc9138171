// Copyright (c) 2025 - Cowboy AI, Inc.
//! Network Attachment Detection
//!
//! Produces the set of [`NetworkTag`]s for the private networks the caller is
//! currently attached to. Selection only ever sees the tags.
//!
//! [`RouteProbe`] asks the OS which local address it would use to reach each
//! environment's inventory host (a connected UDP socket sends nothing), then
//! classifies those addresses against the configured prefixes. A VPN that
//! hands out `10.251.x.y` and routes the inventory network shows up as a
//! local address starting with `10.251.`.
//!
//! Only the route towards the inventory host is inspected, not every local
//! interface: a split-tunnel VPN that holds a `10.251.` address without
//! routing the inventory host is reported as not attached. Set
//! `CAGE_SSH_NETWORKS` for such setups.

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use thiserror::Error;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{debug, info};

use crate::domain::{EnvironmentSpec, NetworkTag};

/// Port assumed when an endpoint does not name one
const DEFAULT_HTTP_PORT: u16 = 80;

/// Errors determining the attached networks
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No environment defines address prefixes to detect")]
    NoProbeTargets,
}

/// Source of the attached network tags
#[async_trait]
pub trait NetworkProbe: Send + Sync {
    async fn detect(&self) -> Result<BTreeSet<NetworkTag>, DiscoveryError>;
}

/// Fixed tag set, for operator overrides and tests
#[derive(Debug, Clone, Default)]
pub struct StaticProbe {
    tags: BTreeSet<NetworkTag>,
}

impl StaticProbe {
    pub fn new<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<NetworkTag>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<BTreeSet<NetworkTag>> for StaticProbe {
    fn from(tags: BTreeSet<NetworkTag>) -> Self {
        Self { tags }
    }
}

#[async_trait]
impl NetworkProbe for StaticProbe {
    async fn detect(&self) -> Result<BTreeSet<NetworkTag>, DiscoveryError> {
        Ok(self.tags.clone())
    }
}

/// Detects attachment from the local addresses routed towards each inventory
#[derive(Debug, Clone)]
pub struct RouteProbe {
    environments: Vec<EnvironmentSpec>,
}

impl RouteProbe {
    pub fn new(environments: Vec<EnvironmentSpec>) -> Self {
        Self { environments }
    }

    /// Local address the OS would use to reach `authority`
    async fn route_source(authority: &str) -> std::io::Result<Option<IpAddr>> {
        let target = if authority.contains(':') && !authority.ends_with(']') {
            authority.to_string()
        } else {
            format!("{authority}:{DEFAULT_HTTP_PORT}")
        };

        let Some(remote) = lookup_host(target).await?.next() else {
            return Ok(None);
        };

        let bind: SocketAddr = match remote {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind).await?;
        socket.connect(remote).await?;
        Ok(Some(socket.local_addr()?.ip()))
    }
}

#[async_trait]
impl NetworkProbe for RouteProbe {
    async fn detect(&self) -> Result<BTreeSet<NetworkTag>, DiscoveryError> {
        let targets: Vec<&EnvironmentSpec> = self
            .environments
            .iter()
            .filter(|env| !env.address_prefixes.is_empty())
            .collect();
        if targets.is_empty() {
            return Err(DiscoveryError::NoProbeTargets);
        }

        let mut addresses = BTreeSet::new();
        for env in targets {
            let Some(authority) = env.endpoint_authority() else {
                debug!("Environment {} has no probeable endpoint", env.name);
                continue;
            };
            match Self::route_source(authority).await {
                Ok(Some(address)) => {
                    debug!("Route to {} leaves from {}", authority, address);
                    addresses.insert(address);
                }
                Ok(None) => debug!("{} did not resolve", authority),
                // No route usually just means the network is not attached
                Err(e) => debug!("No route to {}: {}", authority, e),
            }
        }

        let tags = classify_addresses(&addresses, &self.environments);
        info!(
            "Detected networks: [{}]",
            tags.iter().map(NetworkTag::as_str).collect::<Vec<_>>().join(", ")
        );
        Ok(tags)
    }
}

/// Tags of every environment with a prefix matching one of `addresses`
pub fn classify_addresses<'a, I>(addresses: I, environments: &[EnvironmentSpec]) -> BTreeSet<NetworkTag>
where
    I: IntoIterator<Item = &'a IpAddr>,
{
    let rendered: Vec<String> = addresses.into_iter().map(IpAddr::to_string).collect();

    environments
        .iter()
        .filter(|env| {
            env.address_prefixes.iter().any(|prefix| {
                rendered
                    .iter()
                    .any(|address| address.starts_with(prefix.as_str()))
            })
        })
        .map(|env| env.network_tag.clone())
        .collect()
}
