// Copyright (c) 2025 - Cowboy AI, Inc.
//! SSH Config Block Rendering
//!
//! Pure projection of one [`Farm`] into the text of its SSH config file:
//!
//! ```text
//! Host alpha-farm
//!     HostName 10.0.0.1
//!
//! Host alpha-farm-cage-*
//!     ProxyJump alpha-farm
//!
//! Host alpha-farm-cage-one
//!     HostName 10.0.1.1
//! ```
//!
//! Stanzas are separated by exactly one blank line and emitted in inventory
//! order, so identical input always renders identical bytes.
//!
//! A farm whose name or address fails [`Farm::validate`] is not rendered at
//! all. Cages with an unsafe address are left out; [`Farm::rejected_cages`]
//! lists them. Every emitted line is therefore either `Host <token>` or an
//! indented `<keyword> <token>`.

use crate::domain::alias::{cage_aliases, cage_wildcard, derive_farm_alias};
use crate::domain::{Farm, RecordError};

/// Indentation of option lines inside a `Host` stanza
const INDENT: &str = "    ";

/// Render the SSH config file for `farm`
pub fn render_farm_block(farm: &Farm) -> Result<String, RecordError> {
    farm.validate()?;

    let farm_alias = derive_farm_alias(&farm.name);
    let mut stanzas = vec![stanza(&farm_alias, "HostName", &farm.address)];

    let cages: Vec<_> = farm.renderable_cages().collect();
    if !cages.is_empty() {
        stanzas.push(stanza(&cage_wildcard(&farm_alias), "ProxyJump", &farm_alias));

        let aliases = cage_aliases(&farm_alias, cages.iter().copied());
        for (cage, cage_alias) in cages.iter().zip(&aliases) {
            stanzas.push(stanza(cage_alias, "HostName", &cage.address));
        }
    }

    Ok(stanzas.join("\n"))
}

fn stanza(pattern: &str, keyword: &str, value: &str) -> String {
    format!("Host {pattern}\n{INDENT}{keyword} {value}\n")
}
