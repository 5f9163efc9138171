// Copyright (c) 2025 - Cowboy AI, Inc.
//! Host Alias Derivation
//!
//! Turns farm and cage records into the short identifiers used as `Host`
//! patterns in generated SSH configuration.
//!
//! # Rules
//!
//! ```text
//! farm alias = <farm.name>-farm
//! cage alias = <farm alias>-cage-<discriminator>
//! ```
//!
//! The discriminator comes from the first source that yields something:
//!
//! 1. **Label** - trimmed, whitespace replaced by `-`, lowercased
//! 2. **Unit id** - last three non-empty `:` segments joined by `-`,
//!    lowercased
//! 3. **Short unit id** - every non-empty segment joined by `-`, lowercased
//! 4. **Missing** - [`MISSING_DISCRIMINATOR`] followed by the cage address
//!    with every non-alphanumeric character replaced by `-`
//!
//! Any character that is not alphanumeric, `.`, `_` or `-` becomes `-`, so a
//! discriminator is always a single SSH host pattern token.
//!
//! Derivation is total: it never fails and never yields an empty alias.
//! [`validate_cage_identity`] reports the records that needed rule 3 or 4.
//! [`cage_aliases`] additionally keeps aliases unique within one farm by
//! suffixing repeats with `-2`, `-3`, ... in cage order.

use std::collections::HashSet;
use thiserror::Error;

use super::farm::Cage;

/// Suffix appended to every farm name
pub const FARM_SUFFIX: &str = "-farm";

/// Infix between a farm alias and a cage discriminator
pub const CAGE_INFIX: &str = "-cage-";

/// Number of trailing unit id segments that identify a cage
pub const UNIT_ID_SEGMENTS: usize = 3;

/// Discriminator prefix used when a cage has neither a label nor a unit id
pub const MISSING_DISCRIMINATOR: &str = "unknown";

/// Malformed cage identity
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AliasError {
    #[error("Cage has no label and unit id '{unit_id}' has {segments} segment(s), expected at least 3")]
    ShortUnitId { unit_id: String, segments: usize },

    #[error("Cage has neither a label nor a unit id")]
    MissingIdentity,
}

/// Where a cage discriminator was taken from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscriminatorSource {
    Label,
    UnitId,
    ShortUnitId,
    Missing,
}

impl DiscriminatorSource {
    /// Whether the record followed a fallback rule rather than a primary one
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::ShortUnitId | Self::Missing)
    }
}

/// A derived cage discriminator and its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CageDiscriminator {
    pub value: String,
    pub source: DiscriminatorSource,
}

/// Derive the alias of a farm from its name
///
/// The name is taken as already alias-safe; case is preserved.
pub fn derive_farm_alias(name: &str) -> String {
    format!("{name}{FARM_SUFFIX}")
}

/// Derive the alias of a cage within the farm aliased `farm_alias`
pub fn derive_cage_alias(farm_alias: &str, cage: &Cage) -> String {
    let discriminator = cage_discriminator(cage);
    format!("{farm_alias}{CAGE_INFIX}{}", discriminator.value)
}

/// Wildcard pattern matching every cage alias of a farm
pub fn cage_wildcard(farm_alias: &str) -> String {
    format!("{farm_alias}{CAGE_INFIX}*")
}

/// Compute the discriminator for a cage following the rules in the module docs
pub fn cage_discriminator(cage: &Cage) -> CageDiscriminator {
    if let Some(label) = cage.trimmed_label() {
        return CageDiscriminator {
            value: normalize(label),
            source: DiscriminatorSource::Label,
        };
    }

    let segments = unit_id_segments(cage);

    if segments.len() >= UNIT_ID_SEGMENTS {
        let tail = &segments[segments.len() - UNIT_ID_SEGMENTS..];
        return CageDiscriminator {
            value: normalize(&tail.join("-")),
            source: DiscriminatorSource::UnitId,
        };
    }

    if segments.is_empty() {
        let address = address_token(&cage.address);
        let value = if address.is_empty() {
            MISSING_DISCRIMINATOR.to_string()
        } else {
            format!("{MISSING_DISCRIMINATOR}-{address}")
        };
        CageDiscriminator {
            value,
            source: DiscriminatorSource::Missing,
        }
    } else {
        CageDiscriminator {
            value: normalize(&segments.join("-")),
            source: DiscriminatorSource::ShortUnitId,
        }
    }
}

/// Aliases for `cages` of the farm aliased `farm_alias`, unique within the farm
///
/// A repeated alias gets the first free `-<n>` suffix, starting at 2.
pub fn cage_aliases<'a, I>(farm_alias: &str, cages: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Cage>,
{
    let mut seen = HashSet::new();
    let mut aliases = Vec::new();

    for cage in cages {
        let base = derive_cage_alias(farm_alias, cage);
        let mut alias = base.clone();
        let mut n = 2;
        while seen.contains(&alias) {
            alias = format!("{base}-{n}");
            n += 1;
        }
        seen.insert(alias.clone());
        aliases.push(alias);
    }
    aliases
}

/// Strict check of a cage's identity
///
/// Alias derivation never needs this; it exists so callers can report
/// records that fell back to a degraded discriminator.
pub fn validate_cage_identity(cage: &Cage) -> Result<(), AliasError> {
    if cage.trimmed_label().is_some() {
        return Ok(());
    }

    let segments = unit_id_segments(cage).len();
    match cage.unit_id.as_deref().map(str::trim) {
        _ if segments >= UNIT_ID_SEGMENTS => Ok(()),
        Some(unit_id) if segments > 0 => Err(AliasError::ShortUnitId {
            unit_id: unit_id.to_string(),
            segments,
        }),
        _ => Err(AliasError::MissingIdentity),
    }
}

/// Non-empty, trimmed `:` segments of the unit id
fn unit_id_segments(cage: &Cage) -> Vec<&str> {
    cage.unit_id
        .as_deref()
        .unwrap_or_default()
        .split(':')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Lowercase, with anything but alphanumerics, `.`, `_` and `-` replaced by `-`
fn normalize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect::<String>()
        .to_lowercase()
}

/// Cage address as a discriminator: alphanumerics kept, the rest `-`
fn address_token(address: &str) -> String {
    let token: String = address
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    token.trim_matches('-').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farm_alias_keeps_case() {
        assert_eq!(derive_farm_alias("North-1"), "North-1-farm");
    }

    #[test]
    fn test_label_is_trimmed_hyphenated_lowercased() {
        let cage = Cage::labeled("10.0.0.2", " Cage One ");
        assert_eq!(derive_cage_alias("n1-farm", &cage), "n1-farm-cage-cage-one");
    }

    #[test]
    fn test_unit_id_uses_last_three_segments() {
        let cage = Cage::with_unit_id("10.0.0.2", "aa:bb:cc:DD:ee:FF");
        let discriminator = cage_discriminator(&cage);
        assert_eq!(discriminator.value, "dd-ee-ff");
        assert_eq!(discriminator.source, DiscriminatorSource::UnitId);
    }

    #[test]
    fn test_blank_label_falls_through_to_unit_id() {
        let cage = Cage {
            address: "10.0.0.2".to_string(),
            label: Some("  ".to_string()),
            unit_id: Some("aa:bb:cc:dd".to_string()),
        };
        assert_eq!(derive_cage_alias("x-farm", &cage), "x-farm-cage-bb-cc-dd");
    }

    #[test]
    fn test_short_unit_id_uses_available_segments() {
        let cage = Cage::with_unit_id("10.0.0.2", "AB:cd");
        let discriminator = cage_discriminator(&cage);
        assert_eq!(discriminator.value, "ab-cd");
        assert!(discriminator.source.is_fallback());
        assert!(matches!(
            validate_cage_identity(&cage),
            Err(AliasError::ShortUnitId { segments: 2, .. })
        ));
    }

    #[test]
    fn test_missing_identity_is_never_empty() {
        let cage = Cage {
            address: "10.0.0.2".to_string(),
            label: None,
            unit_id: None,
        };
        assert_eq!(derive_cage_alias("x-farm", &cage), "x-farm-cage-unknown-10-0-0-2");
        assert_eq!(validate_cage_identity(&cage), Err(AliasError::MissingIdentity));

        let nothing = Cage {
            address: String::new(),
            ..cage
        };
        assert_eq!(cage_discriminator(&nothing).value, "unknown");
    }

    #[test]
    fn test_empty_unit_id_segments_are_ignored() {
        let separators = Cage::with_unit_id("10.0.0.2", "::");
        assert_eq!(cage_discriminator(&separators).source, DiscriminatorSource::Missing);
        assert_eq!(validate_cage_identity(&separators), Err(AliasError::MissingIdentity));

        let trailing = Cage::with_unit_id("10.0.0.2", "aa::");
        let discriminator = cage_discriminator(&trailing);
        assert_eq!(discriminator.value, "aa");
        assert_eq!(discriminator.source, DiscriminatorSource::ShortUnitId);
        assert!(matches!(
            validate_cage_identity(&trailing),
            Err(AliasError::ShortUnitId { segments: 1, .. })
        ));

        let gappy = Cage::with_unit_id("10.0.0.2", "aa:bb::cc:");
        assert_eq!(cage_discriminator(&gappy).value, "aa-bb-cc");
        assert_eq!(validate_cage_identity(&gappy), Ok(()));
    }

    #[test]
    fn test_label_cannot_smuggle_pattern_characters() {
        let cage = Cage::labeled("10.0.0.2", "a,b*\nc");
        assert_eq!(cage_discriminator(&cage).value, "a-b--c");
    }

    #[test]
    fn test_cages_without_identity_get_distinct_aliases() {
        let cages = [
            Cage {
                address: "10.0.0.2".to_string(),
                label: None,
                unit_id: None,
            },
            Cage::with_unit_id("10.0.0.3", ":"),
        ];
        assert_eq!(
            cage_aliases("a-farm", &cages),
            vec!["a-farm-cage-unknown-10-0-0-2", "a-farm-cage-unknown-10-0-0-3"]
        );
    }

    #[test]
    fn test_repeated_aliases_are_suffixed() {
        let cages = [
            Cage::labeled("10.0.0.2", "one"),
            Cage::labeled("10.0.0.3", "One"),
            Cage::labeled("10.0.0.4", "one-2"),
            Cage::labeled("10.0.0.5", "one"),
        ];
        assert_eq!(
            cage_aliases("a-farm", &cages),
            vec![
                "a-farm-cage-one",
                "a-farm-cage-one-2",
                "a-farm-cage-one-2-2",
                "a-farm-cage-one-3",
            ]
        );
    }

    #[test]
    fn test_wildcard_matches_cage_prefix() {
        assert_eq!(cage_wildcard("x-farm"), "x-farm-cage-*");
    }
}
