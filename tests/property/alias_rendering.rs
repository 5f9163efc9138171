// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Alias Derivation and Rendering
//!
//! Alias derivation is total and deterministic; rendering emits exactly one
//! stanza per host, never repeats a cage alias within a farm, and never lets
//! an inventory field add a line or a second token to the output.

use cage_ssh::domain::alias::{cage_discriminator, derive_cage_alias, derive_farm_alias};
use cage_ssh::{render_farm_block, Cage, Farm};
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Labels with at least one visible character, padded with spaces
fn visible_label() -> impl Strategy<Value = String> {
    ("[ ]{0,3}", "[A-Za-z0-9][A-Za-z0-9 ]{0,15}", "[ ]{0,3}")
        .prop_map(|(lead, body, trail)| format!("{lead}{body}{trail}"))
}

/// Colon-delimited hex unit ids with at least three groups
fn unit_id() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[0-9a-fA-F]{2}", 3..8)
}

fn ipv4() -> impl Strategy<Value = String> {
    "10\\.[0-9]{1,3}\\.[0-9]{1,3}\\.[0-9]{1,3}"
}

/// Printable text mixed with whitespace and control characters
fn hostile_text() -> impl Strategy<Value = String> {
    "[ -~\t\n\r\u{7f}]{0,16}"
}

/// Addresses as they may arrive over the wire, mostly well-formed
fn wire_address() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => ipv4(),
        1 => hostile_text(),
        1 => ipv4().prop_map(|ip| format!("{ip}\n    ProxyCommand sh -c id")),
    ]
}

/// Cages with arbitrary, possibly malformed identity fields
fn any_cage() -> impl Strategy<Value = Cage> {
    (
        wire_address(),
        prop::option::of(prop_oneof![
            3 => "[ -~\t]{0,12}",
            1 => "[ab ]{0,3}",
        ]),
        prop::option::of(prop_oneof![
            3 => "[ -~\t]{0,20}",
            1 => "[a:]{0,5}",
        ]),
    )
        .prop_map(|(address, label, unit_id)| Cage {
            address,
            label,
            unit_id,
        })
}

/// Farms whose own name and address are safe; cages may be anything
fn safe_farm() -> impl Strategy<Value = Farm> {
    (
        "[a-z][a-z0-9._-]{0,12}",
        ipv4(),
        prop::collection::vec(any_cage(), 0..8),
    )
        .prop_map(|(name, address, cages)| Farm {
            name,
            address,
            cages,
        })
}

/// Farms exactly as an untrusted inventory could report them
fn any_farm() -> impl Strategy<Value = Farm> {
    (
        prop_oneof![
            3 => "[a-z][a-z0-9._-]{0,12}",
            2 => hostile_text(),
            1 => Just("../prod".to_string()),
            1 => Just("/x".to_string()),
        ],
        wire_address(),
        prop::collection::vec(any_cage(), 0..6),
    )
        .prop_map(|(name, address, cages)| Farm {
            name,
            address,
            cages,
        })
}

fn is_unsafe(c: char) -> bool {
    c.is_whitespace() || c.is_control()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: A visible label always becomes the discriminator
    ///
    /// Trimmed, whitespace replaced with hyphens, lowercased.
    #[test]
    fn prop_label_discriminator(label in visible_label()) {
        let cage = Cage::labeled("10.0.0.2", label.clone());
        let expected = label.trim().replace(' ', "-").to_lowercase();

        prop_assert_eq!(
            derive_cage_alias("f-farm", &cage),
            format!("f-farm-cage-{expected}")
        );
    }

    /// Property: Without a label, the last three unit id groups are used
    #[test]
    fn prop_unit_id_discriminator(groups in unit_id()) {
        let cage = Cage::with_unit_id("10.0.0.2", groups.join(":"));
        let expected = groups[groups.len() - 3..].join("-").to_lowercase();

        prop_assert_eq!(cage_discriminator(&cage).value, expected);
    }

    /// Property: Derivation is total
    ///
    /// Any cage, however malformed, gets a non-empty lowercase discriminator
    /// without whitespace or control characters.
    #[test]
    fn prop_discriminator_is_total(cage in any_cage()) {
        let discriminator = cage_discriminator(&cage).value;

        prop_assert!(!discriminator.is_empty(), "Discriminator must not be empty");
        prop_assert!(
            !discriminator.chars().any(is_unsafe),
            "Discriminator must be a single token: {:?}", discriminator
        );
        prop_assert_eq!(discriminator.to_lowercase(), discriminator.clone());
    }

    /// Property: Rendering is deterministic
    #[test]
    fn prop_rendering_is_deterministic(farm in any_farm()) {
        prop_assert_eq!(render_farm_block(&farm), render_farm_block(&farm.clone()));
    }

    /// Property: One stanza per renderable host, plus the jump wildcard when
    /// any cage is renderable
    #[test]
    fn prop_one_stanza_per_host(farm in safe_farm()) {
        let rendered = render_farm_block(&farm).unwrap();
        let stanzas = rendered.lines().filter(|line| line.starts_with("Host ")).count();
        let cages = farm.renderable_cages().count();
        let expected = if cages == 0 { 1 } else { 2 + cages };

        prop_assert_eq!(stanzas, expected);
        prop_assert_eq!(
            rendered.contains("ProxyJump"),
            cages > 0,
            "ProxyJump only when cages are rendered"
        );
        let farm_alias = derive_farm_alias(&farm.name);
        let header = format!("Host {}\n", farm_alias);
        prop_assert!(rendered.starts_with(&header));
    }

    /// Property: No two stanzas of one farm share a host pattern
    #[test]
    fn prop_cage_aliases_unique_within_farm(farm in safe_farm()) {
        let rendered = render_farm_block(&farm).unwrap();
        let mut seen = HashSet::new();

        for host in rendered.lines().filter(|line| line.starts_with("Host ")) {
            prop_assert!(seen.insert(host.to_string()), "Duplicate stanza {:?}", host);
        }
    }

    /// Property: Every rendered line is blank, `Host <token>` or an indented
    /// `<keyword> <token>`; anything else is rejected up front
    #[test]
    fn prop_rendered_lines_are_single_tokens(farm in any_farm()) {
        let Ok(rendered) = render_farm_block(&farm) else {
            prop_assert!(farm.validate().is_err());
            return Ok(());
        };

        for line in rendered.lines() {
            if line.is_empty() {
                continue;
            }
            let value = line
                .strip_prefix("Host ")
                .or_else(|| line.strip_prefix("    HostName "))
                .or_else(|| line.strip_prefix("    ProxyJump "));
            prop_assert!(value.is_some(), "Unexpected line {:?}", line);
            let value = value.unwrap_or_default();
            prop_assert!(!value.is_empty());
            prop_assert!(!value.chars().any(is_unsafe), "Unsafe value in {:?}", line);
        }
    }

    /// Property: A farm's file name never leaves its output directory
    #[test]
    fn prop_file_name_stays_in_output_dir(farm in any_farm()) {
        if farm.validate().is_ok() {
            let file_name = farm.file_name();
            prop_assert!(!file_name.starts_with('.'));
            prop_assert!(!file_name.contains(['/', '\\']));
            prop_assert!(!file_name.chars().any(is_unsafe));
            prop_assert!(file_name.ends_with(".config") && file_name.len() > ".config".len());
        } else {
            prop_assert!(render_farm_block(&farm).is_err());
        }
    }

    /// Property: Stanzas are separated by exactly one blank line
    #[test]
    fn prop_single_blank_line_between_stanzas(farm in safe_farm()) {
        let rendered = render_farm_block(&farm).unwrap();

        prop_assert!(!rendered.contains("\n\n\n"), "No double blank lines");
        prop_assert!(rendered.ends_with('\n') && !rendered.ends_with("\n\n"));
    }
}
