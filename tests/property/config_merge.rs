// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for the Primary Config Merge
//!
//! Whatever the existing document looks like, the merge must be idempotent,
//! keep foreign lines verbatim and in order, and leave exactly one copy of
//! each directive.

use cage_ssh::{merge_document, ManagedDirectives};
use proptest::prelude::*;

const PROD: &str = "Include prod.config";
const STAGING: &str = "Include staging.config";

fn managed() -> ManagedDirectives {
    ManagedDirectives::new([PROD, STAGING])
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Lines a user might have written, including stale managed directives
fn config_line() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[A-Za-z0-9 #.*=-]{0,24}",
        1 => Just(String::new()),
        1 => "[ \t]{0,3}".prop_map(|indent| format!("{indent}{PROD}")),
        1 => "[ \t]{0,3}".prop_map(|indent| format!("{indent}{STAGING}")),
    ]
}

/// A whole document, with or without a trailing newline
fn document() -> impl Strategy<Value = String> {
    (prop::collection::vec(config_line(), 0..20), any::<bool>()).prop_map(|(lines, newline)| {
        let mut text = lines.join("\n");
        if newline {
            text.push('\n');
        }
        text
    })
}

/// A non-empty, ordered subset of the managed directives
fn directives() -> impl Strategy<Value = Vec<String>> {
    prop_oneof![
        Just(vec![PROD.to_string()]),
        Just(vec![STAGING.to_string()]),
        Just(vec![PROD.to_string(), STAGING.to_string()]),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Property: Merging twice equals merging once
    #[test]
    fn prop_merge_is_idempotent(existing in document(), new in directives()) {
        let once = merge_document(Some(&existing), &new, &managed());
        let twice = merge_document(Some(&once), &new, &managed());

        prop_assert_eq!(once, twice, "Second merge must not change the document");
    }

    /// Property: Foreign lines survive verbatim and in order
    #[test]
    fn prop_foreign_lines_preserved(existing in document(), new in directives()) {
        let merged = merge_document(Some(&existing), &new, &managed());

        let foreign_before: Vec<&str> = existing
            .split('\n')
            .filter(|line| !managed().owns(line))
            .collect();
        let foreign_after: Vec<&str> = merged
            .split('\n')
            .filter(|line| !managed().owns(line))
            .collect();

        prop_assert_eq!(foreign_before, foreign_after);
    }

    /// Property: Each directive appears exactly once, at the top, in order
    #[test]
    fn prop_directives_lead_once(existing in document(), new in directives()) {
        let merged = merge_document(Some(&existing), &new, &managed());
        let lines: Vec<&str> = merged.split('\n').collect();

        for directive in &new {
            let count = lines.iter().filter(|line| line.trim() == directive.as_str()).count();
            prop_assert_eq!(count, 1, "Directive {} must appear once", directive);
        }
        let head: Vec<String> = lines[..new.len()].iter().map(|line| line.to_string()).collect();
        prop_assert_eq!(head, new.clone());
    }

    /// Property: A missing file is bootstrapped with just the directives
    #[test]
    fn prop_bootstrap(new in directives()) {
        let merged = merge_document(None, &new, &managed());
        prop_assert_eq!(merged, format!("{}\n", new.join("\n")));
    }
}
