// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify the properties that must hold for
//! all inventory input: alias totality, rendering determinism and merge
//! idempotence.

mod property;
