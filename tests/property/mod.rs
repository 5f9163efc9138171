// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Strategies and properties for the alias compiler and the config merge.

mod alias_rendering;
mod config_merge;
