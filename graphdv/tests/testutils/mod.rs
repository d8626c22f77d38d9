// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Test utilities for GraphDV integration tests
//!
//! Provides an isolated coordinator instance plus a seeded external
//! SQLite source. Tests go through the public procedure surface
//! wherever possible.

pub mod dv_fixture;
