// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data virtualization catalog
//!
//! Persisted descriptors for external data sources, stored in a
//! system-scoped graph so catalog mutations are visible to all
//! sessions and survive process restarts.

pub mod error;
pub mod resource;
pub mod store;

pub use error::{CatalogError, CatalogResult};
pub use resource::{ResourceKind, VirtualizedResource, VirtualizedResourceDto};
pub use store::{CatalogStore, RESOURCE_LABEL};
