// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! GraphDV - Data virtualization procedures for property-graph runtimes
//!
//! GraphDV registers external data sources (relational, document,
//! column, key-value) in a catalog persisted in a system-scoped graph
//! and, at query time, materializes their rows as *virtual* graph
//! entities that can be linked to real nodes without ever being
//! written to storage.
//!
//! # Features
//!
//! - **Virtualized resource catalog**: named, persisted source
//!   descriptors that survive restarts and are visible to all sessions
//! - **External load engine**: pooled, credential-hygienic access to
//!   tabular sources with lazy row streaming and typed array decoding
//! - **Virtual entities**: nodes, relationships, and paths with full
//!   query-layer capabilities and no storage footprint
//! - **Cancellation**: host termination signals propagate to in-flight
//!   cursors with bounded latency
//!
//! # Usage
//!
//! ```ignore
//! let dv = DvCoordinator::from_path("./system")?;
//! let ctx = ProcedureContext::new();
//!
//! dv.procedures().add("people", &serde_json::json!({
//!     "type": "TABULAR",
//!     "url": "jdbc:sqlite:/data/people.db",
//!     "query": "SELECT * FROM PERSON WHERE NAME = ?",
//!     "params": ["name"],
//!     "labels": ["Person"],
//! }))?;
//!
//! for node in dv.procedures().query(
//!     "people",
//!     &serde_json::json!(["John"]),
//!     &serde_json::json!({}),
//!     &ctx,
//! )? {
//!     let node = node?;
//!     assert!(node.has_label("Person"));
//! }
//! ```

// Public modules - exposed to host integrations
pub mod dv;

// Internal building blocks - public for host-side driver and
// extraction-procedure registration
pub mod catalog;
pub mod engine;
pub mod value;
pub mod vgraph;

// Re-export the primary API surface
pub use dv::{
    DataVirtualizationProcedures, DvCoordinator, DvError, DvResult, ProcedureContext,
    ProcedureMode, ProcedureRecord, RuntimeParams,
};
pub use value::Value;
pub use vgraph::{Direction, VirtualEntity, VirtualNode, VirtualPath, VirtualRelationship};

/// GraphDV version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// GraphDV crate name
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
