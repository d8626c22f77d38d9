// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Host-injected invocation context
//!
//! Every procedure invocation receives its context as an explicit
//! parameter; there is no ambient state. The host wires its own
//! termination signal in; tests construct a fresh context per call.

use crate::engine::Terminator;

/// Per-invocation context injected by the host
#[derive(Clone, Default)]
pub struct ProcedureContext {
    terminator: Terminator,
}

impl ProcedureContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context wired to a host-owned termination signal
    pub fn with_terminator(terminator: Terminator) -> Self {
        Self { terminator }
    }

    pub fn terminator(&self) -> &Terminator {
        &self.terminator
    }
}
