// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error types for the external load engine
//!
//! Driver messages are redacted of credentials before they are wrapped
//! here; constructors take already-safe strings.

use thiserror::Error;

/// Errors produced by the connection provider and extraction engine
#[derive(Error, Debug, Clone)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Parameter arity mismatch: expected {expected}, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("Type error: {0}")]
    Type(String),

    #[error("Syntax error: {0}")]
    Syntax(String),

    #[error("Constraint violation: {0}")]
    Conflict(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("Operation cancelled")]
    Cancelled,
}

pub type EngineResult<T> = Result<T, EngineError>;
