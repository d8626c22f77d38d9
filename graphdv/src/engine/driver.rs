// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Tabular driver abstraction
//!
//! The seam between the load engine and concrete source backends.
//! Drivers are registered per URL scheme; the crate ships a SQLite
//! driver and the pool/engine layers only ever see these traits.

use super::credentials::Credentials;
use super::error::{EngineError, EngineResult};
use super::rows::Row;
use super::url::SourceUrl;
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Consumer verdict after each emitted row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emit {
    Continue,
    Stop,
}

/// Live connection to one external tabular source
pub trait DriverConnection: Send {
    /// Zero-cost liveness probe; false means the connection is dead
    fn ping(&mut self) -> bool;

    /// Execute a DML statement, returning the affected-row count
    fn execute(&mut self, statement: &str, params: &[Value]) -> EngineResult<u64>;

    /// Run a query, pushing each row to `emit` in source order
    ///
    /// The cursor advances only as `emit` is invoked; returning
    /// [`Emit::Stop`] closes the cursor early and is not an error.
    fn for_each_row(
        &mut self,
        query: &str,
        params: &[Value],
        emit: &mut dyn FnMut(Row) -> Emit,
    ) -> EngineResult<()>;

    /// Handle that aborts the statement currently running on this
    /// connection, callable from another thread
    ///
    /// Drivers without an abort primitive return `None`; cancellation
    /// then only takes effect between row emissions. An aborted
    /// statement fails with [`EngineError::Cancelled`].
    fn interrupter(&self) -> Option<Box<dyn Fn() + Send>> {
        None
    }
}

/// Factory for connections to sources of one URL scheme
pub trait TabularDriver: Send + Sync {
    fn connect(
        &self,
        url: &SourceUrl,
        credentials: Option<&Credentials>,
    ) -> EngineResult<Box<dyn DriverConnection>>;
}

/// Scheme-indexed driver registry
///
/// Process-wide, populated at extension init. Mirrors the pre-named
/// driver registration the host exposes to operators.
pub struct DriverRegistry {
    drivers: RwLock<HashMap<String, Arc<dyn TabularDriver>>>,
}

impl DriverRegistry {
    /// Create a registry with the built-in SQLite driver registered
    pub fn with_builtin() -> Self {
        let registry = Self {
            drivers: RwLock::new(HashMap::new()),
        };
        registry.register("sqlite", Arc::new(super::sqlite::SqliteDriver));
        registry
    }

    /// Register a driver for a URL scheme (lowercased)
    pub fn register(&self, scheme: &str, driver: Arc<dyn TabularDriver>) {
        self.drivers
            .write()
            .insert(scheme.to_ascii_lowercase(), driver);
    }

    /// Resolve the driver for a URL, failing with `CONFIG` when no
    /// driver is registered for its scheme
    pub fn resolve(&self, url: &SourceUrl) -> EngineResult<Arc<dyn TabularDriver>> {
        self.drivers
            .read()
            .get(url.scheme())
            .cloned()
            .ok_or_else(|| {
                EngineError::Config(format!(
                    "no driver registered for scheme '{}'",
                    url.scheme()
                ))
            })
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sqlite_resolves() {
        let registry = DriverRegistry::with_builtin();
        let url = SourceUrl::parse("jdbc:sqlite:/tmp/x.db").unwrap();
        assert!(registry.resolve(&url).is_ok());
    }

    #[test]
    fn test_unknown_scheme_is_config_error() {
        let registry = DriverRegistry::with_builtin();
        let url = SourceUrl::parse("oracle://host/db").unwrap();
        assert!(matches!(
            registry.resolve(&url),
            Err(EngineError::Config(_))
        ));
    }
}
