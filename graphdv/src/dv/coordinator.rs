// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Extension coordinator
//!
//! Wires the system graph store, driver registry, connection pool,
//! load engine, extraction registry, and procedure surface together.
//! One coordinator lives per process; its lifecycle is bound to
//! extension init and teardown.

use super::procedures::DataVirtualizationProcedures;
use super::registry::ExtractionRegistry;
use crate::catalog::{CatalogResult, CatalogStore};
use crate::engine::{ConnectionPool, DriverRegistry, LoadEngine, PoolConfig};
use std::path::Path;
use std::sync::Arc;

/// Entry point for hosting the data virtualization extension
pub struct DvCoordinator {
    system_db: sled::Db,
    drivers: Arc<DriverRegistry>,
    extraction: Arc<ExtractionRegistry>,
    engine: Arc<LoadEngine>,
    procedures: DataVirtualizationProcedures,
}

impl DvCoordinator {
    /// Open the coordinator with a system graph store at `path`
    pub fn from_path<P: AsRef<Path>>(path: P) -> CatalogResult<Self> {
        Self::with_pool_config(path, PoolConfig::default())
    }

    /// As [`from_path`] with explicit pool tuning
    pub fn with_pool_config<P: AsRef<Path>>(
        path: P,
        pool_config: PoolConfig,
    ) -> CatalogResult<Self> {
        let system_db = sled::open(path)?;
        let store = Arc::new(CatalogStore::open(&system_db)?);

        let drivers = Arc::new(DriverRegistry::with_builtin());
        let pool = Arc::new(ConnectionPool::new(Arc::clone(&drivers), pool_config));
        let engine = Arc::new(LoadEngine::new(pool));
        let extraction = Arc::new(ExtractionRegistry::with_builtin(Arc::clone(&engine)));

        let procedures = DataVirtualizationProcedures::new(
            store,
            Arc::clone(&extraction),
            Arc::clone(&engine),
        );

        log::debug!("dv extension initialized");
        Ok(Self {
            system_db,
            drivers,
            extraction,
            engine,
            procedures,
        })
    }

    /// The callable procedure surface
    pub fn procedures(&self) -> &DataVirtualizationProcedures {
        &self.procedures
    }

    /// Driver registry, for hosts registering additional schemes
    pub fn drivers(&self) -> &Arc<DriverRegistry> {
        &self.drivers
    }

    /// Extraction registry, for hosts registering non-tabular kinds
    pub fn extraction_registry(&self) -> &Arc<ExtractionRegistry> {
        &self.extraction
    }

    /// The load engine (and through it, the connection pool)
    pub fn engine(&self) -> &Arc<LoadEngine> {
        &self.engine
    }

    /// Teardown: destroy pooled connections, flush the system graph
    pub fn shutdown(&self) -> CatalogResult<()> {
        self.engine.pool().shutdown();
        self.system_db.flush()?;
        log::debug!("dv extension shut down");
        Ok(())
    }
}
