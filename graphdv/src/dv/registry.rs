// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Extraction procedure registry
//!
//! The orchestrator never executes arbitrary extraction languages; a
//! resource resolves to a pre-named extraction procedure which turns
//! the concrete call into a row stream. The TABULAR procedure backed
//! by the load engine ships built in; procedures for the other
//! resource kinds are registered by the host at init.

use super::context::ProcedureContext;
use super::error::{DvError, DvResult};
use crate::engine::{Credentials, LoadEngine, RowStream, SourceUrl};
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Concrete extraction call derived from a resource definition plus
/// runtime parameters
#[derive(Debug, Clone)]
pub struct ExtractionCall {
    /// Pre-named extraction procedure to dispatch to
    pub procedure: String,
    /// Connection string of the resource (may embed credentials)
    pub url: String,
    /// Query template with runtime parameters already bound
    pub query: String,
    pub params: Vec<Value>,
    /// Call-config passthrough: credentials, schema hint, opaque
    /// engine hints
    pub config: serde_json::Value,
}

/// One pre-named extraction procedure
pub trait ExtractionProcedure: Send + Sync {
    fn invoke(&self, call: &ExtractionCall, ctx: &ProcedureContext) -> DvResult<RowStream>;
}

/// Name-indexed registry of extraction procedures
pub struct ExtractionRegistry {
    procedures: RwLock<HashMap<String, Arc<dyn ExtractionProcedure>>>,
}

impl ExtractionRegistry {
    /// Registry with the built-in tabular procedure installed
    pub fn with_builtin(engine: Arc<LoadEngine>) -> Self {
        let registry = Self {
            procedures: RwLock::new(HashMap::new()),
        };
        registry.register("dv.load.tabular", Arc::new(TabularExtraction { engine }));
        registry
    }

    pub fn register(&self, name: &str, procedure: Arc<dyn ExtractionProcedure>) {
        self.procedures.write().insert(name.to_string(), procedure);
    }

    pub fn resolve(&self, name: &str) -> DvResult<Arc<dyn ExtractionProcedure>> {
        self.procedures
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| DvError::UnknownProcedure(name.to_string()))
    }
}

/// Built-in TABULAR extraction backed by the load engine
struct TabularExtraction {
    engine: Arc<LoadEngine>,
}

impl ExtractionProcedure for TabularExtraction {
    fn invoke(&self, call: &ExtractionCall, ctx: &ProcedureContext) -> DvResult<RowStream> {
        let url = SourceUrl::parse(&call.url)?;
        let credentials = Credentials::from_config(&call.config);
        let stream = self.engine.rows(
            &url,
            credentials.as_ref(),
            &call.query,
            &call.params,
            ctx.terminator().clone(),
        )?;
        Ok(stream)
    }
}
