// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data virtualization procedure surface
//!
//! The callable face of the extension:
//! - dv.catalog.add(name, config)        WRITE  -> definition DTOs
//! - dv.catalog.remove(name)             WRITE  -> definition DTOs
//! - dv.catalog.list()                   READ   -> definition DTOs
//! - dv.query(name, params, config)      READ   -> virtual nodes
//! - dv.queryAndLink(node, relName, name, params, config)
//!                                       READ   -> virtual paths
//!
//! Typed methods carry the real signatures; `call` dispatches by
//! procedure name for hosts that route CALL statements generically.

use super::context::ProcedureContext;
use super::error::{DvError, DvResult};
use super::orchestrator::{QueryOrchestrator, RuntimeParams};
use super::registry::ExtractionRegistry;
use crate::catalog::{CatalogStore, VirtualizedResource, VirtualizedResourceDto};
use crate::engine::LoadEngine;
use crate::vgraph::{VirtualNode, VirtualPath};
use std::sync::Arc;

/// Host-facing execution mode of a procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureMode {
    Read,
    Write,
}

/// Name and mode of every procedure this extension registers
pub const PROCEDURES: &[(&str, ProcedureMode)] = &[
    ("dv.catalog.add", ProcedureMode::Write),
    ("dv.catalog.remove", ProcedureMode::Write),
    ("dv.catalog.list", ProcedureMode::Read),
    ("dv.query", ProcedureMode::Read),
    ("dv.queryAndLink", ProcedureMode::Read),
];

/// Look up the mode of a procedure name
pub fn procedure_mode(name: &str) -> Option<ProcedureMode> {
    PROCEDURES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, mode)| *mode)
}

/// One record of a procedure result stream
#[derive(Debug, Clone)]
pub enum ProcedureRecord {
    Definition(VirtualizedResourceDto),
    Node(VirtualNode),
    Path(VirtualPath),
}

/// The data virtualization procedure bundle
pub struct DataVirtualizationProcedures {
    store: Arc<CatalogStore>,
    orchestrator: QueryOrchestrator,
    engine: Arc<LoadEngine>,
}

impl DataVirtualizationProcedures {
    pub fn new(
        store: Arc<CatalogStore>,
        registry: Arc<ExtractionRegistry>,
        engine: Arc<LoadEngine>,
    ) -> Self {
        let orchestrator = QueryOrchestrator::new(Arc::clone(&store), registry);
        Self {
            store,
            orchestrator,
            engine,
        }
    }

    /// dv.catalog.add — validate and persist a virtualized resource
    pub fn add(&self, name: &str, config: &serde_json::Value) -> DvResult<VirtualizedResourceDto> {
        let def = VirtualizedResource::from(name, config)?;
        let stored = self.store.add(def)?;
        Ok(stored.to_dto())
    }

    /// dv.catalog.remove — delete a resource and drain its pool entries
    pub fn remove(&self, name: &str) -> DvResult<Option<VirtualizedResourceDto>> {
        let removed = self.store.remove(name)?;
        if let Some(def) = &removed {
            if let Ok(url) = def.source_url() {
                self.engine.pool().drain(&url);
            }
        }
        Ok(removed.map(|def| def.to_dto()))
    }

    /// dv.catalog.list — all definitions, order unspecified
    pub fn list(&self) -> impl Iterator<Item = DvResult<VirtualizedResourceDto>> + '_ {
        self.store
            .list()
            .map(|entry| entry.map(|def| def.to_dto()).map_err(DvError::from))
    }

    /// dv.query — stream virtual nodes from a virtualized resource
    pub fn query(
        &self,
        name: &str,
        params: &serde_json::Value,
        config: &serde_json::Value,
        ctx: &ProcedureContext,
    ) -> DvResult<impl Iterator<Item = DvResult<VirtualNode>>> {
        let runtime = RuntimeParams::from_json(params)?;
        self.orchestrator.query(name, &runtime, config, ctx)
    }

    /// dv.queryAndLink — virtual nodes linked to an anchor as paths
    pub fn query_and_link(
        &self,
        anchor: &VirtualNode,
        rel_name: &str,
        name: &str,
        params: &serde_json::Value,
        config: &serde_json::Value,
        ctx: &ProcedureContext,
    ) -> DvResult<impl Iterator<Item = DvResult<VirtualPath>>> {
        let runtime = RuntimeParams::from_json(params)?;
        self.orchestrator
            .query_and_link(anchor, rel_name, name, &runtime, config, ctx)
    }

    /// Generic dispatch by procedure name
    ///
    /// Arguments follow the procedure's declared tuple; trailing
    /// `params`/`config` arguments default to empty when omitted.
    pub fn call<'a>(
        &'a self,
        procedure: &str,
        args: &[serde_json::Value],
        ctx: &ProcedureContext,
    ) -> DvResult<Box<dyn Iterator<Item = DvResult<ProcedureRecord>> + 'a>> {
        match procedure {
            "dv.catalog.add" => {
                let name = arg_str(args, 0, "name")?;
                let config = arg_or(args, 1, serde_json::json!({}));
                let dto = self.add(&name, &config)?;
                Ok(Box::new(std::iter::once(Ok(ProcedureRecord::Definition(
                    dto,
                )))))
            }
            "dv.catalog.remove" => {
                let name = arg_str(args, 0, "name")?;
                let removed = self.remove(&name)?;
                Ok(Box::new(
                    removed
                        .into_iter()
                        .map(|dto| Ok(ProcedureRecord::Definition(dto))),
                ))
            }
            "dv.catalog.list" => Ok(Box::new(
                self.list()
                    .map(|entry| entry.map(ProcedureRecord::Definition)),
            )),
            "dv.query" => {
                let name = arg_str(args, 0, "name")?;
                let params = arg_or(args, 1, serde_json::json!([]));
                let config = arg_or(args, 2, serde_json::json!({}));
                let nodes = self.query(&name, &params, &config, ctx)?;
                Ok(Box::new(
                    nodes.map(|entry| entry.map(ProcedureRecord::Node)),
                ))
            }
            "dv.queryAndLink" => {
                let anchor: VirtualNode = serde_json::from_value(
                    args.first()
                        .cloned()
                        .ok_or_else(|| missing_arg("node"))?,
                )
                .map_err(|e| DvError::InvalidArgument(format!("invalid anchor node: {}", e)))?;
                let rel_name = arg_str(args, 1, "relName")?;
                let name = arg_str(args, 2, "name")?;
                let params = arg_or(args, 3, serde_json::json!([]));
                let config = arg_or(args, 4, serde_json::json!({}));
                let paths = self.query_and_link(&anchor, &rel_name, &name, &params, &config, ctx)?;
                Ok(Box::new(
                    paths.map(|entry| entry.map(ProcedureRecord::Path)),
                ))
            }
            other => Err(DvError::UnknownProcedure(other.to_string())),
        }
    }
}

fn missing_arg(name: &str) -> DvError {
    DvError::InvalidArgument(format!("missing required argument '{}'", name))
}

fn arg_str(args: &[serde_json::Value], index: usize, name: &str) -> DvResult<String> {
    args.get(index)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| missing_arg(name))
}

fn arg_or(args: &[serde_json::Value], index: usize, default: serde_json::Value) -> serde_json::Value {
    args.get(index).cloned().unwrap_or(default)
}
