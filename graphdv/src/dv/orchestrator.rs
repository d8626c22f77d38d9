// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Query orchestrator
//!
//! Resolves a virtualized resource by name, binds runtime parameters
//! into its query template, executes the resulting extraction call
//! through the procedure registry, and maps produced rows into virtual
//! nodes or single-relationship virtual paths.
//!
//! Each orchestration call walks RESOLVED, BOUND, OPEN, a run of
//! emitted rows, then CLOSED. The CLOSED transition is carried by the
//! row stream, which releases its cursor and connection on every exit
//! path, including error and early consumer release.

use super::context::ProcedureContext;
use super::error::{DvError, DvResult};
use super::registry::{ExtractionCall, ExtractionRegistry};
use crate::catalog::{CatalogStore, VirtualizedResource};
use crate::engine::{EngineError, RowStream};
use crate::value::Value;
use crate::vgraph::{Direction, VirtualNode, VirtualPath, VirtualRelationship};
use std::collections::HashMap;
use std::sync::Arc;

/// Runtime parameters in one of the two binding modes
#[derive(Debug, Clone)]
pub enum RuntimeParams {
    /// Sequence bound 1:1 to positional holes in caller order
    Positional(Vec<Value>),
    /// Mapping substituted at the declared parameter positions
    Named(HashMap<String, Value>),
}

impl RuntimeParams {
    /// Parse runtime parameters from a procedure argument
    ///
    /// A JSON array selects positional mode, an object named mode;
    /// null or absent means an empty positional sequence.
    pub fn from_json(raw: &serde_json::Value) -> DvResult<RuntimeParams> {
        match raw {
            serde_json::Value::Null => Ok(RuntimeParams::Positional(Vec::new())),
            serde_json::Value::Array(items) => Ok(RuntimeParams::Positional(
                items.iter().map(Value::from_json).collect(),
            )),
            serde_json::Value::Object(map) => Ok(RuntimeParams::Named(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            )),
            _ => Err(DvError::InvalidArgument(
                "params must be a sequence or a mapping".to_string(),
            )),
        }
    }
}

/// Bind runtime parameters against a resource's declared parameters
///
/// Missing or extra parameters fail with `ARITY` before any call
/// reaches the driver.
pub fn bind_params(def: &VirtualizedResource, runtime: &RuntimeParams) -> DvResult<Vec<Value>> {
    match runtime {
        RuntimeParams::Positional(seq) => {
            if seq.len() != def.params.len() {
                return Err(EngineError::Arity {
                    expected: def.params.len(),
                    actual: seq.len(),
                }
                .into());
            }
            Ok(seq.clone())
        }
        RuntimeParams::Named(map) => {
            if map.len() != def.params.len() {
                return Err(EngineError::Arity {
                    expected: def.params.len(),
                    actual: map.len(),
                }
                .into());
            }
            def.params
                .iter()
                .map(|name| {
                    map.get(name).cloned().ok_or_else(|| {
                        EngineError::Arity {
                            expected: def.params.len(),
                            actual: map.len(),
                        }
                        .into()
                    })
                })
                .collect()
        }
    }
}

/// Orchestrates extraction calls against the catalog and registry
pub struct QueryOrchestrator {
    store: Arc<CatalogStore>,
    registry: Arc<ExtractionRegistry>,
}

impl QueryOrchestrator {
    pub fn new(store: Arc<CatalogStore>, registry: Arc<ExtractionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Stream virtual nodes produced by a virtualized resource
    pub fn query(
        &self,
        name: &str,
        params: &RuntimeParams,
        config: &serde_json::Value,
        ctx: &ProcedureContext,
    ) -> DvResult<VirtualNodeStream> {
        let def = self.store.get(name)?;
        let bound = bind_params(&def, params)?;
        let call = ExtractionCall {
            procedure: def.kind.extraction_procedure().to_string(),
            url: def.url.clone(),
            query: def.query.clone(),
            params: bound,
            config: config.clone(),
        };
        let procedure = self.registry.resolve(&call.procedure)?;
        let rows = procedure.invoke(&call, ctx)?;
        Ok(VirtualNodeStream {
            rows,
            labels: def.labels,
        })
    }

    /// As [`query`], linking each produced node to an anchor
    ///
    /// Emits one path of length one per produced node. With
    /// `direction=OUT` (the default) the anchor is the start node;
    /// with `IN` the produced node is.
    pub fn query_and_link(
        &self,
        anchor: &VirtualNode,
        rel_name: &str,
        name: &str,
        params: &RuntimeParams,
        config: &serde_json::Value,
        ctx: &ProcedureContext,
    ) -> DvResult<VirtualPathStream> {
        let direction = Direction::parse(config.get("direction").and_then(|v| v.as_str()))
            .ok_or_else(|| {
                DvError::InvalidArgument("direction must be IN or OUT".to_string())
            })?;
        let nodes = self.query(name, params, config, ctx)?;
        Ok(VirtualPathStream {
            nodes,
            anchor: anchor.clone(),
            rel_name: rel_name.to_string(),
            direction,
        })
    }
}

/// Lazy stream of virtual nodes from one orchestration call
///
/// Dropping the stream closes the underlying cursor.
pub struct VirtualNodeStream {
    rows: RowStream,
    labels: Vec<String>,
}

impl VirtualNodeStream {
    /// Close the underlying row stream early
    pub fn close(&mut self) {
        self.rows.close();
    }
}

impl Iterator for VirtualNodeStream {
    type Item = DvResult<VirtualNode>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.rows.next()? {
            Ok(row) => Some(Ok(VirtualNode::new(
                self.labels.clone(),
                row.into_values(),
            ))),
            Err(err) => Some(Err(err.into())),
        }
    }
}

/// Lazy stream of length-one virtual paths
pub struct VirtualPathStream {
    nodes: VirtualNodeStream,
    anchor: VirtualNode,
    rel_name: String,
    direction: Direction,
}

impl VirtualPathStream {
    pub fn close(&mut self) {
        self.nodes.close();
    }
}

impl Iterator for VirtualPathStream {
    type Item = DvResult<VirtualPath>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.nodes.next()? {
            Ok(node) => {
                let rel = VirtualRelationship::between(
                    &self.anchor,
                    node,
                    &self.rel_name,
                    self.direction,
                );
                let mut path = VirtualPath::new(rel.start.clone());
                path.add_relationship(rel);
                Some(Ok(path))
            }
            Err(err) => Some(Err(err)),
        }
    }
}
