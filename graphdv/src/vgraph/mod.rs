// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Virtual graph entities
//!
//! In-memory nodes, relationships, and paths that present the same
//! capability set as stored entities but are never written to storage.
//! Identity is synthesized per entity and scoped to the result stream
//! that produced it.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Direction of a virtual relationship relative to the anchor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    /// Parse a direction from a call-config string, defaulting to OUT
    pub fn parse(raw: Option<&str>) -> Option<Direction> {
        match raw {
            None => Some(Direction::Out),
            Some(s) => match s.to_ascii_uppercase().as_str() {
                "IN" => Some(Direction::In),
                "OUT" => Some(Direction::Out),
                _ => None,
            },
        }
    }
}

/// Virtual node with synthesized identity, labels, and properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualNode {
    pub id: String,
    pub labels: Vec<String>,
    pub properties: HashMap<String, Value>,
}

impl VirtualNode {
    /// Create a new virtual node with the given labels and properties
    ///
    /// Null-valued properties are omitted so that virtual nodes match
    /// the property semantics of stored nodes.
    pub fn new(labels: Vec<String>, properties: HashMap<String, Value>) -> Self {
        let properties = properties
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .collect();
        Self {
            id: format!("vnode-{}", Uuid::new_v4()),
            labels,
            properties,
        }
    }

    /// Check if node has a specific label
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Get a property value
    pub fn get_property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// Virtual relationship between two nodes (real or virtual)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualRelationship {
    pub id: String,
    pub rel_type: String,
    pub start: VirtualNode,
    pub end: VirtualNode,
    pub properties: HashMap<String, Value>,
}

impl VirtualRelationship {
    /// Create a new virtual relationship from start to end
    pub fn new(start: VirtualNode, end: VirtualNode, rel_type: String) -> Self {
        Self {
            id: format!("vrel-{}", Uuid::new_v4()),
            rel_type,
            start,
            end,
            properties: HashMap::new(),
        }
    }

    /// Create a relationship oriented by direction relative to an anchor
    ///
    /// OUT: anchor -> produced, IN: produced -> anchor.
    pub fn between(
        anchor: &VirtualNode,
        produced: VirtualNode,
        rel_type: &str,
        direction: Direction,
    ) -> Self {
        match direction {
            Direction::Out => Self::new(anchor.clone(), produced, rel_type.to_string()),
            Direction::In => Self::new(produced, anchor.clone(), rel_type.to_string()),
        }
    }
}

/// Virtual path: an alternating node/relationship sequence
///
/// The orchestrator only ever emits paths of length one, but the type
/// supports longer paths for downstream composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualPath {
    pub start: VirtualNode,
    pub relationships: Vec<VirtualRelationship>,
}

impl VirtualPath {
    /// Create a path anchored at a start node
    pub fn new(start: VirtualNode) -> Self {
        Self {
            start,
            relationships: Vec::new(),
        }
    }

    /// Append a relationship to the path
    pub fn add_relationship(&mut self, rel: VirtualRelationship) {
        self.relationships.push(rel);
    }

    /// Path length (number of relationships)
    pub fn length(&self) -> usize {
        self.relationships.len()
    }

    /// End node of the path
    pub fn end(&self) -> &VirtualNode {
        self.relationships
            .last()
            .map(|r| &r.end)
            .unwrap_or(&self.start)
    }
}

/// Tagged variant over the closed set of virtual result shapes
///
/// Procedure result streams carry one of these per record; consumers
/// dispatch on the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VirtualEntity {
    Node(VirtualNode),
    Relationship(VirtualRelationship),
    Path(VirtualPath),
}
