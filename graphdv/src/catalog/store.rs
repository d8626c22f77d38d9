// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Catalog persistence in the system-scoped graph
//!
//! Resource definitions live as nodes labeled `VirtualizedResource` in
//! a graph store reserved for extension metadata, separate from user
//! data. Each operation is its own system transaction (a tree write
//! followed by a flush); no cross-operation atomicity is promised.
//! Entries are never mutated in place: replacement is delete-then-add.

use super::error::{CatalogError, CatalogResult};
use super::resource::VirtualizedResource;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Label carried by every catalog node in the system graph
pub const RESOURCE_LABEL: &str = "VirtualizedResource";

const CATALOG_TREE: &str = "dv_catalog";

/// Persisted node shape for one catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CatalogNode {
    id: Uuid,
    labels: Vec<String>,
    resource: VirtualizedResource,
}

impl CatalogNode {
    fn new(resource: VirtualizedResource) -> Self {
        Self {
            id: Uuid::new_v4(),
            labels: vec![RESOURCE_LABEL.to_string()],
            resource,
        }
    }
}

/// Catalog store over the system-scoped graph
///
/// Visible to all sessions; the `name` field is the logical key and
/// unique across the catalog.
pub struct CatalogStore {
    tree: sled::Tree,
}

impl CatalogStore {
    /// Open the catalog tree inside the system graph store
    pub fn open(system_db: &sled::Db) -> CatalogResult<CatalogStore> {
        let tree = system_db.open_tree(CATALOG_TREE)?;
        Ok(CatalogStore { tree })
    }

    /// Persist a definition; fails with `Conflict` when the name exists
    pub fn add(&self, def: VirtualizedResource) -> CatalogResult<VirtualizedResource> {
        let node = CatalogNode::new(def.clone());
        let bytes = bincode::serialize(&node)?;
        let swap = self
            .tree
            .compare_and_swap(def.name.as_bytes(), None as Option<&[u8]>, Some(bytes))?;
        match swap {
            Ok(()) => {
                self.tree.flush()?;
                log::debug!("catalog: added virtualized resource '{}'", def.name);
                Ok(def)
            }
            Err(_) => Err(CatalogError::Conflict(def.name)),
        }
    }

    /// Delete a definition; returns the removed definition, if any
    pub fn remove(&self, name: &str) -> CatalogResult<Option<VirtualizedResource>> {
        let removed = self.tree.remove(name.as_bytes())?;
        self.tree.flush()?;
        match removed {
            Some(bytes) => {
                let node: CatalogNode = bincode::deserialize(&bytes)?;
                log::debug!("catalog: removed virtualized resource '{}'", name);
                Ok(Some(node.resource))
            }
            None => Ok(None),
        }
    }

    /// Resolve a definition by name
    pub fn get(&self, name: &str) -> CatalogResult<VirtualizedResource> {
        match self.tree.get(name.as_bytes())? {
            Some(bytes) => {
                let node: CatalogNode = bincode::deserialize(&bytes)?;
                Ok(node.resource)
            }
            None => Err(CatalogError::NotFound(name.to_string())),
        }
    }

    /// Iterate all definitions; order unspecified
    ///
    /// The iterator reflects a snapshot of the tree as it is walked.
    pub fn list(&self) -> impl Iterator<Item = CatalogResult<VirtualizedResource>> + '_ {
        self.tree.iter().map(|entry| {
            let (_, bytes) = entry?;
            let node: CatalogNode = bincode::deserialize(&bytes)?;
            Ok(node.resource)
        })
    }

    /// Number of persisted definitions
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}
