// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Error type for the data virtualization procedure layer

use crate::catalog::CatalogError;
use crate::engine::EngineError;
use thiserror::Error;

/// Errors surfaced by dv procedures
///
/// Catalog and engine failures keep their own taxonomies; this layer
/// only adds the argument and dispatch failures of the procedure
/// surface itself.
#[derive(Error, Debug)]
pub enum DvError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid procedure argument: {0}")]
    InvalidArgument(String),

    #[error("Procedure not found: {0}")]
    UnknownProcedure(String),
}

pub type DvResult<T> = Result<T, DvError>;
