// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data virtualization procedures
//!
//! The orchestration layer over catalog and engine: procedure surface,
//! runtime parameter binding, extraction dispatch, and the extension
//! coordinator that binds everything to the host lifecycle.

pub mod context;
pub mod coordinator;
pub mod error;
pub mod orchestrator;
pub mod procedures;
pub mod registry;

pub use context::ProcedureContext;
pub use coordinator::DvCoordinator;
pub use error::{DvError, DvResult};
pub use orchestrator::{QueryOrchestrator, RuntimeParams, VirtualNodeStream, VirtualPathStream};
pub use procedures::{
    procedure_mode, DataVirtualizationProcedures, ProcedureMode, ProcedureRecord, PROCEDURES,
};
pub use registry::{ExtractionCall, ExtractionProcedure, ExtractionRegistry};
