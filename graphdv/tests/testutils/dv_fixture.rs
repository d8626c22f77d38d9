// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Fixture for data virtualization integration tests
//!
//! Each fixture owns a temporary directory holding an isolated system
//! graph store and one seeded SQLite source file, so tests never
//! interfere with each other.

use graphdv::{DataVirtualizationProcedures, DvCoordinator, ProcedureContext};
use std::path::{Path, PathBuf};

/// Isolated coordinator plus a seeded external source
pub struct DvFixture {
    dv: DvCoordinator,
    source_path: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl DvFixture {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = tempfile::tempdir()?;
        let source_path = temp_dir.path().join("source.db");
        seed_source(&source_path)?;
        let dv = DvCoordinator::from_path(temp_dir.path().join("system"))?;
        Ok(DvFixture {
            dv,
            source_path,
            _temp_dir: temp_dir,
        })
    }

    pub fn dv(&self) -> &DvCoordinator {
        &self.dv
    }

    pub fn procedures(&self) -> &DataVirtualizationProcedures {
        self.dv.procedures()
    }

    pub fn ctx(&self) -> ProcedureContext {
        ProcedureContext::new()
    }

    /// Path of the seeded source file, for direct seeding of extra data
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Connection URL of the seeded source
    pub fn source_url(&self) -> String {
        format!("jdbc:sqlite:{}", self.source_path.display())
    }

    /// Config for a resource over the seeded PERSON table
    pub fn people_config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "TABULAR",
            "url": self.source_url(),
            "query": "SELECT * FROM PERSON WHERE NAME = ?",
            "params": ["name"],
            "labels": ["Person"],
        })
    }

    /// Config for a resource over the seeded ARRAY_TABLE
    pub fn arrays_config(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "TABULAR",
            "url": self.source_url(),
            "query": "SELECT * FROM ARRAY_TABLE WHERE NAME = ?",
            "params": ["name"],
            "labels": ["ArrayRow"],
        })
    }

    /// Register the "people" resource and return its DTO
    pub fn add_people(&self) -> graphdv::catalog::VirtualizedResourceDto {
        self.procedures()
            .add("people", &self.people_config())
            .expect("Failed to register people resource")
    }
}

/// Seed the external SQLite source shared by the integration tests
pub fn seed_source(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch(
        "CREATE TABLE PERSON (NAME TEXT, SURNAME TEXT);
         INSERT INTO PERSON (NAME, SURNAME) VALUES ('John', NULL);
         INSERT INTO PERSON (NAME, SURNAME) VALUES ('Jane', 'Roe');
         CREATE TABLE ARRAY_TABLE (NAME TEXT, INT_VALUES INT ARRAY, DOUBLE_VALUES DOUBLE ARRAY);
         INSERT INTO ARRAY_TABLE VALUES ('John', '{1,2,3}', '{1.0,2.0,3.0}');
         INSERT INTO ARRAY_TABLE VALUES ('Whole', '{4,5,6}', '{1,2,3}');",
    )?;
    Ok(())
}
