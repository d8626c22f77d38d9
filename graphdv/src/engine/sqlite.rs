// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! SQLite tabular driver
//!
//! The in-tree implementation of [`TabularDriver`]. SQLite sources are
//! path-addressed (`jdbc:sqlite:/data/x.db`, `sqlite::memory:`). The
//! file format carries no account layer, so a supplied credential
//! bundle participates in pool keying but is dropped in-memory rather
//! than injected.

use super::credentials::Credentials;
use super::driver::{DriverConnection, Emit, TabularDriver};
use super::error::{EngineError, EngineResult};
use super::mapping;
use super::rows::Row;
use super::url::SourceUrl;
use crate::value::Value;
use rusqlite::ffi::ErrorCode;
use rusqlite::Connection;

pub struct SqliteDriver;

impl TabularDriver for SqliteDriver {
    fn connect(
        &self,
        url: &SourceUrl,
        _credentials: Option<&Credentials>,
    ) -> EngineResult<Box<dyn DriverConnection>> {
        let conn = Connection::open(url.path()).map_err(map_sqlite_error)?;
        // Concurrent writers on one file wait out the lock instead of
        // surfacing DatabaseBusy
        conn.busy_timeout(std::time::Duration::from_secs(5))
            .map_err(map_sqlite_error)?;
        Ok(Box::new(SqliteConnection { conn }))
    }
}

struct SqliteConnection {
    conn: Connection,
}

impl DriverConnection for SqliteConnection {
    fn ping(&mut self) -> bool {
        self.conn
            .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .is_ok()
    }

    fn execute(&mut self, statement: &str, params: &[Value]) -> EngineResult<u64> {
        let mut stmt = self.conn.prepare(statement).map_err(map_sqlite_error)?;
        let bound: Vec<rusqlite::types::Value> = params.iter().map(mapping::bind_value).collect();
        let count = stmt
            .execute(rusqlite::params_from_iter(bound))
            .map_err(map_sqlite_error)?;
        Ok(count as u64)
    }

    fn for_each_row(
        &mut self,
        query: &str,
        params: &[Value],
        emit: &mut dyn FnMut(Row) -> Emit,
    ) -> EngineResult<()> {
        let mut stmt = self.conn.prepare(query).map_err(map_sqlite_error)?;

        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(|n| n.to_string())
            .collect();
        let decl_types: Vec<Option<String>> = stmt
            .columns()
            .iter()
            .map(|c| c.decl_type().map(|d| d.to_string()))
            .collect();

        let bound: Vec<rusqlite::types::Value> = params.iter().map(mapping::bind_value).collect();
        let mut rows = stmt
            .query(rusqlite::params_from_iter(bound))
            .map_err(map_sqlite_error)?;

        while let Some(raw) = rows.next().map_err(map_sqlite_error)? {
            let mut row = Row::with_columns(names.clone());
            for (i, name) in names.iter().enumerate() {
                let value_ref = raw.get_ref(i).map_err(map_sqlite_error)?;
                let value = mapping::column_value(value_ref, decl_types[i].as_deref())?;
                row.insert(name, value);
            }
            if emit(row) == Emit::Stop {
                break;
            }
        }
        Ok(())
    }

    fn interrupter(&self) -> Option<Box<dyn Fn() + Send>> {
        let handle = self.conn.get_interrupt_handle();
        Some(Box::new(move || handle.interrupt()))
    }
}

/// Map a rusqlite error into the engine failure taxonomy
fn map_sqlite_error(err: rusqlite::Error) -> EngineError {
    match err {
        rusqlite::Error::SqliteFailure(code, msg) => {
            let text = msg.unwrap_or_else(|| code.to_string());
            match code.code {
                ErrorCode::ConstraintViolation => EngineError::Conflict(text),
                ErrorCode::PermissionDenied | ErrorCode::AuthorizationForStatementDenied => {
                    EngineError::Auth(text)
                }
                ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => {
                    EngineError::Unavailable(text)
                }
                ErrorCode::OperationInterrupted => EngineError::Cancelled,
                ErrorCode::TypeMismatch => EngineError::Type(text),
                ErrorCode::NotADatabase => EngineError::Config(text),
                _ if text.contains("syntax error") => EngineError::Syntax(text),
                _ => EngineError::Io(text),
            }
        }
        rusqlite::Error::SqlInputError { msg, .. } => EngineError::Syntax(msg),
        rusqlite::Error::InvalidParameterCount(actual, expected) => {
            EngineError::Arity { expected, actual }
        }
        rusqlite::Error::InvalidColumnType(_, _, _) => EngineError::Type(err.to_string()),
        other => EngineError::Io(other.to_string()),
    }
}
