// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! External load engine
//!
//! Turns a `(url, credentials, query, params)` tuple into a lazy
//! sequence of rows or an affected-row count. Wraps the connection
//! pool, binds positional parameters, converts source column values
//! into the host value space, and honors the host termination signal
//! between row emissions and inside long-running statements.

pub mod credentials;
pub mod driver;
pub mod error;
pub mod mapping;
pub mod pool;
pub mod rows;
pub mod sqlite;
pub mod url;

pub use credentials::Credentials;
pub use driver::{DriverRegistry, TabularDriver};
pub use error::{EngineError, EngineResult};
pub use pool::{ConnectionPool, PoolConfig};
pub use rows::{Row, RowStream};
pub use url::SourceUrl;

use crate::value::Value;
use driver::Emit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Host termination signal, checked between row emissions
///
/// Cloned handles share one flag; the host fires it once and every
/// in-flight cursor observes it with bounded latency.
#[derive(Clone, Default)]
pub struct Terminator {
    flag: Arc<AtomicBool>,
}

impl Terminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terminate(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_terminated(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Result of a DML execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateSummary {
    pub count: u64,
}

/// Guard that aborts an in-flight statement when the termination
/// signal fires
///
/// Statements can run long before their first row (large sorts, bulk
/// DML), so between-row checks alone cannot bound cancellation
/// latency. The watcher polls the signal and re-issues the driver
/// interrupt until dropped, so a signal that fires before the
/// statement reaches the driver still lands.
struct CancelWatch {
    stop: Arc<AtomicBool>,
    watcher: Option<std::thread::JoinHandle<()>>,
}

impl CancelWatch {
    const POLL: Duration = Duration::from_millis(10);

    fn spawn(interrupt: Option<Box<dyn Fn() + Send>>, terminator: Terminator) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let watcher = interrupt.map(|interrupt| {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || {
                while !stop.load(Ordering::Acquire) {
                    if terminator.is_terminated() {
                        interrupt();
                    }
                    std::thread::sleep(Self::POLL);
                }
            })
        });
        Self { stop, watcher }
    }
}

impl Drop for CancelWatch {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.watcher.take() {
            let _ = handle.join();
        }
    }
}

/// Count `?` positional holes outside string literals
pub fn count_positional_holes(sql: &str) -> usize {
    let mut count = 0;
    let mut quote: Option<char> = None;
    for ch in sql.chars() {
        match quote {
            Some(q) => {
                if ch == q {
                    quote = None;
                }
            }
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '?' => count += 1,
                _ => {}
            },
        }
    }
    count
}

/// Extraction engine over the connection pool
pub struct LoadEngine {
    pool: Arc<ConnectionPool>,
}

impl LoadEngine {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Stream rows for a SELECT-style query
    ///
    /// Arity is validated before the call reaches the driver. The
    /// returned stream is lazy; the producer thread owns the pooled
    /// connection and releases it on every exit path.
    pub fn rows(
        &self,
        url: &SourceUrl,
        credentials: Option<&Credentials>,
        query: &str,
        params: &[Value],
        terminator: Terminator,
    ) -> EngineResult<RowStream> {
        check_arity(query, params)?;

        let mut conn = self.pool.acquire(url, credentials)?;
        let creds_owned = credentials
            .or_else(|| url.embedded_credentials())
            .cloned();
        let query = query.to_string();
        let params = params.to_vec();
        let redacted_url = url.redacted();

        let (sink, parts) = RowStream::channel();
        let producer = std::thread::spawn(move || {
            let watch = CancelWatch::spawn(conn.driver().interrupter(), terminator.clone());
            let result = conn.driver().for_each_row(&query, &params, &mut |row| {
                if terminator.is_terminated() || sink.is_cancelled() {
                    return Emit::Stop;
                }
                if sink.push(row) {
                    Emit::Continue
                } else {
                    Emit::Stop
                }
            });
            drop(watch);

            match result {
                Ok(()) => {
                    if terminator.is_terminated() {
                        log::debug!("rows: cancelled mid-stream for {}", redacted_url);
                        sink.fail(EngineError::Cancelled);
                    }
                }
                Err(err) => {
                    if connection_indeterminate(&err) {
                        conn.poison();
                    }
                    sink.fail(pool::redact_error(err, creds_owned.as_ref()));
                }
            }
            // conn drops here: released to the pool, or destroyed if poisoned
        });

        Ok(RowStream::new(parts, producer))
    }

    /// Execute a DML statement, returning the affected-row count
    ///
    /// The termination signal aborts a statement still executing
    /// inside the driver.
    pub fn update(
        &self,
        url: &SourceUrl,
        credentials: Option<&Credentials>,
        statement: &str,
        params: &[Value],
        terminator: Terminator,
    ) -> EngineResult<UpdateSummary> {
        check_arity(statement, params)?;

        let mut conn = self.pool.acquire(url, credentials)?;
        let effective = credentials.or_else(|| url.embedded_credentials());
        let watch = CancelWatch::spawn(conn.driver().interrupter(), terminator);
        let result = conn.driver().execute(statement, params);
        drop(watch);
        match result {
            Ok(count) => Ok(UpdateSummary { count }),
            Err(err) => {
                if connection_indeterminate(&err) {
                    conn.poison();
                }
                Err(pool::redact_error(err, effective))
            }
        }
    }
}

fn check_arity(sql: &str, params: &[Value]) -> EngineResult<()> {
    let expected = count_positional_holes(sql);
    if expected != params.len() {
        return Err(EngineError::Arity {
            expected,
            actual: params.len(),
        });
    }
    Ok(())
}

/// Errors after which the connection state cannot be trusted
fn connection_indeterminate(err: &EngineError) -> bool {
    matches!(
        err,
        EngineError::Io(_) | EngineError::Unavailable(_) | EngineError::Cancelled
    )
}
