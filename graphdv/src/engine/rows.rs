// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Lazy row streaming
//!
//! A [`RowStream`] is fed by a producer thread that owns the pooled
//! connection and its cursor. The channel between producer and
//! consumer is bounded, so the cursor advances at most a fixed window
//! ahead of the consumer's pulls. Closing the stream (explicitly or by
//! drop) stops the producer, closes the cursor, and releases the
//! connection on every exit path.

use super::error::{EngineError, EngineResult};
use crate::value::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvError, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Bounded window the cursor may run ahead of the consumer
pub(crate) const STREAM_WINDOW: usize = 64;

/// One row produced by an external source
///
/// Column names are preserved exactly as the source metadata reports
/// them; iteration order follows the source column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: HashMap<String, Value>,
}

impl Row {
    /// Create an empty row with a known column order
    pub fn with_columns(columns: Vec<String>) -> Self {
        Self {
            values: HashMap::with_capacity(columns.len()),
            columns,
        }
    }

    /// Set a column value
    ///
    /// A duplicate column name (`SELECT a, a`) resolves to a single
    /// map entry and the last value wins, matching map-shaped row
    /// semantics. Sources that need both values must alias the
    /// columns apart.
    pub fn insert(&mut self, column: &str, value: Value) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        self.values.insert(column.to_string(), value);
    }

    /// Get a column value by name (case preserved)
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// Column names in source order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Consume the row into a property map
    pub fn into_values(self) -> HashMap<String, Value> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Sending half of a row stream, held by the producer thread
pub(crate) struct RowSink {
    sender: SyncSender<EngineResult<Row>>,
    cancel: Arc<AtomicBool>,
}

impl RowSink {
    /// Push a row; false means the consumer is gone or cancelled
    pub(crate) fn push(&self, row: Row) -> bool {
        if self.cancel.load(Ordering::Acquire) {
            return false;
        }
        self.sender.send(Ok(row)).is_ok()
    }

    /// Push a terminal error (best effort, consumer may be gone)
    pub(crate) fn fail(&self, err: EngineError) {
        let _ = self.sender.send(Err(err));
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

/// Lazy sequence of rows from one extraction call
///
/// Implements `Iterator`; exhausting, dropping, or calling
/// [`RowStream::close`] all release the underlying cursor and
/// connection deterministically.
pub struct RowStream {
    receiver: Receiver<EngineResult<Row>>,
    cancel: Arc<AtomicBool>,
    producer: Option<JoinHandle<()>>,
    done: bool,
}

impl RowStream {
    /// Wire up a stream and its producer-side sink
    pub(crate) fn channel() -> (RowSink, StreamParts) {
        let (sender, receiver) = std::sync::mpsc::sync_channel(STREAM_WINDOW);
        let cancel = Arc::new(AtomicBool::new(false));
        let sink = RowSink {
            sender,
            cancel: Arc::clone(&cancel),
        };
        (sink, StreamParts { receiver, cancel })
    }

    pub(crate) fn new(parts: StreamParts, producer: JoinHandle<()>) -> Self {
        Self {
            receiver: parts.receiver,
            cancel: parts.cancel,
            producer: Some(producer),
            done: false,
        }
    }

    /// Stream that fails with a single error before yielding any row
    pub fn failed(err: EngineError) -> Self {
        let (sink, parts) = Self::channel();
        sink.fail(err);
        drop(sink);
        Self {
            receiver: parts.receiver,
            cancel: parts.cancel,
            producer: None,
            done: false,
        }
    }

    /// Stop the producer and release the cursor and connection
    ///
    /// Safe to call more than once; also invoked on drop.
    pub fn close(&mut self) {
        self.done = true;
        self.cancel.store(true, Ordering::Release);
        // Unblock a producer parked on the bounded channel
        while self.receiver.try_recv().is_ok() {}
        if let Some(handle) = self.producer.take() {
            while !handle.is_finished() {
                while self.receiver.try_recv().is_ok() {}
                std::thread::yield_now();
            }
            let _ = handle.join();
        }
    }
}

pub(crate) struct StreamParts {
    receiver: Receiver<EngineResult<Row>>,
    cancel: Arc<AtomicBool>,
}

impl Iterator for RowStream {
    type Item = EngineResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.receiver.recv() {
            Ok(item) => {
                if item.is_err() {
                    self.done = true;
                }
                Some(item)
            }
            Err(RecvError) => {
                self.done = true;
                if let Some(handle) = self.producer.take() {
                    let _ = handle.join();
                }
                None
            }
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.close();
    }
}
