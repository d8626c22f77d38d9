// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Process-wide connection pool
//!
//! Pool entries are keyed by `(normalized-url, credential-digest)`.
//! Each key holds at most one idle connection and a borrow count, and
//! is guarded by its own mutex. Checkout verifies liveness with the
//! driver ping; dead or stale idles are destroyed and reconstructed.
//! Borrowed connections are tracked so a drain leaves no dangling
//! handles behind.

use super::credentials::Credentials;
use super::driver::{DriverConnection, DriverRegistry};
use super::error::{EngineError, EngineResult};
use super::url::SourceUrl;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pool tuning knobs
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Idle entries older than this are destroyed at checkout
    pub idle_deadline: Duration,
    /// Bounded reconnect attempts before surfacing UNAVAILABLE
    pub connect_retries: u32,
    /// Pause between reconnect attempts
    pub retry_backoff: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            idle_deadline: Duration::from_secs(60),
            connect_retries: 3,
            retry_backoff: Duration::from_millis(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    url: String,
    credential_digest: u32,
}

impl PoolKey {
    fn new(url: &SourceUrl, credentials: Option<&Credentials>) -> Self {
        Self {
            url: url.normalized(),
            credential_digest: credentials.map(Credentials::digest).unwrap_or(0),
        }
    }
}

struct IdleEntry {
    conn: Box<dyn DriverConnection>,
    since: Instant,
}

#[derive(Default)]
struct Slot {
    idle: Option<IdleEntry>,
    borrowed: usize,
}

/// Connection provider with per-key pooling
///
/// The only process-wide mutable state in the extension; its lifecycle
/// is bound to extension init/teardown.
pub struct ConnectionPool {
    registry: Arc<DriverRegistry>,
    config: PoolConfig,
    slots: Mutex<HashMap<PoolKey, Arc<Mutex<Slot>>>>,
}

impl ConnectionPool {
    pub fn new(registry: Arc<DriverRegistry>, config: PoolConfig) -> Self {
        Self {
            registry,
            config,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire a live connection for `(url, credentials)`
    ///
    /// Reuses the idle connection for the key when it passes the
    /// liveness probe; otherwise connects fresh with bounded retries.
    /// Credentials embedded in the URL are honored unless an explicit
    /// bundle overrides them.
    pub fn acquire(
        &self,
        url: &SourceUrl,
        credentials: Option<&Credentials>,
    ) -> EngineResult<PooledConnection> {
        let effective = credentials.or_else(|| url.embedded_credentials());
        let key = PoolKey::new(url, effective);
        let slot = self.slot(&key);

        {
            let mut guard = slot.lock();
            if let Some(entry) = guard.idle.take() {
                if entry.since.elapsed() <= self.config.idle_deadline {
                    let mut conn = entry.conn;
                    if conn.ping() {
                        guard.borrowed += 1;
                        return Ok(PooledConnection {
                            conn: Some(conn),
                            slot: Arc::clone(&slot),
                            poisoned: false,
                        });
                    }
                    log::debug!("pool: dead idle connection destroyed for {}", url);
                } else {
                    log::debug!("pool: stale idle connection reclaimed for {}", url);
                }
                // entry dropped here, either way
            }
        }

        let conn = self.connect_with_retries(url, effective)?;
        let mut guard = slot.lock();
        guard.borrowed += 1;
        Ok(PooledConnection {
            conn: Some(conn),
            slot: Arc::clone(&slot),
            poisoned: false,
        })
    }

    fn connect_with_retries(
        &self,
        url: &SourceUrl,
        credentials: Option<&Credentials>,
    ) -> EngineResult<Box<dyn DriverConnection>> {
        let driver = self.registry.resolve(url)?;
        let mut attempt = 0;
        loop {
            match driver.connect(url, credentials) {
                Ok(conn) => return Ok(conn),
                Err(EngineError::Unavailable(msg)) if attempt < self.config.connect_retries => {
                    attempt += 1;
                    log::warn!(
                        "pool: connect attempt {} failed for {}: {}",
                        attempt,
                        url,
                        redact(&msg, credentials)
                    );
                    std::thread::sleep(self.config.retry_backoff);
                }
                Err(err) => return Err(redact_error(err, credentials)),
            }
        }
    }

    fn slot(&self, key: &PoolKey) -> Arc<Mutex<Slot>> {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry(key.clone()).or_default())
    }

    /// Destroy every pooled entry for a URL (all credential digests)
    ///
    /// Used on resource unregistration; idle connections are closed
    /// immediately, borrowed ones die on release because their slot is
    /// no longer registered.
    pub fn drain(&self, url: &SourceUrl) {
        let normalized = url.normalized();
        let mut slots = self.slots.lock();
        slots.retain(|key, slot| {
            if key.url == normalized {
                slot.lock().idle = None;
                false
            } else {
                true
            }
        });
    }

    /// Destroy all pooled entries (extension teardown)
    pub fn shutdown(&self) {
        let mut slots = self.slots.lock();
        for slot in slots.values() {
            slot.lock().idle = None;
        }
        slots.clear();
    }

    /// Idle connection count for a URL across credential digests
    pub fn idle_count(&self, url: &SourceUrl) -> usize {
        let normalized = url.normalized();
        let slots = self.slots.lock();
        slots
            .iter()
            .filter(|(key, _)| key.url == normalized)
            .filter(|(_, slot)| slot.lock().idle.is_some())
            .count()
    }

    /// Outstanding borrowed connections for a URL
    pub fn borrowed_count(&self, url: &SourceUrl) -> usize {
        let normalized = url.normalized();
        let slots = self.slots.lock();
        slots
            .iter()
            .filter(|(key, _)| key.url == normalized)
            .map(|(_, slot)| slot.lock().borrowed)
            .sum()
    }
}

/// Borrowed connection; returns to its slot on drop
pub struct PooledConnection {
    conn: Option<Box<dyn DriverConnection>>,
    slot: Arc<Mutex<Slot>>,
    poisoned: bool,
}

impl PooledConnection {
    /// Access the underlying driver connection
    pub fn driver(&mut self) -> &mut dyn DriverConnection {
        // Invariant: conn is only taken in Drop
        self.conn
            .as_mut()
            .expect("pooled connection present until drop")
            .as_mut()
    }

    /// Mark the connection as unusable; it is destroyed instead of
    /// returned to the pool
    pub fn poison(&mut self) {
        self.poisoned = true;
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let mut guard = self.slot.lock();
        guard.borrowed = guard.borrowed.saturating_sub(1);
        if let Some(conn) = self.conn.take() {
            if !self.poisoned && guard.idle.is_none() {
                guard.idle = Some(IdleEntry {
                    conn,
                    since: Instant::now(),
                });
            }
            // otherwise the connection drops here
        }
    }
}

/// Strip credential material from a driver message
fn redact(message: &str, credentials: Option<&Credentials>) -> String {
    let mut out = message.to_string();
    if let Some(creds) = credentials {
        if !creds.password.is_empty() {
            out = out.replace(&creds.password, "***");
        }
        if !creds.user.is_empty() {
            out = out.replace(&creds.user, "***");
        }
    }
    out
}

/// Redact the message payload of an engine error
pub(crate) fn redact_error(err: EngineError, credentials: Option<&Credentials>) -> EngineError {
    match err {
        EngineError::Config(m) => EngineError::Config(redact(&m, credentials)),
        EngineError::Auth(m) => EngineError::Auth(redact(&m, credentials)),
        EngineError::Syntax(m) => EngineError::Syntax(redact(&m, credentials)),
        EngineError::Conflict(m) => EngineError::Conflict(redact(&m, credentials)),
        EngineError::Io(m) => EngineError::Io(redact(&m, credentials)),
        EngineError::Unavailable(m) => EngineError::Unavailable(redact(&m, credentials)),
        EngineError::Type(m) => EngineError::Type(redact(&m, credentials)),
        other => other,
    }
}
