// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Credential bundle for external sources
//!
//! An opaque carrier whose string rendering is redacted. The raw
//! user/password pair never leaves this type except through the driver
//! injection path.

use serde::Deserialize;
use std::fmt;

/// User/password bundle for an external source
///
/// Supplied either through the `credentials` call-config key or
/// embedded in the connection URL. Both forms digest identically so
/// the connection pool is not fragmented by representation.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// Parse a `{user, password}` bundle from a call-config map
    pub fn from_config(config: &serde_json::Value) -> Option<Credentials> {
        let bundle = config.get("credentials")?;
        let user = bundle.get("user")?.as_str()?.to_string();
        let password = bundle.get("password")?.as_str()?.to_string();
        Some(Credentials { user, password })
    }

    /// Stable digest for pool keying
    ///
    /// Not a security primitive; only distinguishes credential bundles
    /// within one process so a URL-embedded and a separately-supplied
    /// bundle land on the same pool entry.
    pub fn digest(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(self.user.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.password.as_bytes());
        hasher.finalize()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Display for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<redacted credentials>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendering_is_redacted() {
        let creds = Credentials::new("alice", "s3cret");
        assert!(!format!("{:?}", creds).contains("s3cret"));
        assert!(!format!("{:?}", creds).contains("alice"));
        assert!(!format!("{}", creds).contains("s3cret"));
    }

    #[test]
    fn test_digest_is_representation_independent() {
        let a = Credentials::new("test", "test");
        let b = Credentials::new("test".to_string(), "test".to_string());
        assert_eq!(a.digest(), b.digest());
        assert_ne!(a.digest(), Credentials::new("test", "other").digest());
    }

    #[test]
    fn test_from_config() {
        let config = serde_json::json!({
            "credentials": {"user": "u", "password": "p"},
            "schema": "test",
        });
        let creds = Credentials::from_config(&config).unwrap();
        assert_eq!(creds.user, "u");
        assert_eq!(creds.password, "p");
        assert!(Credentials::from_config(&serde_json::json!({})).is_none());
    }
}
