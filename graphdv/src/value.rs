// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Value type system for virtualized rows and graph properties
//!
//! Columns produced by external sources are mapped into this value
//! space before they become virtual-node properties. Integer and
//! floating columns keep distinct variants; homogeneous array columns
//! map to the typed array variants.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value types for virtualized row columns and virtual-entity properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    DateTimeWithOffset(DateTime<FixedOffset>),
    /// Homogeneous integer array, source order preserved
    IntArray(Vec<i64>),
    /// Homogeneous floating array, source order preserved
    FloatArray(Vec<f64>),
    /// Heterogeneous list (string arrays, nested config values)
    List(Vec<Value>),
    Null,
}

impl Value {
    /// Extract as string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract as integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Extract as float if possible (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Extract as boolean if possible
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Extract as integer array if possible
    pub fn as_int_array(&self) -> Option<&[i64]> {
        match self {
            Value::IntArray(a) => Some(a),
            _ => None,
        }
    }

    /// Extract as floating array if possible
    pub fn as_float_array(&self) -> Option<&[f64]> {
        match self {
            Value::FloatArray(a) => Some(a),
            _ => None,
        }
    }

    /// Extract as list if possible
    pub fn as_list(&self) -> Option<&Vec<Value>> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "String",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::Boolean(_) => "Boolean",
            Value::DateTime(_) => "DateTime",
            Value::DateTimeWithOffset(_) => "DateTimeWithOffset",
            Value::IntArray(_) => "IntArray",
            Value::FloatArray(_) => "FloatArray",
            Value::List(_) => "List",
            Value::Null => "Null",
        }
    }

    /// Convert a JSON value into a graph value
    ///
    /// Config maps and runtime parameters arrive as `serde_json::Value`;
    /// JSON numbers that are exact integers map to `Integer`.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::List(
                map.iter()
                    .map(|(k, v)| Value::List(vec![Value::String(k.clone()), Value::from_json(v)]))
                    .collect(),
            ),
        }
    }

    /// Render the value back into JSON (DTO serialization)
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::json!(i),
            Value::Float(f) => serde_json::json!(f),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::DateTimeWithOffset(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::IntArray(a) => serde_json::json!(a),
            Value::FloatArray(a) => serde_json::json!(a),
            Value::List(l) => serde_json::Value::Array(l.iter().map(Value::to_json).collect()),
            Value::Null => serde_json::Value::Null,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::DateTimeWithOffset(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::IntArray(a) => write!(f, "{:?}", a),
            Value::FloatArray(a) => write!(f, "{:?}", a),
            Value::List(l) => {
                write!(f, "[")?;
                for (i, v) in l.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", v)?;
                }
                write!(f, "]")
            }
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}
