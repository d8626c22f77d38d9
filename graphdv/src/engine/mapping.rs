// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Source-to-host value mapping
//!
//! Converts driver column values into the crate value space. Declared
//! column types steer the decode: array-declared columns (`INT[]`,
//! `DOUBLE[]`, anything containing `ARRAY`) are decoded into typed
//! homogeneous arrays, temporal-declared columns into instants.
//!
//! Known limitation carried forward from the JDBC lineage: the SQLite
//! driver has no offset-bearing column affinity, so a
//! timestamp-with-timezone column round-trips as text. Text that
//! carries an RFC 3339 offset is preserved as `DateTimeWithOffset`;
//! offset-less timestamp text is surfaced as a UTC instant rather than
//! silently normalized to session time.

use super::error::{EngineError, EngineResult};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rusqlite::types::ValueRef;

/// Map one driver column value into the host value space
pub fn column_value(raw: ValueRef<'_>, decl_type: Option<&str>) -> EngineResult<Value> {
    let decl = decl_type.map(|d| d.to_ascii_uppercase()).unwrap_or_default();
    match raw {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => {
            if decl.contains("BOOL") {
                Ok(Value::Boolean(i != 0))
            } else {
                Ok(Value::Integer(i))
            }
        }
        ValueRef::Real(f) => Ok(Value::Float(f)),
        ValueRef::Text(bytes) => {
            let text = std::str::from_utf8(bytes)
                .map_err(|_| EngineError::Type("non-utf8 text column".to_string()))?;
            if is_array_decl(&decl) {
                decode_array(text, &decl)
            } else if is_temporal_decl(&decl) {
                Ok(decode_temporal(text))
            } else {
                Ok(Value::String(text.to_string()))
            }
        }
        // Raw byte columns surface as integer sequences
        ValueRef::Blob(bytes) => Ok(Value::IntArray(bytes.iter().map(|b| *b as i64).collect())),
    }
}

/// Convert a host value into a driver bind value
pub fn bind_value(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as Sql;
    match value {
        Value::String(s) => Sql::Text(s.clone()),
        Value::Integer(i) => Sql::Integer(*i),
        Value::Float(f) => Sql::Real(*f),
        Value::Boolean(b) => Sql::Integer(*b as i64),
        Value::DateTime(dt) => Sql::Text(dt.to_rfc3339()),
        Value::DateTimeWithOffset(dt) => Sql::Text(dt.to_rfc3339()),
        Value::IntArray(a) => Sql::Text(array_literal(a.iter().map(|v| v.to_string()))),
        Value::FloatArray(a) => Sql::Text(array_literal(a.iter().map(|v| v.to_string()))),
        Value::List(l) => Sql::Text(array_literal(l.iter().map(|v| v.to_string()))),
        Value::Null => Sql::Null,
    }
}

fn array_literal(items: impl Iterator<Item = String>) -> String {
    format!("{{{}}}", items.collect::<Vec<_>>().join(","))
}

fn is_array_decl(decl: &str) -> bool {
    decl.ends_with("[]") || decl.contains("ARRAY")
}

fn is_temporal_decl(decl: &str) -> bool {
    decl.contains("DATE") || decl.contains("TIME")
}

/// Decode an array column payload into a typed homogeneous array
///
/// Accepts Postgres-style literals (`{1,2,3}`) and JSON (`[1,2,3]`).
/// The declared element type selects the target variant: a floating
/// declaration yields `FloatArray` even when every element is a whole
/// number, an integer declaration yields `IntArray`. Without a numeric
/// declaration the elements are classified by content; mixed element
/// types are refused.
fn decode_array(text: &str, decl: &str) -> EngineResult<Value> {
    let trimmed = text.trim();
    let tokens: Vec<String> = if trimmed.starts_with('{') && trimmed.ends_with('}') {
        let inner = &trimmed[1..trimmed.len() - 1];
        if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|t| t.trim().to_string()).collect()
        }
    } else if trimmed.starts_with('[') {
        let parsed: serde_json::Value = serde_json::from_str(trimmed)
            .map_err(|e| EngineError::Type(format!("malformed array payload: {}", e)))?;
        match parsed {
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    serde_json::Value::Number(n) => Ok(n.to_string()),
                    serde_json::Value::String(s) => Ok(s.clone()),
                    other => Err(EngineError::Type(format!(
                        "unsupported array element: {}",
                        other
                    ))),
                })
                .collect::<EngineResult<Vec<_>>>()?,
            _ => return Err(EngineError::Type("array payload is not an array".to_string())),
        }
    } else {
        return Err(EngineError::Type(
            "array-declared column with non-array payload".to_string(),
        ));
    };

    if decl.contains("DOUBLE") || decl.contains("FLOAT") || decl.contains("REAL") {
        return float_array(&tokens);
    }
    if decl.contains("INT") {
        return int_array(&tokens);
    }
    classify_elements(&tokens)
}

fn float_array(tokens: &[String]) -> EngineResult<Value> {
    tokens
        .iter()
        .map(|t| {
            t.parse::<f64>().map_err(|_| {
                EngineError::Type(format!(
                    "non-numeric element '{}' in floating array column",
                    t
                ))
            })
        })
        .collect::<EngineResult<Vec<_>>>()
        .map(Value::FloatArray)
}

fn int_array(tokens: &[String]) -> EngineResult<Value> {
    tokens
        .iter()
        .map(|t| {
            t.parse::<i64>().map_err(|_| {
                EngineError::Type(format!(
                    "non-integer element '{}' in integer array column",
                    t
                ))
            })
        })
        .collect::<EngineResult<Vec<_>>>()
        .map(Value::IntArray)
}

/// Classify string tokens into IntArray / FloatArray / string List
fn classify_elements(tokens: &[String]) -> EngineResult<Value> {
    if tokens.is_empty() {
        return Ok(Value::List(Vec::new()));
    }

    let all_int = tokens.iter().all(|t| t.parse::<i64>().is_ok());
    if all_int {
        return Ok(Value::IntArray(
            tokens.iter().map(|t| t.parse::<i64>().unwrap()).collect(),
        ));
    }

    let all_float = tokens.iter().all(|t| t.parse::<f64>().is_ok());
    if all_float {
        return Ok(Value::FloatArray(
            tokens.iter().map(|t| t.parse::<f64>().unwrap()).collect(),
        ));
    }

    let any_numeric = tokens.iter().any(|t| t.parse::<f64>().is_ok());
    if any_numeric {
        return Err(EngineError::Type(
            "mixed-type array column refused".to_string(),
        ));
    }

    Ok(Value::List(
        tokens
            .iter()
            .map(|t| Value::String(t.trim_matches('"').to_string()))
            .collect(),
    ))
}

/// Decode temporal text, preserving a source offset when present
///
/// Unparseable temporal text falls through as a string so the caller
/// sees the raw payload instead of a lossy coercion.
fn decode_temporal(text: &str) -> Value {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Value::DateTimeWithOffset(dt);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Value::DateTime(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Value::DateTime(Utc.from_utc_datetime(&naive));
        }
    }
    Value::String(text.to_string())
}
