// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! External load engine tests
//!
//! Exercises row streaming and DML execution against a real SQLite
//! source file: parameter binding, typed array decoding, error
//! classification, cancellation, and connection release.

#[path = "testutils/mod.rs"]
mod testutils;

use graphdv::engine::{EngineError, SourceUrl, Terminator};
use graphdv::Value;
use std::time::{Duration, Instant};
use testutils::dv_fixture::DvFixture;

#[test]
fn test_rows_with_positional_param() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");

    let rows: Vec<_> = fixture
        .dv()
        .engine()
        .rows(
            &url,
            None,
            "SELECT NAME, SURNAME FROM PERSON WHERE NAME = ?",
            &[Value::from("John")],
            Terminator::new(),
        )
        .expect("Failed to open row stream")
        .collect::<Result<_, _>>()
        .expect("Row stream failed");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("NAME"), Some(&Value::String("John".to_string())));
    assert_eq!(rows[0].get("SURNAME"), Some(&Value::Null));
    assert_eq!(
        rows[0].columns(),
        &["NAME".to_string(), "SURNAME".to_string()]
    );
}

#[test]
fn test_update_reports_affected_count() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");
    let engine = fixture.dv().engine();

    let summary = engine
        .update(
            &url,
            None,
            "UPDATE PERSON SET SURNAME = ? WHERE NAME = ?",
            &[Value::from("Doe"), Value::from("John")],
            Terminator::new(),
        )
        .expect("Failed to execute update");
    assert_eq!(summary.count, 1);

    let rows: Vec<_> = engine
        .rows(
            &url,
            None,
            "SELECT SURNAME FROM PERSON WHERE NAME = ?",
            &[Value::from("John")],
            Terminator::new(),
        )
        .expect("Failed to open row stream")
        .collect::<Result<_, _>>()
        .expect("Row stream failed");
    assert_eq!(rows[0].get("SURNAME"), Some(&Value::String("Doe".to_string())));
}

#[test]
fn test_array_columns_decode_to_typed_arrays() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");

    let rows: Vec<_> = fixture
        .dv()
        .engine()
        .rows(
            &url,
            None,
            "SELECT * FROM ARRAY_TABLE WHERE NAME = ?",
            &[Value::from("John")],
            Terminator::new(),
        )
        .expect("Failed to open row stream")
        .collect::<Result<_, _>>()
        .expect("Row stream failed");
    assert_eq!(rows.len(), 1);

    let ints = rows[0]
        .get("INT_VALUES")
        .and_then(Value::as_int_array)
        .expect("INT_VALUES should decode to an integer array");
    assert_eq!(ints, &[1, 2, 3]);

    let floats = rows[0]
        .get("DOUBLE_VALUES")
        .and_then(Value::as_float_array)
        .expect("DOUBLE_VALUES should decode to a floating array");
    assert_eq!(floats.len(), 3);
    for (actual, expected) in floats.iter().zip([1.0, 2.0, 3.0]) {
        assert!((actual - expected).abs() < 0.01, "got {:?}", floats);
    }
}

#[test]
fn test_double_declared_array_of_whole_numbers_stays_floating() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");

    let rows: Vec<_> = fixture
        .dv()
        .engine()
        .rows(
            &url,
            None,
            "SELECT * FROM ARRAY_TABLE WHERE NAME = ?",
            &[Value::from("Whole")],
            Terminator::new(),
        )
        .expect("Failed to open row stream")
        .collect::<Result<_, _>>()
        .expect("Row stream failed");
    assert_eq!(rows.len(), 1);

    // whole-number payload in a DOUBLE-declared column keeps the
    // floating variant
    assert_eq!(
        rows[0].get("DOUBLE_VALUES"),
        Some(&Value::FloatArray(vec![1.0, 2.0, 3.0]))
    );
    assert_eq!(
        rows[0].get("INT_VALUES"),
        Some(&Value::IntArray(vec![4, 5, 6]))
    );
}

#[test]
fn test_arity_mismatch_rejected_before_execution() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");

    let err = fixture
        .dv()
        .engine()
        .rows(
            &url,
            None,
            "SELECT * FROM PERSON WHERE NAME = ?",
            &[],
            Terminator::new(),
        )
        .err()
        .expect("arity mismatch should fail eagerly");
    assert!(
        matches!(
            err,
            EngineError::Arity {
                expected: 1,
                actual: 0
            }
        ),
        "got {:?}",
        err
    );
}

#[test]
fn test_syntax_error_surfaces_in_stream() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");

    let mut stream = fixture
        .dv()
        .engine()
        .rows(&url, None, "SELEC * FROM PERSON", &[], Terminator::new())
        .expect("stream opens; the statement fails at prepare");
    let first = stream.next().expect("stream should carry the failure");
    assert!(matches!(first, Err(EngineError::Syntax(_))), "got {:?}", first);
    assert!(stream.next().is_none(), "errors are terminal");
}

#[test]
fn test_repeated_reads_are_consistent() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");
    let engine = fixture.dv().engine();

    let read = || -> Vec<String> {
        engine
            .rows(
                &url,
                None,
                "SELECT NAME FROM PERSON ORDER BY NAME",
                &[],
                Terminator::new(),
            )
            .expect("Failed to open row stream")
            .collect::<Result<Vec<_>, _>>()
            .expect("Row stream failed")
            .into_iter()
            .filter_map(|row| row.get("NAME").and_then(|v| v.as_string().map(String::from)))
            .collect()
    };

    let first = read();
    let second = read();
    assert_eq!(first, vec!["Jane".to_string(), "John".to_string()]);
    assert_eq!(first, second);
}

#[test]
fn test_connection_released_after_stream_end() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");
    let engine = fixture.dv().engine();

    let rows: Vec<_> = engine
        .rows(&url, None, "SELECT * FROM PERSON", &[], Terminator::new())
        .expect("Failed to open row stream")
        .collect();
    assert_eq!(rows.len(), 2);

    assert_eq!(engine.pool().borrowed_count(&url), 0);
    assert_eq!(engine.pool().idle_count(&url), 1);
}

#[test]
fn test_early_drop_releases_connection() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");
    let engine = fixture.dv().engine();

    let mut stream = engine
        .rows(&url, None, "SELECT * FROM PERSON", &[], Terminator::new())
        .expect("Failed to open row stream");
    let _first = stream.next();
    drop(stream);

    assert_eq!(engine.pool().borrowed_count(&url), 0);
}

#[test]
fn test_termination_aborts_statement_before_first_row() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");

    // an aggregate that churns for a long time before emitting its
    // single row
    let terminator = Terminator::new();
    let mut stream = fixture
        .dv()
        .engine()
        .rows(
            &url,
            None,
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 200000000) \
             SELECT COUNT(*) AS N FROM c",
            &[],
            terminator.clone(),
        )
        .expect("Failed to open row stream");

    let signal = terminator.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        signal.terminate();
    });

    let started = Instant::now();
    let first = stream.next().expect("stream should carry the cancellation");
    assert!(
        matches!(first, Err(EngineError::Cancelled)),
        "got {:?}",
        first
    );
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "cancellation took {:?}",
        started.elapsed()
    );
}

#[test]
fn test_update_honors_termination() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");
    let engine = fixture.dv().engine();

    engine
        .update(
            &url,
            None,
            "CREATE TABLE BULK (X INTEGER)",
            &[],
            Terminator::new(),
        )
        .expect("Failed to create BULK");

    let terminator = Terminator::new();
    terminator.terminate();
    let started = Instant::now();
    let err = engine
        .update(
            &url,
            None,
            "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 200000000) \
             INSERT INTO BULK SELECT x FROM c",
            &[],
            terminator,
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::Cancelled), "got {:?}", err);
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "cancellation took {:?}",
        started.elapsed()
    );
}

#[test]
fn test_termination_cancels_stream_with_bounded_latency() {
    let fixture = DvFixture::new().expect("Failed to create test fixture");
    let url = SourceUrl::parse(&fixture.source_url()).expect("Failed to parse source url");

    // a source large enough that the producer cannot finish inside the
    // channel window
    {
        let conn =
            rusqlite::Connection::open(fixture.source_path()).expect("Failed to open source");
        conn.execute_batch("CREATE TABLE EVENTS (ID INTEGER PRIMARY KEY)")
            .expect("Failed to create EVENTS");
        let mut stmt = conn
            .prepare("INSERT INTO EVENTS (ID) VALUES (?)")
            .expect("Failed to prepare insert");
        for i in 0..5000i64 {
            stmt.execute([i]).expect("Failed to insert event");
        }
    }

    let terminator = Terminator::new();
    let stream = fixture
        .dv()
        .engine()
        .rows(
            &url,
            None,
            "SELECT ID FROM EVENTS ORDER BY ID",
            &[],
            terminator.clone(),
        )
        .expect("Failed to open row stream");

    let mut consumed = 0usize;
    let mut cancelled = false;
    for item in stream {
        match item {
            Ok(_) => {
                consumed += 1;
                if consumed == 1 {
                    terminator.terminate();
                }
            }
            Err(EngineError::Cancelled) => {
                cancelled = true;
                break;
            }
            Err(other) => panic!("unexpected stream error: {:?}", other),
        }
    }

    assert!(cancelled, "stream should end with a cancellation error");
    // only rows already in flight inside the channel window arrive
    assert!(consumed < 200, "consumed {} rows after termination", consumed);
    assert_eq!(fixture.dv().engine().pool().borrowed_count(&url), 0);
}
