//! Active runtime query tests.
//!
//! Covers every outcome of `BrokerClient::query_active_runtime`: no cursor,
//! empty cursor, found with and without a functions table, and a failing
//! resolver. Each path must log exactly once and release the cursor once.

#[path = "../common/mod.rs"]
mod common;

use common::{
    active_row, active_row_with, at_level, capture_logs, ScriptedResolver, ABI, LIBRARY, LIB_DIR,
    PACKAGE,
};
use tracing::Level;
use xrbroker::client::{ActiveRuntime, BrokerClient, RuntimeLookup, LOG_TAG};
use xrbroker::contract::{active_runtime, BrokerType};
use xrbroker::cursor::MatrixCursor;
use xrbroker::resolver::{from_fn, QueryError};

#[test]
fn test_null_cursor_is_absent() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| Ok(None)));

    let (lookup, events) =
        capture_logs(|| client.query_active_runtime(BrokerType::Installable, 1, ABI));

    assert_eq!(lookup, RuntimeLookup::Absent);
    let info = at_level(&events, Level::INFO);
    assert_eq!(info.len(), 1);
    assert!(info[0].message.contains("null cursor"));
    assert_eq!(info[0].tag.as_deref(), Some(LOG_TAG));
    assert!(at_level(&events, Level::ERROR).is_empty());
}

#[test]
fn test_empty_cursor_is_absent() {
    let resolver = ScriptedResolver::new(|_, projection| {
        Ok(Some(MatrixCursor::new(projection.iter().copied())))
    });
    let client = BrokerClient::new(resolver);

    let (lookup, events) =
        capture_logs(|| client.query_active_runtime(BrokerType::System, 1, ABI));

    assert_eq!(lookup, RuntimeLookup::Absent);
    let info = at_level(&events, Level::INFO);
    assert_eq!(info.len(), 1);
    assert!(info[0].message.contains("non-null but empty cursor"));
    assert_eq!(client.resolver().close_counts(), vec![1]);
}

#[test]
fn test_found_with_functions() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| {
        Ok(Some(active_row(PACKAGE, LIBRARY, 1)))
    }));

    let summary = client.describe_active_runtime(BrokerType::Installable, 1, ABI);

    insta::assert_snapshot!(
        summary.unwrap(),
        @"Found runtime so libexample.so in package com.example.runtime with function/symbol mapping defined"
    );
}

#[test]
fn test_found_without_functions() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| {
        Ok(Some(active_row(PACKAGE, LIBRARY, 0)))
    }));

    let (lookup, events) =
        capture_logs(|| client.query_active_runtime(BrokerType::Installable, 1, ABI));

    assert_eq!(
        lookup,
        RuntimeLookup::Found(ActiveRuntime {
            id: 0,
            package_name: PACKAGE.to_string(),
            native_lib_dir: LIB_DIR.to_string(),
            so_filename: LIBRARY.to_string(),
            has_functions: false,
        })
    );
    assert!(lookup
        .summary()
        .unwrap()
        .ends_with("with no function/symbol mapping changes"));
    assert!(at_level(&events, Level::INFO).is_empty());
    assert!(at_level(&events, Level::ERROR).is_empty());
}

#[test]
fn test_only_one_means_has_functions() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| {
        Ok(Some(active_row(PACKAGE, LIBRARY, 2)))
    }));
    let runtime = client
        .query_active_runtime(BrokerType::Installable, 1, ABI)
        .into_runtime()
        .unwrap();
    assert!(!runtime.has_functions);
}

#[test]
fn test_resolver_failure_is_logged_and_absent() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| {
        Err(QueryError::PermissionDenied(
            "Permission Denial: opening provider".to_string(),
        ))
    }));

    let (lookup, events) =
        capture_logs(|| client.query_active_runtime(BrokerType::System, 1, ABI));

    assert_eq!(lookup, RuntimeLookup::Absent);
    let errors = at_level(&events, Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .starts_with("exception when searching for runtime:"));
    assert!(errors[0].message.contains("Permission Denial: opening provider"));
    assert_eq!(errors[0].tag.as_deref(), Some(LOG_TAG));
    assert_eq!(errors[0].field("decode"), Some("false"));
    assert!(at_level(&events, Level::INFO).is_empty());
}

#[test]
fn test_transport_failure_is_flagged() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| {
        Err(QueryError::SpawnFailed(std::io::Error::from(
            std::io::ErrorKind::NotFound,
        )))
    }));

    let (lookup, events) =
        capture_logs(|| client.query_active_runtime(BrokerType::Installable, 1, ABI));

    assert_eq!(lookup, RuntimeLookup::Absent);
    let errors = at_level(&events, Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .message
        .starts_with("exception when searching for runtime: failed to start broker transport"));
    assert_eq!(errors[0].field("transport"), Some("true"));
    assert_eq!(errors[0].field("decode"), Some("false"));
}

#[test]
fn test_decode_failure_releases_cursor() {
    // No so_filename column.
    let resolver = ScriptedResolver::new(|_, _| {
        Ok(Some(
            MatrixCursor::new(["_id", "package_name", "native_lib_dir", "has_functions"])
                .with_row(["0", PACKAGE, LIB_DIR, "1"])?,
        ))
    });
    let client = BrokerClient::new(resolver);

    let (lookup, events) =
        capture_logs(|| client.query_active_runtime(BrokerType::Installable, 1, ABI));

    assert_eq!(lookup, RuntimeLookup::Absent);
    let errors = at_level(&events, Level::ERROR);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("so_filename"));
    assert_eq!(errors[0].field("decode"), Some("true"));
    assert_eq!(errors[0].field("transport"), Some("false"));
    assert_eq!(client.resolver().close_counts(), vec![1]);
}

#[test]
fn test_type_mismatch_is_absent() {
    let resolver = ScriptedResolver::new(|_, _| {
        Ok(Some(
            MatrixCursor::new(active_runtime::PROJECTION)
                .with_row(["0", PACKAGE, LIB_DIR, LIBRARY, "yes"])?,
        ))
    });
    let client = BrokerClient::new(resolver);

    let (lookup, events) =
        capture_logs(|| client.query_active_runtime(BrokerType::Installable, 1, ABI));

    assert!(!lookup.is_found());
    assert_eq!(at_level(&events, Level::ERROR).len(), 1);
    assert_eq!(client.resolver().close_counts(), vec![1]);
}

#[test]
fn test_column_order_does_not_matter() {
    let reversed: Vec<&str> = active_runtime::PROJECTION.iter().rev().copied().collect();
    let shuffled = ["so_filename", "_id", "has_functions", "package_name", "native_lib_dir"];

    let expected = BrokerClient::new(ScriptedResolver::new(|_, _| {
        Ok(Some(active_row(PACKAGE, LIBRARY, 1)))
    }))
    .query_active_runtime(BrokerType::Installable, 1, ABI);
    assert!(expected.is_found());

    for columns in [reversed, shuffled.to_vec()] {
        let client = BrokerClient::new(ScriptedResolver::new(move |_, _| {
            Ok(Some(active_row_with(&columns, PACKAGE, LIBRARY, 1)))
        }));
        assert_eq!(
            client.query_active_runtime(BrokerType::Installable, 1, ABI),
            expected
        );
    }
}

#[test]
fn test_cursor_closed_exactly_once() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| {
        Ok(Some(active_row(PACKAGE, LIBRARY, 0)))
    }));

    for _ in 0..3 {
        client.query_active_runtime(BrokerType::Installable, 1, ABI);
    }

    assert_eq!(client.resolver().cursors_opened(), 3);
    assert_eq!(client.resolver().close_counts(), vec![1, 1, 1]);
}

#[test]
fn test_queries_active_uri_with_full_projection() {
    let client = BrokerClient::new(ScriptedResolver::new(|_, _| Ok(None)));

    client.query_active_runtime(BrokerType::from_system_flag(true), 1, "x86_64");

    let queries = client.resolver().queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(
        queries[0].0,
        "content://org.khronos.openxr.system_runtime_broker/openxr/1/abi/x86_64/runtimes/active/0"
    );
    assert_eq!(
        queries[0].1,
        vec!["_id", "package_name", "native_lib_dir", "so_filename", "has_functions"]
    );
}

#[test]
fn test_closure_resolver() {
    let client = BrokerClient::new(from_fn(|uri, projection| {
        assert_eq!(uri.authority(), "org.khronos.openxr.runtime_broker");
        Ok(Some(
            MatrixCursor::new(projection.iter().copied())
                .with_row([
                    "0",
                    "org.khronos.example",
                    "/system/lib64",
                    "libopenxr_example.so",
                    "0",
                ])?
                .into_boxed(),
        ))
    }));

    let runtime = client
        .query_active_runtime(BrokerType::Installable, 1, ABI)
        .into_runtime()
        .unwrap();
    assert_eq!(runtime.package_name, "org.khronos.example");
    assert_eq!(runtime.native_lib_dir, "/system/lib64");
}
