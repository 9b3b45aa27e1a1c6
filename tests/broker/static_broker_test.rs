//! In-memory broker tests.
//!
//! The fixture under `tests/fixtures/runtimes.toml` serves an installable
//! runtime with a functions table for arm64 only, and a system runtime for
//! every ABI.

use xrbroker::broker::{FixtureError, StaticBroker};
use xrbroker::client::{BrokerClient, FunctionMapping};
use xrbroker::contract::{active_runtime, functions, BrokerType};
use xrbroker::cursor::Cursor;
use xrbroker::resolver::{ContentResolver, QueryError};
use xrbroker::uri::{active_runtime_uri, functions_uri, ContentUri};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/runtimes.toml");

fn fixture() -> StaticBroker {
    StaticBroker::from_file(FIXTURE).unwrap()
}

#[test]
fn test_fixture_loads() {
    let broker = fixture();
    assert_eq!(broker.runtimes().len(), 2);

    let installable = broker
        .active(BrokerType::Installable, 1, "arm64-v8a")
        .unwrap();
    assert_eq!(installable.functions.len(), 2);
    assert!(broker.active(BrokerType::Installable, 1, "x86").is_none());
    assert!(broker.active(BrokerType::System, 1, "x86").is_some());
}

#[test]
fn test_client_against_fixture() {
    let client = BrokerClient::new(fixture());

    insta::assert_snapshot!(
        client
            .describe_active_runtime(BrokerType::Installable, 1, "arm64-v8a")
            .unwrap(),
        @"Found runtime so libexample.so in package com.example.runtime with function/symbol mapping defined"
    );
    insta::assert_snapshot!(
        client
            .describe_active_runtime(BrokerType::System, 1, "x86_64")
            .unwrap(),
        @"Found runtime so libopenxr_system.so in package com.example.system with no function/symbol mapping changes"
    );
    assert_eq!(
        client.describe_active_runtime(BrokerType::Installable, 1, "x86_64"),
        None
    );
}

#[test]
fn test_functions_sorted_by_name() {
    let client = BrokerClient::new(fixture());

    let mappings: Vec<FunctionMapping> = client
        .query_functions(BrokerType::Installable, 1, "com.example.runtime", "arm64-v8a")
        .collect();

    assert_eq!(
        mappings,
        vec![
            FunctionMapping::new("xrCreateInstance", "exampleCreateInstance"),
            FunctionMapping::new("xrGetSystem", "exampleGetSystem"),
        ]
    );
    assert!(mappings.iter().all(FunctionMapping::is_well_formed));
}

#[test]
fn test_function_ids_are_row_indices() {
    let broker = fixture();
    let uri = functions_uri(BrokerType::Installable, 1, "com.example.runtime", "arm64-v8a");

    let mut cursor = broker.query(&uri, &functions::PROJECTION).unwrap().unwrap();
    let id = cursor.column_index("_id").unwrap();
    let mut ids = Vec::new();
    while cursor.move_to_next() {
        ids.push(cursor.get_int(id).unwrap());
    }
    assert_eq!(ids, vec![0, 1]);
}

#[test]
fn test_functions_for_inactive_package() {
    let broker = fixture();
    let uri = functions_uri(BrokerType::Installable, 1, "com.example.other", "arm64-v8a");
    assert!(broker.query(&uri, &functions::PROJECTION).unwrap().is_none());
}

#[test]
fn test_projection_is_honoured() {
    let broker = fixture();
    let uri = active_runtime_uri(BrokerType::System, 1, "x86");

    let mut cursor = broker
        .query(&uri, &["so_filename", "package_name"])
        .unwrap()
        .unwrap();
    assert_eq!(cursor.count(), 1);
    assert!(cursor.move_to_first());
    assert_eq!(cursor.column_index("so_filename"), Some(0));
    assert_eq!(cursor.column_index("_id"), None);
    assert_eq!(
        cursor.get_string(1).unwrap().as_deref(),
        Some("com.example.system")
    );

    assert!(matches!(
        broker.query(&uri, &["_id", "vendor"]),
        Err(QueryError::InvalidColumn(column)) if column == "vendor"
    ));
}

#[test]
fn test_active_table_only_serves_row_zero() {
    let broker = fixture();
    let base = "content://org.khronos.openxr.system_runtime_broker/openxr/1/abi/x86/runtimes/active";

    let whole = ContentUri::parse(base).unwrap();
    let cursor = broker.query(&whole, &active_runtime::PROJECTION).unwrap().unwrap();
    assert_eq!(cursor.count(), 1);

    let other_row = ContentUri::parse(&format!("{base}/1")).unwrap();
    let cursor = broker
        .query(&other_row, &active_runtime::PROJECTION)
        .unwrap()
        .unwrap();
    assert_eq!(cursor.count(), 0);
}

#[test]
fn test_unknown_table_is_an_error() {
    let broker = fixture();
    let uri = ContentUri::parse(
        "content://org.khronos.openxr.runtime_broker/openxr/1/abi/x86/runtimes/pkg/symbols",
    )
    .unwrap();
    assert!(matches!(
        broker.query(&uri, &["_id"]),
        Err(QueryError::Remote { .. })
    ));
}

#[test]
fn test_discover_uses_system_for_other_abis() {
    let client = BrokerClient::new(fixture());

    let arm = client.discover(1, "arm64-v8a").unwrap();
    assert_eq!(arm.broker, BrokerType::Installable);
    assert_eq!(arm.functions.len(), 2);

    let x86 = client.discover(1, "x86").unwrap();
    assert_eq!(x86.broker, BrokerType::System);
    assert!(x86.functions.is_empty());
}

#[test]
fn test_bad_fixtures() {
    assert!(matches!(
        StaticBroker::from_file("/nonexistent/runtimes.toml"),
        Err(FixtureError::FileNotFound(_))
    ));
    assert!(matches!(
        StaticBroker::from_toml("[[runtime]]\nbroker = \"system\"\n"),
        Err(FixtureError::ParseError(_))
    ));

    let duplicate = r#"
[[runtime]]
broker = "system"
major_version = 1
package_name = "a"
native_lib_dir = "/a"
so_filename = "liba.so"

[[runtime]]
broker = "system"
major_version = 1
package_name = "b"
native_lib_dir = "/b"
so_filename = "libb.so"
"#;
    let err = StaticBroker::from_toml(duplicate).unwrap_err();
    insta::assert_snapshot!(err.to_string(), @"Duplicate system runtime for OpenXR 1 (*)");
}

#[test]
fn test_empty_fixture_serves_nothing() {
    let client = BrokerClient::new(StaticBroker::from_toml("").unwrap());
    assert!(client.discover(1, "arm64-v8a").is_none());
}

#[test]
fn test_unserved_abi_is_an_empty_table() {
    let broker = fixture();
    let uri = active_runtime_uri(BrokerType::Installable, 1, "x86_64");

    let cursor = broker.query(&uri, &active_runtime::PROJECTION).unwrap().unwrap();
    assert_eq!(cursor.count(), 0);
    assert!(matches!(
        broker.query(&uri, &["bogus_column"]),
        Err(QueryError::InvalidColumn(column)) if column == "bogus_column"
    ));

    let functions = functions_uri(BrokerType::Installable, 1, "com.example.runtime", "x86_64");
    assert!(broker.query(&functions, &functions::PROJECTION).unwrap().is_none());
}

#[test]
fn test_malformed_function_names_are_dropped() {
    let broker = StaticBroker::from_toml(
        r#"
[[runtime]]
broker = "installable"
major_version = 1
package_name = "com.example.runtime"
native_lib_dir = "/data/app/lib"
so_filename = "libexample.so"

[runtime.functions]
xrGetSystem = "exampleGetSystem"
getSystem = "exampleGetSystem"
"xr_get_system" = "exampleGetSystem"
xrCreateInstance = ""
"#,
    )
    .unwrap();
    let client = BrokerClient::new(broker);

    let runtime = client.discover(1, "x86").unwrap();
    assert_eq!(
        runtime.functions.keys().collect::<Vec<_>>(),
        vec!["xrGetSystem"]
    );
}
