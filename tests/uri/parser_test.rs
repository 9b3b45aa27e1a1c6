//! Broker URI parser tests.
//!
//! Every URI the builders produce must parse back to the same parameters;
//! anything outside the four table shapes must be rejected.

use xrbroker::contract::BrokerType;
use xrbroker::uri::{
    active_runtime_uri, functions_uri, BrokerUriParser, ContentUri, ParsedBrokerUri, TableType,
};

fn parse(broker: BrokerType, uri: &str) -> Option<ParsedBrokerUri> {
    BrokerUriParser::new(broker).parse(&ContentUri::parse(uri).unwrap())
}

#[test]
fn test_builders_parse_back() {
    for broker in BrokerType::ALL {
        let parser = BrokerUriParser::new(broker);

        let active = parser
            .parse(&active_runtime_uri(broker, 2, "armeabi-v7a"))
            .unwrap();
        assert_eq!(
            active,
            ParsedBrokerUri {
                broker,
                table: TableType::ActiveRuntime,
                major_version: 2,
                abi: "armeabi-v7a".to_string(),
                package_name: None,
                row: Some(0),
            }
        );

        let functions = parser
            .parse(&functions_uri(broker, 1, "com.example.runtime", "x86_64"))
            .unwrap();
        assert_eq!(
            functions,
            ParsedBrokerUri {
                broker,
                table: TableType::Functions,
                major_version: 1,
                abi: "x86_64".to_string(),
                package_name: Some("com.example.runtime".to_string()),
                row: None,
            }
        );
    }
}

#[test]
fn test_all_four_shapes() {
    let base = "content://org.khronos.openxr.runtime_broker/openxr/1/abi/x86/runtimes";
    let installable = BrokerType::Installable;

    let dir = parse(installable, &format!("{base}/active")).unwrap();
    assert_eq!(dir.table, TableType::ActiveRuntime);
    assert!(dir.is_dir());

    let item = parse(installable, &format!("{base}/active/0")).unwrap();
    assert_eq!(item.row, Some(0));

    let functions = parse(installable, &format!("{base}/com.example.runtime/functions")).unwrap();
    assert_eq!(functions.table, TableType::Functions);
    assert!(functions.is_dir());

    let function = parse(installable, &format!("{base}/com.example.runtime/functions/3")).unwrap();
    assert_eq!(function.row, Some(3));
    assert_eq!(function.package_name.as_deref(), Some("com.example.runtime"));
}

#[test]
fn test_rejects_other_paths() {
    let installable = BrokerType::Installable;
    let authority = "content://org.khronos.openxr.runtime_broker";

    for path in [
        "/openxr/1/abi/x86/runtimes",
        "/openxr/one/abi/x86/runtimes/active/0",
        "/openxr/1/abi/x86/runtimes/active/first",
        "/openxr/1/abi/x86/runtimes/pkg/symbols",
        "/openxr/1/abi/x86/runtimes/pkg/functions/1/extra",
        "/openxr/1/arch/x86/runtimes/active/0",
        "/vulkan/1/abi/x86/runtimes/active/0",
    ] {
        assert!(
            parse(installable, &format!("{authority}{path}")).is_none(),
            "{path} should not parse"
        );
    }
}

#[test]
fn test_rejects_foreign_authority() {
    let uri = active_runtime_uri(BrokerType::System, 1, "x86");
    assert!(BrokerUriParser::new(BrokerType::Installable)
        .parse(&uri)
        .is_none());
    assert!(parse(BrokerType::System, "content://com.example.other/openxr/1/abi/x86/runtimes/active").is_none());
}
