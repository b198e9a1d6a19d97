#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Integration tests for the JSON import router.

use sesame_import::{parse_json, parse_json_with, CollectingReporter, OtpType, Severity};

use serde_json::json;

#[test]
fn flat_list_end_to_end() {
    let value = json!({
        "secrets": [
            {"issuer": "X", "secret": "AAAA", "type": "hotp", "counter": 5},
            {"issuer": "GitHub", "account": "bob@x.com", "secret": "abcd efgh"}
        ]
    });

    let records = parse_json(&value);
    assert_eq!(records.len(), 2);

    let hotp = &records[0];
    assert_eq!(hotp.otp_type, OtpType::Hotp);
    assert_eq!(hotp.counter, 5);
    assert_eq!(hotp.canonical_uri, "otpauth://hotp/X?secret=AAAA&issuer=X&counter=5");

    let totp = &records[1];
    assert_eq!(totp.otp_type, OtpType::Totp);
    assert_eq!(totp.secret, "ABCDEFGH");
    assert_eq!(
        totp.canonical_uri,
        "otpauth://totp/GitHub:bob%40x.com?secret=ABCDEFGH&issuer=GitHub"
    );
}

#[test]
fn flat_list_defaults_every_absent_field() {
    let value = json!({"secrets": [{"secret": "AAAA"}]});

    let records = parse_json(&value);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.issuer, "");
    assert_eq!(record.account, "");
    assert_eq!(record.otp_type, OtpType::Totp);
    assert_eq!(record.digits, 6);
    assert_eq!(record.period, 30);
    assert_eq!(record.counter, 0);
    assert_eq!(record.algorithm, "SHA1");
    assert_eq!(record.category, "");
    assert_eq!(record.canonical_uri, "otpauth://totp/Unknown?secret=AAAA");
}

#[test]
fn nested_accounts_end_to_end() {
    let value = json!({
        "version": 3,
        "accounts": [
            {
                "issuerName": "Dropbox",
                "userName": "bob@x.com",
                "secret": "jbsw y3dp",
                "timeStep": 30,
                "digits": 6,
                "algorithm": "SHA1"
            },
            {
                "issuerName": "Slack",
                "userName": "carol",
                "secret": "ehpk3pxp",
                "timeStep": 60
            }
        ]
    });

    let records = parse_json(&value);
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].issuer, "Dropbox");
    assert_eq!(records[0].account, "bob@x.com");
    assert_eq!(records[0].secret, "JBSWY3DP");
    assert_eq!(records[0].category, "");
    assert_eq!(
        records[0].canonical_uri,
        "otpauth://totp/Dropbox:bob%40x.com?secret=JBSWY3DP&issuer=Dropbox"
    );

    assert_eq!(records[1].period, 60);
    assert!(records[1].canonical_uri.contains("period=60"));
}

#[test]
fn elements_are_isolated_from_each_other() {
    let value = json!({
        "secrets": [
            {"issuer": "A", "secret": "AAAA"},
            {"issuer": "no-secret"},
            {"issuer": "C", "secret": "CCCC"}
        ]
    });

    let mut reporter = CollectingReporter::new();
    let records = parse_json_with(&value, &mut reporter);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].issuer, "A");
    assert_eq!(records[1].issuer, "C");
    assert_eq!(reporter.count(Severity::Warning), 1);
}

#[test]
fn unrecognized_json_never_raises() {
    for value in [
        json!(null),
        json!(42),
        json!("string"),
        json!([]),
        json!({}),
        json!({"version": 1}),
        json!({"version": 1, "accounts": []}),
        json!({"secrets": "not a list"}),
    ] {
        let records = parse_json(&value);
        assert!(records.is_empty(), "value {value} must yield no records");
    }
}
