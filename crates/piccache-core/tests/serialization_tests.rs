//! Wire-format tests for piccache-core types.

use piccache_core::{FetchOutcome, ResponseHeaders};
use std::path::PathBuf;

#[test]
fn test_fetch_outcome_json_field_names() {
    let headers: ResponseHeaders = [("Content-Type", "image/jpeg")].into_iter().collect();
    let outcome = FetchOutcome::added(PathBuf::from("/cache/piccache/i.redd.it/a/b/c/h-abc.jpg"), headers);

    let json = serde_json::to_value(&outcome).expect("serialize");

    assert_eq!(json["cached"], true);
    assert_eq!(json["fetched"], true);
    assert_eq!(json["filename"], "/cache/piccache/i.redd.it/a/b/c/h-abc.jpg");
    assert_eq!(json["comment"], "added to cache");
    assert_eq!(json["responseHeaders"]["content-type"], "image/jpeg");
}

#[test]
fn test_failed_outcome_has_null_filename() {
    let json = serde_json::to_value(FetchOutcome::resolution_failed()).expect("serialize");
    assert!(json["filename"].is_null());
    assert_eq!(json["cached"], false);
    assert_eq!(json["responseHeaders"], serde_json::json!({}));
}

#[test]
fn test_fetch_outcome_roundtrip() {
    let outcome = FetchOutcome::already_exists(PathBuf::from("/tmp/x-abc.png"));
    let json = serde_json::to_string(&outcome).expect("serialize");
    let parsed: FetchOutcome = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(outcome, parsed);
}
