use std::fs;

use platform_host_native::FileRecordStore;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[test]
fn per_key_writes_shadow_legacy_document_without_rewriting_it() {
    let dir = tempfile::tempdir().expect("tempdir");
    let legacy = json!({
        "constructionApp_clients": [{"id": 1, "name": "Kim"}],
        "constructionApp_units": ["m2"],
    });
    let legacy_raw = serde_json::to_vec(&legacy).expect("legacy json");
    fs::write(dir.path().join("store.json"), &legacy_raw).expect("write legacy");

    let store = FileRecordStore::from_root(dir.path());
    assert_eq!(
        store.read_key("constructionApp_units"),
        Some(json!(["m2"]))
    );
    assert_eq!(store.keys().expect("keys"), Vec::<String>::new());

    assert!(store.write_key("constructionApp_units", &json!(["m2", "ea"])));
    assert_eq!(
        store.read_key("constructionApp_units"),
        Some(json!(["m2", "ea"]))
    );
    assert_eq!(
        store.read_key("constructionApp_clients"),
        Some(json!([{"id": 1, "name": "Kim"}]))
    );
    assert_eq!(store.keys().expect("keys"), vec!["constructionApp_units"]);

    let on_disk: Value = serde_json::from_slice(
        &fs::read(dir.path().join("constructionApp_units.json")).expect("per-key file"),
    )
    .expect("per-key json");
    assert_eq!(on_disk, json!(["m2", "ea"]));
    assert_eq!(
        fs::read(dir.path().join("store.json")).expect("legacy"),
        legacy_raw
    );
}
