use super::tools::test_store;
use crate::AssetCache;
use cairn_models::{AssetRecord, Destruction};

#[test]
fn test_totals_aggregate_valid_issuances() {
    let store = test_store();
    store.insert_issuance(1, "PEPE", None, 1_000, "valid");
    store.insert_issuance(2, "PEPE", None, 1_000, "valid");
    store.insert_issuance(3, "PEPE", None, 5_000, "invalid: insufficient funds");
    store.insert_destruction(4, "PEPE", 300);

    let cache = AssetCache::new(store.pool.clone()).unwrap();
    assert_eq!(cache.total_issued("PEPE"), 2_000);
    assert_eq!(cache.total_destroyed("PEPE"), 300);
    assert_eq!(cache.supply("PEPE"), 1_700);
    assert_eq!(cache.total_issued("UNKNOWN"), 0);
}

#[test]
fn test_get_by_longname_and_latest_issuance() {
    let store = test_store();
    store.insert_issuance(1, "A95428956661682177", Some("PARENT.child"), 10, "valid");
    store.insert_issuance(2, "A95428956661682177", Some("PARENT.child"), 20, "valid");

    let mut cache = AssetCache::new(store.pool.clone()).unwrap();
    let by_longname = cache.get("PARENT.child").unwrap().unwrap();
    assert_eq!(by_longname.tx_index, 2);
    let by_name = cache.get("A95428956661682177").unwrap().unwrap();
    assert_eq!(by_name.tx_index, 2);
}

#[test]
fn test_miss_is_not_cached() {
    let store = test_store();
    let mut cache = AssetCache::new(store.pool.clone()).unwrap();
    assert!(cache.get("LATE").unwrap().is_none());
    assert!(cache.is_empty());

    // issued after the first lookup, found through the store
    store.insert_issuance(7, "LATE", None, 1, "valid");
    assert_eq!(cache.get("LATE").unwrap().unwrap().tx_index, 7);
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_add_issuance_and_destroyed_ignore_invalid() {
    let store = test_store();
    let mut cache = AssetCache::new(store.pool.clone()).unwrap();
    let mut issuance = AssetRecord {
        tx_index: 1,
        tx_hash: "issuance_1".to_string(),
        block_index: 101,
        asset: "FOO".to_string(),
        asset_longname: None,
        quantity: 50,
        divisible: true,
        source: "addr".to_string(),
        issuer: "addr".to_string(),
        description: String::new(),
        status: "valid".to_string(),
    };
    cache.add_issuance(&issuance);
    issuance.status = "invalid: locked".to_string();
    cache.add_issuance(&issuance);

    let mut destroyed = Destruction {
        tx_index: 2,
        tx_hash: "destruction_2".to_string(),
        block_index: 102,
        source: "addr".to_string(),
        asset: "FOO".to_string(),
        quantity: 20,
        tag: String::new(),
        status: "valid".to_string(),
    };
    cache.add_destroyed(&destroyed);
    destroyed.status = "invalid: balance".to_string();
    cache.add_destroyed(&destroyed);

    assert_eq!(cache.total_issued("FOO"), 50);
    assert_eq!(cache.total_destroyed("FOO"), 20);
    assert_eq!(cache.get("FOO").unwrap().unwrap().status, "valid");
}
