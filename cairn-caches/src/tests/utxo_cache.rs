use super::tools::test_store;
use crate::{UtxoBalancesCache, UtxoPresence};
use std::collections::BTreeMap;

#[test]
fn test_loads_positive_balances_only() {
    let store = test_store();
    store.insert_utxo_balance("aa:0", "PEPE", 10, 1);
    store.insert_utxo_balance("bb:0", "PEPE", 10, 1);
    store.insert_utxo_balance("bb:0", "PEPE", 0, 2);

    let mut cache = UtxoBalancesCache::new(store.pool.clone(), &BTreeMap::new()).unwrap();
    assert_eq!(cache.presence("aa:0"), UtxoPresence::Present);
    assert_eq!(cache.presence("bb:0"), UtxoPresence::Unknown);
    assert!(cache.has_balance("aa:0").unwrap());
    assert!(!cache.has_balance("bb:0").unwrap());
}

#[test]
fn test_tri_state_and_cleanup() {
    let store = test_store();
    let mut cache = UtxoBalancesCache::new(store.pool.clone(), &BTreeMap::new()).unwrap();
    assert!(cache.is_empty());

    cache.add_balance("cc:1");
    cache.add_balance("dd:1");
    cache.remove_balance("dd:1");
    assert_eq!(cache.presence("cc:1"), UtxoPresence::Present);
    assert_eq!(cache.presence("dd:1"), UtxoPresence::KnownAbsent);
    assert!(!cache.has_balance("dd:1").unwrap());
    assert_eq!(cache.len(), 2);

    cache.cleanup_spent_utxos();
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.presence("dd:1"), UtxoPresence::Unknown);
}

#[test]
fn test_negative_lookup_is_not_cached() {
    let store = test_store();
    let mut cache = UtxoBalancesCache::new(store.pool.clone(), &BTreeMap::new()).unwrap();
    assert!(!cache.has_balance("ee:0").unwrap());
    assert_eq!(cache.presence("ee:0"), UtxoPresence::Unknown);

    store.insert_utxo_balance("ee:0", "PEPE", 5, 3);
    assert!(cache.has_balance("ee:0").unwrap());
    assert_eq!(cache.presence("ee:0"), UtxoPresence::Present);
}

#[test]
fn test_invalid_attach_destination_is_present() {
    let store = test_store();
    store.insert_block(1);
    store.insert_transaction(0, "attach_tx", "src:0 ff:0 2", "attach", false);
    store.insert_transaction(1, "valid_attach_tx", "src:1 gg:0 2", "attach", true);

    let cache = UtxoBalancesCache::new(store.pool.clone(), &BTreeMap::new()).unwrap();
    assert_eq!(cache.presence("ff:0"), UtxoPresence::Present);
    assert_eq!(cache.presence("gg:0"), UtxoPresence::Unknown);
}

#[test]
fn test_known_sources_descendants() {
    let store = test_store();
    store.insert_block(1);
    store.insert_transaction(0, "known_tx", "in:0 k1:0 2", "send", true);
    // k1:0 moved to k2:0, which is later moved to k3:0
    store.insert_transaction(1, "move_1", "k1:0 k2:0 2", "utxomove", true);
    store.insert_transaction(2, "move_2", "k2:0,other:5 k3:0 2", "utxomove", true);
    // a prefix of k3:0 but not a source of this transaction
    store.insert_transaction(3, "lookalike", "k3:01 zz:0 2", "utxomove", true);

    let mut known_sources = BTreeMap::new();
    known_sources.insert("known_tx".to_string(), "source_addr".to_string());
    let cache = UtxoBalancesCache::new(store.pool.clone(), &known_sources).unwrap();
    assert_eq!(cache.presence("k1:0"), UtxoPresence::Unknown);
    assert_eq!(cache.presence("k2:0"), UtxoPresence::Unknown);
    assert_eq!(cache.presence("k3:0"), UtxoPresence::Present);
    assert_eq!(cache.presence("zz:0"), UtxoPresence::Unknown);
}

#[test]
fn test_detach_ends_known_sources_chain() {
    let store = test_store();
    store.insert_block(1);
    store.insert_transaction(0, "known_tx", "in:0 d1:0 2", "send", true);
    store.insert_transaction(1, "detach_1", "d1:0 d2:0 2", "detach", true);

    let mut known_sources = BTreeMap::new();
    known_sources.insert("known_tx".to_string(), "source_addr".to_string());
    // empty sources are skipped
    known_sources.insert("unrelated_tx".to_string(), String::new());
    let cache = UtxoBalancesCache::new(store.pool.clone(), &known_sources).unwrap();
    assert_eq!(cache.presence("d1:0"), UtxoPresence::Unknown);
    assert_eq!(cache.presence("d2:0"), UtxoPresence::Unknown);
}
