use crate::{MempoolBatch, MempoolCorrelator, NotSupportedTransactionsCache};
use cairn_models::{Network, RawTransaction};
use cairn_time::CairnTime;
use tempfile::TempDir;

fn raw(content: &str) -> RawTransaction {
    RawTransaction(content.as_bytes().to_vec())
}

#[test]
fn test_batch_flushes_when_full() {
    let start = CairnTime::from_secs(1_000);
    let mut batch = MempoolBatch::new(3, CairnTime::from_secs(60), start);
    batch.push("a".into(), raw("a"));
    batch.push("b".into(), raw("b"));
    assert!(!batch.should_flush(start));

    // already queued
    batch.push("b".into(), raw("b"));
    assert_eq!(batch.len(), 2);
    assert!(!batch.should_flush(start));

    batch.push("c".into(), raw("c"));
    assert!(batch.should_flush(start));
    assert_eq!(batch.take(start), vec![raw("a"), raw("b"), raw("c")]);
    assert!(batch.is_empty());
    assert!(!batch.should_flush(start));
}

#[test]
fn test_batch_flushes_when_idle() {
    let start = CairnTime::from_secs(1_000);
    let idle = CairnTime::from_secs(60);
    let mut batch = MempoolBatch::new(100, idle, start);

    // an empty batch never flushes
    assert!(!batch.should_flush(start.saturating_add(idle)));

    batch.push("a".into(), raw("a"));
    assert!(!batch.should_flush(start.saturating_add(CairnTime::from_secs(59))));
    let later = start.saturating_add(idle);
    assert!(batch.should_flush(later));

    batch.take(later);
    batch.push("b".into(), raw("b"));
    // the timeout restarts at each flush
    assert!(!batch.should_flush(later.saturating_add(CairnTime::from_secs(1))));
    assert!(batch.remove("b"));
    assert!(!batch.remove("b"));
    assert!(!batch.should_flush(later.saturating_add(idle)));
}

#[test]
fn test_correlation_hash_first() {
    let mut correlator = MempoolCorrelator::new();
    correlator.on_hashtx(5, "h1".into());
    assert_eq!(correlator.pending_len(), 1);

    correlator.on_rawtx(5, raw("payload"), |_| panic!("the hash is known"));
    assert_eq!(correlator.pending_len(), 0);
    assert_eq!(correlator.take_raw("h1"), Some(raw("payload")));
    assert_eq!(correlator.take_raw("h1"), None);
}

#[test]
fn test_correlation_payload_first() {
    let mut correlator = MempoolCorrelator::new();
    // undecodable, waits for its hashtx
    correlator.on_rawtx(9, raw("payload"), |_| None);
    assert_eq!(correlator.pending_len(), 1);
    assert!(!correlator.has_raw("h2"));

    correlator.on_hashtx(9, "h2".into());
    assert_eq!(correlator.pending_len(), 0);
    assert!(correlator.has_raw("h2"));

    // decodable payloads do not wait
    correlator.on_rawtx(10, raw("other"), |_| Some("h3".to_string()));
    assert_eq!(correlator.pending_len(), 0);
    assert_eq!(correlator.take_raw("h3"), Some(raw("other")));
}

#[test]
fn test_second_payload_is_a_confirmation() {
    let mut correlator = MempoolCorrelator::new();
    correlator.on_rawtx(1, raw("payload"), |_| Some("h1".to_string()));
    assert!(correlator.has_raw("h1"));
    correlator.on_rawtx(2, raw("payload"), |_| Some("h1".to_string()));
    assert!(!correlator.has_raw("h1"));
}

#[test]
fn test_payloads_of_announced_transactions_are_not_held() {
    let mut correlator = MempoolCorrelator::new();
    for n in 0..1_000u32 {
        let tx_hash = format!("h{}", n);
        let decoded = tx_hash.clone();
        correlator.on_rawtx(2 * n, raw("payload"), move |_| Some(decoded));
        assert_eq!(correlator.take_raw(&tx_hash), Some(raw("payload")));
        // published again when the block connects
        let decoded = tx_hash.clone();
        correlator.on_rawtx(2 * n + 1, raw("payload"), move |_| Some(decoded));
    }
    assert_eq!(correlator.held_len(), 0);

    // announced before its payload arrived
    assert_eq!(correlator.take_raw("late"), None);
    correlator.on_rawtx(5_000, raw("late"), |_| Some("late".to_string()));
    assert_eq!(correlator.held_len(), 0);

    correlator.forget("late");
    correlator.on_rawtx(5_001, raw("late"), |_| Some("late".to_string()));
    assert!(correlator.has_raw("late"));
}

#[test]
fn test_held_payloads_are_bounded() {
    let mut correlator = MempoolCorrelator::new();
    for n in 0..10_050u32 {
        let tx_hash = format!("h{}", n);
        correlator.on_rawtx(n, raw("payload"), move |_| Some(tx_hash));
    }
    assert_eq!(correlator.held_len(), 10_000);
    assert!(!correlator.has_raw("h0"));
    assert!(correlator.has_raw("h10049"));
}

#[test]
fn test_not_supported_cache_persistence() {
    let dir = TempDir::new().unwrap();
    let mut cache = NotSupportedTransactionsCache::new(dir.path(), Network::Regtest).unwrap();
    assert!(cache.is_empty());
    assert_eq!(
        cache.path(),
        dir.path().join("not_supported_tx_cache.regtest.txt")
    );

    cache.add("t2");
    cache.add("t1");
    cache.add("t2");
    assert_eq!(cache.len(), 2);
    assert!(cache.is_not_supported("t1"));
    assert!(!cache.is_not_supported("t3"));
    cache.backup().unwrap();
    assert_eq!(
        std::fs::read_to_string(cache.path()).unwrap(),
        "t2\nt1\n"
    );

    let restored = NotSupportedTransactionsCache::new(dir.path(), Network::Regtest).unwrap();
    assert_eq!(restored.len(), 2);
    assert!(restored.is_not_supported("t2"));

    // one file per network
    let other = NotSupportedTransactionsCache::new(dir.path(), Network::Testnet4).unwrap();
    assert!(other.is_empty());

    cache.clear();
    assert!(cache.is_empty());
    assert!(!cache.path().exists());
    let cleared = NotSupportedTransactionsCache::new(dir.path(), Network::Regtest).unwrap();
    assert!(cleared.is_empty());
}
