use crate::{Checkpoint, ConsensusError, ConsensusVerifier};
use assert_matches::assert_matches;
use cairn_hash::dhash_hex;
use cairn_models::{HashField, Network};
use std::collections::BTreeMap;

const REGTEST_GENESIS: &str = "189b8832f4c79035ed63818589a0d7831093bd4e19a4f3c04b3104854468785e";

fn empty_store() -> BTreeMap<(u64, HashField), String> {
    BTreeMap::new()
}

#[test]
fn test_regtest_genesis_matches_checkpoint() {
    let verifier = ConsensusVerifier::new(Network::Regtest);
    for field in HashField::ALL {
        let (hash, stored) = verifier
            .consensus_hash(&empty_store(), 0, field, None, &[])
            .unwrap();
        assert_eq!(hash, REGTEST_GENESIS);
        assert_eq!(stored, None);
    }
}

#[test]
fn test_wrong_checkpoint_is_rejected() {
    let mut checkpoints = BTreeMap::new();
    checkpoints.insert(0, Checkpoint::all("00"));
    let verifier = ConsensusVerifier::new(Network::Regtest).with_checkpoints(checkpoints);
    assert_matches!(
        verifier.consensus_hash(&empty_store(), 0, HashField::LedgerHash, None, &[]),
        Err(ConsensusError::IncorrectHash { block_index: 0, .. })
    );
}

#[test]
fn test_previous_hash_read_from_store() {
    let verifier = ConsensusVerifier::new(Network::Regtest);
    let mut store = empty_store();
    store.insert((4, HashField::TxlistHash), "abc123".to_string());
    let chunks = vec!["tx1".to_string(), "tx2".to_string()];

    let (hash, _) = verifier
        .consensus_hash(&store, 5, HashField::TxlistHash, None, &chunks)
        .unwrap();
    assert_eq!(hash, dhash_hex("abc1231tx1tx2"));

    let (explicit, _) = verifier
        .consensus_hash(&store, 5, HashField::TxlistHash, Some("abc123"), &chunks)
        .unwrap();
    assert_eq!(explicit, hash);
}

#[test]
fn test_missing_previous_hash_is_fatal() {
    let verifier = ConsensusVerifier::new(Network::Regtest);
    let mut store = empty_store();
    store.insert((6, HashField::LedgerHash), String::new());
    let err = verifier
        .consensus_hash(&store, 7, HashField::LedgerHash, None, &[])
        .unwrap_err();
    assert_matches!(err, ConsensusError::EmptyPreviousHash { block_index: 7, .. });
    assert!(err
        .to_string()
        .starts_with("Empty previous ledger_hash for block 7"));
}

#[test]
fn test_stored_hash_must_match() {
    let verifier = ConsensusVerifier::new(Network::Regtest);
    let mut store = empty_store();
    store.insert((10, HashField::MessagesHash), "stale".to_string());
    let err = verifier
        .consensus_hash(&store, 10, HashField::MessagesHash, Some("prev"), &[])
        .unwrap_err();
    assert_matches!(err, ConsensusError::InconsistentHash { .. });
    assert!(err
        .to_string()
        .starts_with("Inconsistent messages_hash for block 10"));

    let expected = dhash_hex("prev1");
    store.insert((10, HashField::MessagesHash), expected.clone());
    let (hash, stored) = verifier
        .consensus_hash(&store, 10, HashField::MessagesHash, Some("prev"), &[])
        .unwrap();
    assert_eq!(hash, expected);
    assert_eq!(stored, Some(expected));
}

#[test]
fn test_version_is_part_of_the_digest() {
    let store = empty_store();
    let mainnet = ConsensusVerifier::new(Network::Mainnet)
        .consensus_hash(&store, 900_000, HashField::LedgerHash, Some("prev"), &[])
        .unwrap()
        .0;
    let testnet = ConsensusVerifier::new(Network::Testnet4)
        .consensus_hash(&store, 900_000, HashField::LedgerHash, Some("prev"), &[])
        .unwrap()
        .0;
    assert_eq!(mainnet, dhash_hex("prev2"));
    assert_eq!(testnet, dhash_hex("prev7"));
}
