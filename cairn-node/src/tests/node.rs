use super::tools::{regtest_config, write_config, IdleSubscriber};
use crate::{load_settings, CairnNode, NodeCollaborators};
use cairn_db_worker::queries;
use cairn_follow::FollowerMode;
use cairn_models::Version;
use cairn_test_framework::{init_tracing, issuance_tx, test_interpreters, InMemoryChain};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[test]
fn test_node_start_and_stop() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let base = write_config(dir.path(), "base.toml", &regtest_config(dir.path()));
    let settings = load_settings(&base, None).unwrap();
    let chain = Arc::new(InMemoryChain::new(0));
    chain.mine_empty(2);
    chain.mine(vec![issuance_tx("i1", "alice", "PEPE", 1_000)]);

    let node = CairnNode::start(
        &settings,
        Version::new(10, 4, 2),
        NodeCollaborators {
            source: chain.clone(),
            interpreters: test_interpreters(),
            subscriber: Box::new(IdleSubscriber),
            version_source: None,
        },
    )
    .unwrap();

    let deadline = Instant::now() + Duration::from_secs(10);
    while node.status().mode() != FollowerMode::Follow {
        assert!(Instant::now() < deadline, "the node did not catch up in time");
        std::thread::sleep(Duration::from_millis(10));
    }
    let tip = {
        let conn = node.pool().acquire().unwrap();
        queries::last_block(&conn).unwrap().map(|block| block.block_index)
    };
    assert_eq!(tip, Some(2));
    assert!(!node.status().is_late().unwrap());
    assert!(!node.is_finished());

    node.stop().unwrap();
    assert!(dir.path().join("ledger.db").exists());
}
