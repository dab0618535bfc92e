use super::tools::{regtest_config, write_config};
use crate::{init_logging, load_settings, LoggingSettings, SettingsError};
use assert_matches::assert_matches;
use cairn_models::{Network, Version};
use cairn_time::CairnTime;
use serial_test::serial;
use std::path::Path;
use tempfile::TempDir;

#[test]
#[serial]
fn test_shipped_base_config_loads() {
    let base = Path::new(env!("CARGO_MANIFEST_DIR")).join("base_config/config.toml");
    let settings = load_settings(&base, None).unwrap();
    assert_eq!(settings.network, Network::Mainnet);
    assert_eq!(settings.logging.level, "info");
    assert_eq!(settings.database.pool.max_connections, 50);
    assert_eq!(settings.follower.mempool_chunk_size, 1_000);
    assert_eq!(settings.follower.reconnect_delay, CairnTime::from_secs(5));
    assert!(!settings.follower.no_mempool);
    assert!(settings.parser.checkpoints.is_empty());
}

#[test]
#[serial]
fn test_override_file_wins() {
    let dir = TempDir::new().unwrap();
    let base = write_config(dir.path(), "base.toml", &regtest_config(dir.path()));
    let override_path = write_config(
        dir.path(),
        "override.toml",
        "[follower]\nno_mempool = true\n\n[parser]\nprogress_interval = 500\n",
    );

    let settings = load_settings(&base, Some(&override_path)).unwrap();
    assert!(settings.follower.no_mempool);
    assert_eq!(settings.parser.progress_interval, 500);
    // untouched keys keep the base value
    assert_eq!(settings.network, Network::Regtest);
    assert_eq!(settings.follower.mempool_chunk_size, 10);

    let missing = dir.path().join("missing.toml");
    let settings = load_settings(&base, Some(&missing)).unwrap();
    assert!(!settings.follower.no_mempool);
    assert_eq!(settings.parser.progress_interval, 10);
}

#[test]
#[serial]
fn test_environment_wins() {
    let dir = TempDir::new().unwrap();
    let base = write_config(dir.path(), "base.toml", &regtest_config(dir.path()));
    let override_path = write_config(dir.path(), "override.toml", "network = \"testnet3\"\n");
    std::env::set_var("CAIRN_NETWORK", "testnet4");
    std::env::set_var("CAIRN_FOLLOWER__MEMPOOL_CHUNK_SIZE", "25");

    let settings = load_settings(&base, Some(&override_path));
    std::env::remove_var("CAIRN_NETWORK");
    std::env::remove_var("CAIRN_FOLLOWER__MEMPOOL_CHUNK_SIZE");

    let settings = settings.unwrap();
    assert_eq!(settings.network, Network::Testnet4);
    assert_eq!(settings.follower.mempool_chunk_size, 25);
}

#[test]
#[serial]
fn test_checkpoints_reach_the_parser() {
    let dir = TempDir::new().unwrap();
    let config = format!(
        "{}\n[parser.checkpoints.5]\nledger_hash = \"aa\"\n",
        regtest_config(dir.path())
    );
    let base = write_config(dir.path(), "base.toml", &config);
    let settings = load_settings(&base, None).unwrap();

    let parser_config = settings.parser_config(Version::new(1, 2, 3)).unwrap();
    assert_eq!(parser_config.network, Network::Regtest);
    assert_eq!(parser_config.software_version, Version::new(1, 2, 3));
    let checkpoint = &parser_config.extra_checkpoints[&5];
    assert_eq!(checkpoint.ledger_hash.as_deref(), Some("aa"));
    assert_eq!(checkpoint.txlist_hash, None);

    let mut settings = settings;
    let checkpoint = settings.parser.checkpoints["5"].clone();
    settings.parser.checkpoints.insert("tip".to_string(), checkpoint);
    assert_matches!(
        settings.parser_config(Version::new(1, 2, 3)),
        Err(SettingsError::InvalidCheckpoint(height)) if height == "tip"
    );
}

#[test]
#[serial]
fn test_missing_base_config_fails() {
    let dir = TempDir::new().unwrap();
    assert_matches!(
        load_settings(&dir.path().join("absent.toml"), None),
        Err(SettingsError::Config(_))
    );
}

#[test]
fn test_invalid_logging_filter() {
    assert_matches!(
        init_logging(&LoggingSettings {
            level: "cairn=loud".to_string()
        }),
        Err(SettingsError::Logging(_))
    );
}
