// Copyright (c) 2021 MASSA LABS <info@massa.net>
//! Node settings, merged from
//! 1. the base file, `base_config/config.toml` or the path in `CAIRN_CONFIG_PATH`
//! 2. the override file, `config/config.toml` or the path in
//!    `CAIRN_CONFIG_OVERRIDE_PATH`, when it exists
//! 3. the environment: `CAIRN_<SECTION>__<KEY>`, e.g. `CAIRN_FOLLOWER__NO_MEMPOOL=true`
//!
//! Later sources override earlier ones. Durations are in milliseconds.

use crate::error::SettingsError;
use cairn_caches::CacheConfig;
use cairn_consensus::Checkpoint;
use cairn_db_exports::DbConfig;
use cairn_follow::FollowerConfig;
use cairn_models::{Network, Version};
use cairn_parser_exports::ParserConfig;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Prefix of the environment variables
pub const ENV_PREFIX: &str = "CAIRN";
const BASE_CONFIG_PATH: &str = "base_config/config.toml";
const OVERRIDE_CONFIG_PATH: &str = "config/config.toml";

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// tracing filter directives
    pub level: String,
}

/// Block processor settings
#[derive(Debug, Clone, Deserialize)]
pub struct ParserSettings {
    /// a progress line is logged every `progress_interval` blocks during catch-up
    pub progress_interval: u64,
    /// skip the software version check
    #[serde(default)]
    pub force: bool,
    /// run the store integrity checks at startup
    #[serde(default)]
    pub check_integrity: bool,
    /// checkpoints added to the built-in table, by block index
    #[serde(default)]
    pub checkpoints: BTreeMap<String, Checkpoint>,
}

/// Node settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// followed network
    pub network: Network,
    /// logging
    pub logging: LoggingSettings,
    /// ledger store
    pub database: DbConfig,
    /// block processor
    pub parser: ParserSettings,
    /// chain follower
    pub follower: FollowerConfig,
    /// ledger caches
    #[serde(default)]
    pub caches: CacheConfig,
}

impl Settings {
    /// Block processor configuration for the running software version
    pub fn parser_config(&self, software_version: Version) -> Result<ParserConfig, SettingsError> {
        let extra_checkpoints = self
            .parser
            .checkpoints
            .iter()
            .map(|(block_index, checkpoint)| {
                block_index
                    .parse::<u64>()
                    .map(|block_index| (block_index, checkpoint.clone()))
                    .map_err(|_| SettingsError::InvalidCheckpoint(block_index.clone()))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(ParserConfig {
            network: self.network,
            software_version,
            progress_interval: self.parser.progress_interval,
            extra_checkpoints,
            caches: self.caches.clone(),
            force: self.parser.force,
        })
    }
}

/// Merges the base file, the override file if it exists, and the environment
pub fn load_settings(
    base_path: &Path,
    override_path: Option<&Path>,
) -> Result<Settings, SettingsError> {
    let mut builder = config::Config::builder().add_source(config::File::from(base_path));
    if let Some(override_path) = override_path.filter(|path| path.is_file()) {
        builder = builder.add_source(config::File::from(override_path));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;
    Ok(settings.try_deserialize()?)
}

/// Settings from the default locations, which `CAIRN_CONFIG_PATH` and
/// `CAIRN_CONFIG_OVERRIDE_PATH` replace
pub fn build_settings() -> Result<Settings, SettingsError> {
    let base_path = std::env::var("CAIRN_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(BASE_CONFIG_PATH));
    let override_path = std::env::var("CAIRN_CONFIG_OVERRIDE_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(OVERRIDE_CONFIG_PATH));
    load_settings(&base_path, Some(&override_path))
}
