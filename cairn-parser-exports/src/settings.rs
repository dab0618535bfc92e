// Copyright (c) 2022 MASSA LABS <info@massa.net>
use cairn_caches::CacheConfig;
use cairn_consensus::Checkpoint;
use cairn_models::{Network, Version};
use std::collections::BTreeMap;

/// Block processor configuration
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// followed network
    pub network: Network,
    /// running software version, stamped in new databases and checked against
    /// the published protocol changes
    pub software_version: Version,
    /// a progress line is logged every `progress_interval` blocks during catch-up
    pub progress_interval: u64,
    /// checkpoints added to the built-in table of the network
    pub extra_checkpoints: BTreeMap<u64, Checkpoint>,
    /// cache configuration
    pub caches: CacheConfig,
    /// skip the software version check
    pub force: bool,
}
