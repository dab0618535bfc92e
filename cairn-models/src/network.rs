use crate::error::ModelsError;
use cairn_time::CairnTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Chain the ledger follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// main network
    Mainnet,
    /// legacy test network
    Testnet3,
    /// current test network
    Testnet4,
    /// local regression test network
    Regtest,
}

/// Network dependent constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// first block carrying ledger data, the genesis of the hash chains
    pub block_first: u64,
    /// version mixed into every consensus hash
    pub consensus_hash_version: u32,
    /// mempool transactions parsed together in follow mode
    pub mempool_max_batch_size: usize,
    /// a non-empty mempool batch is parsed when this much time passed since the last parse
    pub mempool_idle_timeout: CairnTime,
}

impl Network {
    /// All supported networks
    pub const ALL: [Network; 4] = [
        Network::Mainnet,
        Network::Testnet3,
        Network::Testnet4,
        Network::Regtest,
    ];

    /// Constants of the network
    pub const fn params(&self) -> NetworkParams {
        match self {
            Network::Mainnet => NetworkParams {
                block_first: 278_270,
                consensus_hash_version: 2,
                mempool_max_batch_size: 100,
                mempool_idle_timeout: CairnTime::from_secs(60),
            },
            Network::Testnet3 => NetworkParams {
                block_first: 310_000,
                consensus_hash_version: 7,
                mempool_max_batch_size: 100,
                mempool_idle_timeout: CairnTime::from_secs(60),
            },
            Network::Testnet4 => NetworkParams {
                block_first: 64_492,
                consensus_hash_version: 7,
                mempool_max_batch_size: 100,
                mempool_idle_timeout: CairnTime::from_secs(60),
            },
            Network::Regtest => NetworkParams {
                block_first: 0,
                consensus_hash_version: 1,
                mempool_max_batch_size: 1,
                mempool_idle_timeout: CairnTime::from_secs(5),
            },
        }
    }

    /// Lowercase name, used in file names and settings
    pub const fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Testnet3 => "testnet3",
            Network::Testnet4 => "testnet4",
            Network::Regtest => "regtest",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Network {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Network::ALL
            .into_iter()
            .find(|network| network.as_str() == s)
            .ok_or_else(|| ModelsError::UnknownNetwork(s.to_string()))
    }
}
