use cairn_models::{HashField, Network};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Expected hashes of one block. A missing hash is not checked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Checkpoint {
    /// expected `ledger_hash`
    #[serde(default)]
    pub ledger_hash: Option<String>,
    /// expected `txlist_hash`
    #[serde(default)]
    pub txlist_hash: Option<String>,
    /// expected `messages_hash`
    #[serde(default)]
    pub messages_hash: Option<String>,
}

impl Checkpoint {
    /// Checkpoint with the same expected value for every chain
    pub fn all(hash: &str) -> Self {
        Checkpoint {
            ledger_hash: Some(hash.to_string()),
            txlist_hash: Some(hash.to_string()),
            messages_hash: Some(hash.to_string()),
        }
    }

    /// Expected value of `field`
    pub fn hash(&self, field: HashField) -> Option<&str> {
        match field {
            HashField::LedgerHash => self.ledger_hash.as_deref(),
            HashField::TxlistHash => self.txlist_hash.as_deref(),
            HashField::MessagesHash => self.messages_hash.as_deref(),
        }
    }
}

// (block_index, ledger_hash, txlist_hash, messages_hash)
type CheckpointRow = (u64, &'static str, &'static str, &'static str);

const CHECKPOINTS_MAINNET: &[CheckpointRow] = &[];

const CHECKPOINTS_TESTNET3: &[CheckpointRow] = &[];

const CHECKPOINTS_TESTNET4: &[CheckpointRow] = &[];

// empty genesis block
const CHECKPOINTS_REGTEST: &[CheckpointRow] = &[(
    0,
    "189b8832f4c79035ed63818589a0d7831093bd4e19a4f3c04b3104854468785e",
    "189b8832f4c79035ed63818589a0d7831093bd4e19a4f3c04b3104854468785e",
    "189b8832f4c79035ed63818589a0d7831093bd4e19a4f3c04b3104854468785e",
)];

/// Built-in checkpoint table of `network`
pub fn network_checkpoints(network: Network) -> BTreeMap<u64, Checkpoint> {
    let rows = match network {
        Network::Mainnet => CHECKPOINTS_MAINNET,
        Network::Testnet3 => CHECKPOINTS_TESTNET3,
        Network::Testnet4 => CHECKPOINTS_TESTNET4,
        Network::Regtest => CHECKPOINTS_REGTEST,
    };
    rows.iter()
        .map(|(block_index, ledger_hash, txlist_hash, messages_hash)| {
            (
                *block_index,
                Checkpoint {
                    ledger_hash: Some(ledger_hash.to_string()),
                    txlist_hash: Some(txlist_hash.to_string()),
                    messages_hash: Some(messages_hash.to_string()),
                },
            )
        })
        .collect()
}
