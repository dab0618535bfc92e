//! Protocol constants.
//!
//! Changing any of the hashing constants changes every ledger hash of every
//! network, so they are fixed for the lifetime of a ledger.

/// Block index given to provisional (mempool) rows
pub const MEMPOOL_BLOCK_INDEX: u64 = 9_999_999;

/// Block hash given to provisional (mempool) rows
pub const MEMPOOL_BLOCK_HASH: &str = "mempool";

/// Separator of multisig addresses. A source or destination containing it is unsupported.
pub const ADDRESS_SEPARATOR: char = '-';

/// Separator between a parent asset and its subasset name
pub const SUBASSET_SEPARATOR: char = '.';

/// Length of the big-endian message type id prefixing every payload
pub const MESSAGE_TYPE_ID_LENGTH: usize = 4;

/// Seed of the hash chains: the previous hash of the first block is `dhash(seed)`
pub const CONSENSUS_HASH_SEED: &str =
    "A cairn marks the trail for those who walk it after us.";

/// Status of an effective ledger row
pub const VALID_STATUS: &str = "valid";

/// Number of blocks a filled order stays in the order book cache
pub const FILLED_ORDERS_RETENTION: u64 = 50;

/// Name of the `config` row holding the ledger version
pub const VERSION_CONFIG_KEY: &str = "VERSION_STRING";
