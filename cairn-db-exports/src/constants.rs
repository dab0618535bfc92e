// Pragmas
pub const CONNECTION_PRAGMAS: &str = "PRAGMA case_sensitive_like = ON;
PRAGMA foreign_keys = ON;
PRAGMA defer_foreign_keys = ON;";
pub const WRITER_PRAGMAS: &str = "PRAGMA auto_vacuum = 1;
PRAGMA journal_mode = WAL;
PRAGMA synchronous = normal;
PRAGMA journal_size_limit = 6144000;";

// Schema
pub const CREATE_BLOCKS: &str = "CREATE TABLE IF NOT EXISTS blocks(
    block_index INTEGER UNIQUE,
    block_hash TEXT UNIQUE,
    previous_block_hash TEXT,
    block_time INTEGER,
    ledger_hash TEXT,
    txlist_hash TEXT,
    messages_hash TEXT,
    transaction_count INTEGER DEFAULT 0,
    PRIMARY KEY (block_index, block_hash)
);
CREATE INDEX IF NOT EXISTS blocks_block_hash_idx ON blocks (block_hash);";

pub const CREATE_TRANSACTIONS: &str = "CREATE TABLE IF NOT EXISTS transactions(
    tx_index INTEGER UNIQUE,
    tx_hash TEXT UNIQUE,
    block_index INTEGER,
    block_hash TEXT,
    block_time INTEGER,
    source TEXT,
    destination TEXT,
    btc_amount INTEGER,
    fee INTEGER,
    data BLOB,
    supported BOOL DEFAULT 1,
    utxos_info TEXT,
    transaction_type TEXT,
    FOREIGN KEY (block_index, block_hash) REFERENCES blocks(block_index, block_hash),
    PRIMARY KEY (tx_index, tx_hash, block_index)
);
CREATE INDEX IF NOT EXISTS transactions_block_index_idx ON transactions (block_index);
CREATE INDEX IF NOT EXISTS transactions_tx_hash_idx ON transactions (tx_hash);
CREATE INDEX IF NOT EXISTS transactions_type_utxos_idx ON transactions (transaction_type, utxos_info);
CREATE TABLE IF NOT EXISTS transactions_status(
    tx_index INTEGER PRIMARY KEY,
    block_index INTEGER,
    valid BOOL
);
CREATE VIEW IF NOT EXISTS transactions_with_status AS
    SELECT transactions.*, transactions_status.valid
    FROM transactions LEFT JOIN transactions_status
    ON transactions.tx_index = transactions_status.tx_index;";

pub const CREATE_MESSAGES: &str = "CREATE TABLE IF NOT EXISTS messages(
    message_index INTEGER PRIMARY KEY,
    block_index INTEGER,
    command TEXT,
    category TEXT,
    bindings TEXT,
    timestamp INTEGER,
    event TEXT,
    tx_hash TEXT,
    event_hash TEXT
);
CREATE INDEX IF NOT EXISTS messages_block_index_idx ON messages (block_index);
CREATE INDEX IF NOT EXISTS messages_event_idx ON messages (event);
CREATE TABLE IF NOT EXISTS mempool(
    tx_hash TEXT,
    command TEXT,
    category TEXT,
    bindings TEXT,
    timestamp INTEGER,
    event TEXT
);
CREATE INDEX IF NOT EXISTS mempool_tx_hash_idx ON mempool (tx_hash);";

pub const CREATE_LEDGER_TABLES: &str = "CREATE TABLE IF NOT EXISTS issuances(
    tx_index INTEGER,
    tx_hash TEXT,
    block_index INTEGER,
    asset TEXT,
    asset_longname TEXT,
    quantity INTEGER,
    divisible BOOL,
    source TEXT,
    issuer TEXT,
    description TEXT,
    status TEXT
);
CREATE INDEX IF NOT EXISTS issuances_asset_status_idx ON issuances (asset, status);
CREATE INDEX IF NOT EXISTS issuances_asset_longname_idx ON issuances (asset_longname);
CREATE INDEX IF NOT EXISTS issuances_block_index_idx ON issuances (block_index);
CREATE TABLE IF NOT EXISTS destructions(
    tx_index INTEGER,
    tx_hash TEXT,
    block_index INTEGER,
    source TEXT,
    asset TEXT,
    quantity INTEGER,
    tag TEXT,
    status TEXT
);
CREATE INDEX IF NOT EXISTS destructions_asset_status_idx ON destructions (asset, status);
CREATE INDEX IF NOT EXISTS destructions_block_index_idx ON destructions (block_index);
CREATE TABLE IF NOT EXISTS orders(
    tx_index INTEGER,
    tx_hash TEXT,
    block_index INTEGER,
    source TEXT,
    give_asset TEXT,
    give_quantity INTEGER,
    give_remaining INTEGER,
    get_asset TEXT,
    get_quantity INTEGER,
    get_remaining INTEGER,
    expiration INTEGER,
    expire_index INTEGER,
    fee_required INTEGER,
    fee_required_remaining INTEGER,
    fee_provided INTEGER,
    fee_provided_remaining INTEGER,
    status TEXT
);
CREATE INDEX IF NOT EXISTS orders_tx_hash_idx ON orders (tx_hash);
CREATE INDEX IF NOT EXISTS orders_block_index_idx ON orders (block_index);
CREATE TABLE IF NOT EXISTS balances(
    address TEXT,
    utxo TEXT,
    asset TEXT,
    quantity INTEGER,
    block_index INTEGER,
    tx_index INTEGER
);
CREATE INDEX IF NOT EXISTS balances_utxo_asset_idx ON balances (utxo, asset);
CREATE INDEX IF NOT EXISTS balances_address_asset_idx ON balances (address, asset);
CREATE INDEX IF NOT EXISTS balances_block_index_idx ON balances (block_index);";

pub const CREATE_CONFIG: &str = "CREATE TABLE IF NOT EXISTS config(
    name TEXT PRIMARY KEY,
    value TEXT
);";

/// Every table holding per-block rows, children before parents so deletions respect foreign keys
pub const BLOCK_INDEXED_TABLES: [&str; 8] = [
    "messages",
    "issuances",
    "destructions",
    "orders",
    "balances",
    "transactions_status",
    "transactions",
    "blocks",
];

/// Tables dropped and recreated by a full rebuild, in drop order
pub const REBUILT_TABLES: [&str; 10] = [
    "messages",
    "mempool",
    "issuances",
    "destructions",
    "orders",
    "balances",
    "transactions_status",
    "transactions",
    "blocks",
    "config",
];
