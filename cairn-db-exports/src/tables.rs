use crate::error::DatabaseError;
use cairn_models::Order;

/// A ledger table events are allowed to write to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerTable {
    /// table name, also the `category` of its events
    pub name: &'static str,
    /// writable columns
    pub columns: &'static [&'static str],
    /// column identifying a row across versions, for tables supporting updates
    pub key: Option<&'static str>,
}

/// Issuance rows
pub const ISSUANCES: LedgerTable = LedgerTable {
    name: "issuances",
    columns: &[
        "tx_index",
        "tx_hash",
        "block_index",
        "asset",
        "asset_longname",
        "quantity",
        "divisible",
        "source",
        "issuer",
        "description",
        "status",
    ],
    key: None,
};

/// Destruction rows
pub const DESTRUCTIONS: LedgerTable = LedgerTable {
    name: "destructions",
    columns: &[
        "tx_index",
        "tx_hash",
        "block_index",
        "source",
        "asset",
        "quantity",
        "tag",
        "status",
    ],
    key: None,
};

/// Order book rows
pub const ORDERS: LedgerTable = LedgerTable {
    name: "orders",
    columns: &Order::COLUMNS,
    key: Some("tx_hash"),
};

/// Balance snapshots, by address or by UTXO
pub const BALANCES: LedgerTable = LedgerTable {
    name: "balances",
    columns: &[
        "address",
        "utxo",
        "asset",
        "quantity",
        "block_index",
        "tx_index",
    ],
    key: None,
};

/// Every table events may write to
pub const LEDGER_TABLES: [LedgerTable; 4] = [ISSUANCES, DESTRUCTIONS, ORDERS, BALANCES];

impl LedgerTable {
    /// Looks a table up by event category
    pub fn by_name(name: &str) -> Result<LedgerTable, DatabaseError> {
        LEDGER_TABLES
            .iter()
            .find(|table| table.name == name)
            .copied()
            .ok_or_else(|| DatabaseError::UnknownTable(name.to_string()))
    }

    /// Fails if `column` is not writable in this table
    pub fn check_column(&self, column: &str) -> Result<(), DatabaseError> {
        if self.columns.contains(&column) {
            Ok(())
        } else {
            Err(DatabaseError::UnknownColumn {
                table: self.name.to_string(),
                column: column.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitelist() {
        let orders = LedgerTable::by_name("orders").unwrap();
        assert_eq!(orders.key, Some("tx_hash"));
        assert!(orders.check_column("give_remaining").is_ok());
        assert!(orders.check_column("status; DROP TABLE orders").is_err());
        assert!(LedgerTable::by_name("blocks").is_err());
    }
}
