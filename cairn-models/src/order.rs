use crate::error::ModelsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order book state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// can be matched
    Open,
    /// fully matched
    Filled,
    /// cancelled by its source
    Cancelled,
    /// expiration reached
    Expired,
}

impl OrderStatus {
    /// Name stored in the `status` column
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Open => "open",
            OrderStatus::Filled => "filled",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ModelsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(OrderStatus::Open),
            "filled" => Ok(OrderStatus::Filled),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "expired" => Ok(OrderStatus::Expired),
            other => Err(ModelsError::UnknownOrderStatus(other.to_string())),
        }
    }
}

/// An `orders` row
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub tx_index: u64,
    pub tx_hash: String,
    pub block_index: u64,
    pub source: String,
    pub give_asset: String,
    pub give_quantity: i64,
    pub give_remaining: i64,
    pub get_asset: String,
    pub get_quantity: i64,
    pub get_remaining: i64,
    pub expiration: u64,
    pub expire_index: u64,
    pub fee_required: i64,
    pub fee_required_remaining: i64,
    pub fee_provided: i64,
    pub fee_provided_remaining: i64,
    pub status: OrderStatus,
}

impl Order {
    /// Column names of the `orders` table, in storage order
    pub const COLUMNS: [&'static str; 17] = [
        "tx_index",
        "tx_hash",
        "block_index",
        "source",
        "give_asset",
        "give_quantity",
        "give_remaining",
        "get_asset",
        "get_quantity",
        "get_remaining",
        "expiration",
        "expire_index",
        "fee_required",
        "fee_required_remaining",
        "fee_provided",
        "fee_provided_remaining",
        "status",
    ];
}
