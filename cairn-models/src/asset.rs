use crate::config::VALID_STATUS;
use serde::{Deserialize, Serialize};

/// Latest valid issuance of an asset, as stored in `issuances`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// transaction that issued
    pub tx_index: u64,
    /// transaction id
    pub tx_hash: String,
    /// block of the issuance
    pub block_index: u64,
    /// short name
    pub asset: String,
    /// `PARENT.child` name of a subasset
    #[serde(default)]
    pub asset_longname: Option<String>,
    /// quantity issued by this issuance
    pub quantity: i64,
    /// whether the asset is divisible
    pub divisible: bool,
    /// address that sent the issuance
    pub source: String,
    /// owner after the issuance
    pub issuer: String,
    /// free text
    #[serde(default)]
    pub description: String,
    /// `valid` or `invalid: <reason>`
    pub status: String,
}

impl AssetRecord {
    /// Whether the issuance took effect
    pub fn is_valid(&self) -> bool {
        self.status == VALID_STATUS
    }
}

/// A `destructions` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destruction {
    /// transaction that destroyed
    pub tx_index: u64,
    /// transaction id
    pub tx_hash: String,
    /// block of the destruction
    pub block_index: u64,
    /// address the quantity was destroyed from
    pub source: String,
    /// destroyed asset
    pub asset: String,
    /// destroyed quantity
    pub quantity: i64,
    /// free text
    #[serde(default)]
    pub tag: String,
    /// `valid` or `invalid: <reason>`
    pub status: String,
}

impl Destruction {
    /// Whether the destruction took effect
    pub fn is_valid(&self) -> bool {
        self.status == VALID_STATUS
    }
}
