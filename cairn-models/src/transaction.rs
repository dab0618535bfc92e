use crate::config::ADDRESS_SEPARATOR;
use crate::error::ModelsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Undecoded transaction as delivered by the chain source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransaction(pub Vec<u8>);

/// Kind of a transaction as classified when it was decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// not classified
    #[default]
    Unknown,
    /// plain transfer
    Send,
    /// attaches assets to an UTXO
    Attach,
    /// detaches assets from an UTXO
    Detach,
    /// moves the assets of an UTXO to another one
    Utxomove,
}

impl TransactionType {
    /// Name stored in the `transaction_type` column
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Unknown => "unknown",
            TransactionType::Send => "send",
            TransactionType::Attach => "attach",
            TransactionType::Detach => "detach",
            TransactionType::Utxomove => "utxomove",
        }
    }
}

impl FromStr for TransactionType {
    type Err = ModelsError;

    /// Unrecognized names fall back to `Unknown`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "send" => TransactionType::Send,
            "attach" => TransactionType::Attach,
            "detach" => TransactionType::Detach,
            "utxomove" => TransactionType::Utxomove,
            _ => TransactionType::Unknown,
        })
    }
}

/// A decoded transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// transaction id
    pub tx_hash: String,
    /// sending address, empty when it could not be determined
    pub source: String,
    /// receiving address, may be empty
    pub destination: String,
    /// amount paid to the destination
    pub btc_amount: u64,
    /// miner fee
    pub fee: u64,
    /// embedded payload, starting with the message type id
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
    /// packed UTXO movements, see [`UtxosInfo`]
    pub utxos_info: String,
    /// classification
    pub transaction_type: TransactionType,
}

impl Transaction {
    /// Whether source or destination contains the multisig separator
    pub fn has_separator_collision(&self) -> bool {
        self.source.contains(ADDRESS_SEPARATOR) || self.destination.contains(ADDRESS_SEPARATOR)
    }

    /// Decoded `utxos_info`
    pub fn utxos(&self) -> UtxosInfo {
        UtxosInfo::parse(&self.utxos_info)
    }

    /// Content of the transaction folded into the txlist hash
    pub fn txlist_chunk(&self) -> String {
        format!(
            "{}{}{}{}{}{}",
            self.tx_hash,
            self.source,
            self.destination,
            self.btc_amount,
            self.fee,
            hex::encode(&self.data)
        )
    }
}

/// Packed UTXO movements of a transaction:
/// `"<src1,src2,...> <destination> <num_outputs> [op_return_output]"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UtxosInfo {
    /// spent UTXOs
    pub sources: Vec<String>,
    /// first non-OP_RETURN output
    pub destination: Option<String>,
    /// number of outputs
    pub num_outputs: Option<u32>,
    /// index of the OP_RETURN output
    pub op_return_output: Option<u32>,
}

impl UtxosInfo {
    /// Lenient decoding: missing or malformed fields are left empty.
    ///
    /// ```
    /// # use cairn_models::UtxosInfo;
    /// let info = UtxosInfo::parse("aa:0,bb:1 cc:0 2 1");
    /// assert_eq!(info.sources, vec!["aa:0", "bb:1"]);
    /// assert_eq!(info.destination.as_deref(), Some("cc:0"));
    /// assert_eq!(info.op_return_output, Some(1));
    /// assert_eq!(UtxosInfo::parse(" dd:0 1").destination.as_deref(), Some("dd:0"));
    /// ```
    pub fn parse(packed: &str) -> Self {
        let mut parts = packed.split(' ');
        let sources = parts
            .next()
            .map(|sources| {
                sources
                    .split(',')
                    .filter(|utxo| !utxo.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let destination = parts
            .next()
            .filter(|utxo| !utxo.is_empty())
            .map(str::to_string);
        let num_outputs = parts.next().and_then(|n| n.parse().ok());
        let op_return_output = parts.next().and_then(|n| n.parse().ok());
        UtxosInfo {
            sources,
            destination,
            num_outputs,
            op_return_output,
        }
    }

    /// Strict decoding, rejecting strings with less than three fields.
    pub fn parse_strict(packed: &str) -> Result<Self, ModelsError> {
        let fields = packed.split(' ').count();
        if !(3..=4).contains(&fields) {
            return Err(ModelsError::InvalidUtxosInfo(packed.to_string()));
        }
        let info = UtxosInfo::parse(packed);
        if info.num_outputs.is_none() {
            return Err(ModelsError::InvalidUtxosInfo(packed.to_string()));
        }
        Ok(info)
    }

    /// Whether `utxo` is one of the spent UTXOs
    pub fn spends(&self, utxo: &str) -> bool {
        self.sources.iter().any(|source| source == utxo)
    }
}

impl fmt::Display for UtxosInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.sources.join(","),
            self.destination.as_deref().unwrap_or(""),
            self.num_outputs.unwrap_or(0)
        )?;
        if let Some(op_return) = self.op_return_output {
            write!(f, " {}", op_return)?;
        }
        Ok(())
    }
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(source: &str, destination: &str) -> Transaction {
        Transaction {
            tx_hash: "aa".into(),
            source: source.into(),
            destination: destination.into(),
            btc_amount: 5430,
            fee: 10_000,
            data: vec![0, 0, 0, 20, 1],
            utxos_info: String::new(),
            transaction_type: TransactionType::Unknown,
        }
    }

    #[test]
    fn test_separator_collision() {
        assert!(!tx("addr", "dest").has_separator_collision());
        assert!(tx("1_a-b_2", "").has_separator_collision());
        assert!(tx("addr", "x-y").has_separator_collision());
    }

    #[test]
    fn test_txlist_chunk_layout() {
        assert_eq!(tx("src", "dst").txlist_chunk(), "aasrcdst5430100000000001401");
    }

    #[test]
    fn test_utxos_info_display_round_trip() {
        let packed = "aa:0,bb:1 cc:0 3 2";
        assert_eq!(UtxosInfo::parse(packed).to_string(), packed);
        let info = UtxosInfo::parse_strict(" cc:0 1").unwrap();
        assert!(info.sources.is_empty());
        assert!(!info.spends("cc:0"));
        assert!(UtxosInfo::parse_strict("garbage").is_err());
    }

    #[test]
    fn test_json_data_is_hex() {
        let json = serde_json::to_value(tx("s", "d")).unwrap();
        assert_eq!(json["data"], "0000001401");
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back.data, vec![0, 0, 0, 20, 1]);
    }
}
