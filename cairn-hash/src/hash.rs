// Copyright (c) 2022 MASSA LABS <info@massa.net>
use crate::error::HashError;
use crate::settings::HASH_SIZE_BYTES;
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// A SHA-256 digest, displayed and serialized as lowercase hex.
#[derive(Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Hash)]
pub struct Hash([u8; HASH_SIZE_BYTES]);

impl std::fmt::Display for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Hash {
    /// Compute a single SHA-256 hash from data.
    ///
    /// # Example
    ///  ```
    /// # use cairn_hash::Hash;
    /// let hash = Hash::compute_from(b"hello world");
    /// assert_eq!(
    ///     hash.to_hex(),
    ///     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
    /// );
    /// ```
    pub fn compute_from(data: &[u8]) -> Self {
        Hash(Sha256::digest(data).into())
    }

    /// Compute SHA-256 applied twice, the digest used by the ledger hash chain.
    ///
    /// # Example
    ///  ```
    /// # use cairn_hash::Hash;
    /// let once = Hash::compute_from(b"abc");
    /// let twice = Hash::compute_double_from(b"abc");
    /// assert_eq!(twice, Hash::compute_from(&once.to_bytes()));
    /// ```
    pub fn compute_double_from(data: &[u8]) -> Self {
        let first = Sha256::digest(data);
        Hash(Sha256::digest(first).into())
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a hex digest.
    ///
    /// # Example
    ///  ```
    /// # use cairn_hash::Hash;
    /// let hash = Hash::compute_from(b"hello world");
    /// assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);
    /// ```
    pub fn from_hex(data: &str) -> Result<Hash, HashError> {
        let bytes = hex::decode(data).map_err(|err| HashError::ParsingError(err.to_string()))?;
        Hash::from_slice(&bytes)
    }

    /// Build a hash from a byte slice of the right length.
    pub fn from_slice(data: &[u8]) -> Result<Hash, HashError> {
        let bytes: [u8; HASH_SIZE_BYTES] =
            data.try_into().map_err(|_| HashError::WrongLength {
                expected: HASH_SIZE_BYTES,
                got: data.len(),
            })?;
        Ok(Hash(bytes))
    }

    /// Digest bytes.
    pub fn to_bytes(&self) -> [u8; HASH_SIZE_BYTES] {
        self.0
    }
}

impl FromStr for Hash {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

impl ::serde::Serialize for Hash {
    fn serialize<S: ::serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        if s.is_human_readable() {
            s.collect_str(&self.to_hex())
        } else {
            s.serialize_bytes(&self.0)
        }
    }
}

impl<'de> ::serde::Deserialize<'de> for Hash {
    fn deserialize<D: ::serde::Deserializer<'de>>(d: D) -> Result<Hash, D::Error> {
        if d.is_human_readable() {
            let s = String::deserialize(d)?;
            Hash::from_hex(&s).map_err(::serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(d)?;
            Hash::from_slice(&bytes).map_err(::serde::de::Error::custom)
        }
    }
}

/// Hex SHA-256 of a UTF-8 string.
pub fn sha256_hex(data: &str) -> String {
    Hash::compute_from(data.as_bytes()).to_hex()
}

/// Hex double SHA-256 of a UTF-8 string.
pub fn dhash_hex(data: &str) -> String {
    Hash::compute_double_from(data.as_bytes()).to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip_through_serde() {
        let hash = Hash::compute_from(b"ledger");
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);
    }

    #[test]
    fn test_dhash_is_sha256_of_sha256() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            dhash_hex(""),
            "5df6e0e2761359d30a8275058e299fcc0381534545f55cf43e41983f5d4c9456"
        );
    }

    #[test]
    fn test_wrong_length_rejected() {
        assert!(matches!(
            Hash::from_hex("abcd"),
            Err(HashError::WrongLength { got: 2, .. })
        ));
        assert!(Hash::from_hex("zz").is_err());
    }
}
