//! Hashing and addressing primitives
//!
//! Identifiers in the governance engine are content-addressed: a SHA-256 over a
//! canonical (bincode) encoding of the defining input, combined with a
//! domain-separation hash such as the creating component's address or the
//! enclosing transaction id.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Error types for cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Error during hashing
    #[error("Hashing error: {0}")]
    HashingError(String),

    /// Malformed hex input
    #[error("Invalid hex: {0}")]
    InvalidHex(String),
}

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// A 32-byte SHA-256 digest
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The all-zero hash, used as "no value"
    pub const fn empty() -> Self {
        Self([0u8; 32])
    }

    /// Whether this is the all-zero hash
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Get the bytes of the hash
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert hash to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create a hash from a hex string
    pub fn from_hex(hex_str: &str) -> CryptoResult<Self> {
        let bytes = hex::decode(hex_str).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidHex(format!("expected 32 bytes: {}", hex_str)))?;
        Ok(Self(array))
    }

    /// Hash raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        sha256(data)
    }

    /// Hash a string
    pub fn from_str_data(data: &str) -> Self {
        sha256(data.as_bytes())
    }

    /// Hash the canonical encoding of a serializable value
    pub fn compute_from<T: Serialize + ?Sized>(value: &T) -> CryptoResult<Self> {
        let encoded = bincode::serialize(value).map_err(|e| CryptoError::HashingError(e.to_string()))?;
        Ok(sha256(&encoded))
    }

    /// Hash the concatenation of several hashes, in order
    pub fn concat_and_compute(parts: &[Hash]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.0);
        }
        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HashVisitor;

        impl<'de> Visitor<'de> for HashVisitor {
            type Value = Hash;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a 64 character hex string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Hash, E> {
                Hash::from_hex(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(HashVisitor)
    }
}

/// Calculate SHA-256 hash of data
pub fn sha256(data: &[u8]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Hash(hasher.finalize().into())
}

/// An account or component address
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address from its string form
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The string form of the address
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address is blank
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Derive the virtual account owned by `owner` for the given seed.
    ///
    /// Only `owner` can move funds out of a virtual account, which is how
    /// components escrow tokens without holding keys.
    pub fn virtual_of(owner: &Address, seed: &Hash) -> Address {
        let digest = Hash::concat_and_compute(&[Hash::from_str_data(owner.as_str()), *seed]);
        Address(format!("0x{}", &digest.to_hex()[..40]))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Sample {
        name: &'static str,
        count: u32,
    }

    #[test]
    fn test_compute_from_is_deterministic() {
        let a = Hash::compute_from(&Sample { name: "scheme", count: 1 }).unwrap();
        let b = Hash::compute_from(&Sample { name: "scheme", count: 1 }).unwrap();
        let c = Hash::compute_from(&Sample { name: "scheme", count: 2 }).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_concat_order_matters() {
        let a = Hash::from_str_data("a");
        let b = Hash::from_str_data("b");
        assert_ne!(Hash::concat_and_compute(&[a, b]), Hash::concat_and_compute(&[b, a]));
    }

    #[test]
    fn test_hex_round_trip_and_serde() {
        let hash = Hash::from_str_data("dao");
        assert_eq!(Hash::from_hex(&hash.to_hex()).unwrap(), hash);

        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);

        assert!(Hash::from_hex("abcd").is_err());
    }

    #[test]
    fn test_virtual_address_depends_on_owner_and_seed() {
        let seed = Hash::from_str_data("lock");
        let vote = Address::new("vote");
        let election = Address::new("election");

        let a = Address::virtual_of(&vote, &seed);
        assert_eq!(a, Address::virtual_of(&vote, &seed));
        assert_ne!(a, Address::virtual_of(&election, &seed));
        assert_ne!(a, Address::virtual_of(&vote, &Hash::from_str_data("other")));
        assert!(a.as_str().starts_with("0x"));
    }
}
