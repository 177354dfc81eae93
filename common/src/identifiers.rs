//! Account identifiers for the TinyDEX ledger.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Width of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Errors produced while parsing an [`Address`] from text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// The input did not start with `0x`.
    #[error("Address must be 0x-prefixed: {0}")]
    MissingPrefix(String),

    /// The hex body had the wrong number of digits.
    #[error("Address must be {expected} hex digits, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// The hex body contained a non-hex character.
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),
}

/// Opaque fixed-width account identifier.
///
/// [`Address::ZERO`] is reserved: it never holds a balance and is rejected
/// as a transfer recipient or an approval spender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    /// The reserved null address.
    pub const ZERO: Address = Address([0u8; ADDRESS_LEN]);

    /// Derive a deterministic address from a label.
    ///
    /// Takes the trailing 20 bytes of `SHA-256(label)`. Used for fixtures,
    /// the default deployer and simulated accounts.
    pub fn derive(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(&digest[32 - ADDRESS_LEN..]);
        Self(bytes)
    }

    /// Check whether this is the reserved null address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LEN]
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| AddressError::MissingPrefix(s.to_string()))?;

        if body.len() != ADDRESS_LEN * 2 {
            return Err(AddressError::InvalidLength {
                expected: ADDRESS_LEN * 2,
                actual: body.len(),
            });
        }

        let mut bytes = [0u8; ADDRESS_LEN];
        hex::decode_to_slice(body, &mut bytes)
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(Address::default().is_zero());
        assert!(!Address::derive("alice").is_zero());
        assert_eq!(
            Address::ZERO.to_string(),
            "0x0000000000000000000000000000000000000000"
        );
    }

    #[test]
    fn test_derive_is_deterministic() {
        assert_eq!(Address::derive("alice"), Address::derive("alice"));
        assert_ne!(Address::derive("alice"), Address::derive("bob"));
    }

    #[test]
    fn test_parse_display() {
        let addr = Address::derive("deployer");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(parsed, addr);

        let upper: Address = "0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD".parse().unwrap();
        assert_eq!(upper.to_hex(), "0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "1234".parse::<Address>(),
            Err(AddressError::MissingPrefix(_))
        ));
        assert_eq!(
            "0x1234".parse::<Address>(),
            Err(AddressError::InvalidLength {
                expected: 40,
                actual: 4
            })
        );
        assert!(matches!(
            "0xzz00000000000000000000000000000000000000".parse::<Address>(),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_serde_as_hex_string() {
        let addr = Address::derive("bob");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr.to_hex()));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
