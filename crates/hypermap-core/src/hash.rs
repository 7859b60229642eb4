//! The 32-byte namehash that keys every namespace entry.

use alloy_primitives::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::EventError;

/// The reserved EVM zero address. A `Transfer` from it is a mint.
pub const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";

/// Returns `true` if `address` is the zero address (case-insensitive).
pub fn is_zero_address(address: &str) -> bool {
    address.eq_ignore_ascii_case(ZERO_ADDRESS)
}

/// Error parsing a namehash from its hex form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashParseError {
    #[error("namehash is empty")]
    Empty,
    #[error("namehash has {0} hex digits, at most 64 allowed")]
    TooLong(usize),
    #[error("namehash is not valid hex: {0}")]
    InvalidHex(String),
}

/// A 32-byte namespace identifier.
///
/// Rendered as a lowercase `0x`-prefixed, 64-digit hex string. Shorter hex
/// input is left-padded with zeroes, which is how ERC-721 token ids map
/// onto entries.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namehash([u8; 32]);

impl Namehash {
    /// The root of the namespace tree.
    pub const ROOT: Namehash = Namehash([0u8; 32]);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        *self == Self::ROOT
    }

    /// Parse a hex string, with or without `0x`, left-padding to 32 bytes.
    pub fn from_hex(s: &str) -> Result<Self, HashParseError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(HashParseError::Empty);
        }
        if digits.len() > 64 {
            return Err(HashParseError::TooLong(digits.len()));
        }
        let padded = format!("{digits:0>64}");
        let mut out = [0u8; 32];
        hex::decode_to_slice(&padded, &mut out)
            .map_err(|e| HashParseError::InvalidHex(e.to_string()))?;
        Ok(Self(out))
    }

    /// Convert a `Transfer` token id into the namehash it names.
    ///
    /// Accepts the decimal rendering produced for indexed `uint256` topics,
    /// or a `0x` hex string.
    pub fn from_token_id(id: &str) -> Result<Self, EventError> {
        let malformed = |reason: String| EventError::MalformedTokenId {
            id: id.to_string(),
            reason,
        };
        if id.starts_with("0x") || id.starts_with("0X") {
            return Self::from_hex(id).map_err(|e| malformed(e.to_string()));
        }
        if id.is_empty() {
            return Err(malformed("empty token id".into()));
        }
        let value = U256::from_str_radix(id, 10).map_err(|e| malformed(e.to_string()))?;
        Ok(Self(value.to_be_bytes::<32>()))
    }
}

impl fmt::Display for Namehash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Namehash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namehash({self})")
    }
}

impl FromStr for Namehash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Namehash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Namehash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
