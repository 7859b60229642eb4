//! Serde helpers for JSON-RPC encodings: `0x` byte strings and hex quantities.

use serde::de::{self, Deserializer, Visitor};
use serde::Serializer;
use std::fmt;

/// Render bytes as a `0x`-prefixed lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a hex string with optional `0x` prefix.
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits)
}

/// `Vec<u8>` <-> `"0x…"`.
pub mod bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s: String = serde::Deserialize::deserialize(deserializer)?;
        from_hex(&s).map_err(de::Error::custom)
    }
}

/// Unsigned quantity that accepts `"0x1a"`, `"26"` or `26`; serialises as a number.
pub mod quantity {
    use super::*;

    pub fn serialize<S: Serializer, T: Into<u64> + Copy>(
        value: &T,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64((*value).into())
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        let raw = deserializer.deserialize_any(QuantityVisitor)?;
        T::try_from(raw).map_err(|_| de::Error::custom(format!("quantity {raw} out of range")))
    }

    struct QuantityVisitor;

    impl<'de> Visitor<'de> for QuantityVisitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a hex quantity string or an unsigned integer")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative quantity {v}")))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            parse_quantity(v).ok_or_else(|| E::custom(format!("invalid quantity '{v}'")))
        }
    }
}

/// Parse `"0x1a"` (hex) or `"26"` (decimal).
pub fn parse_quantity(s: &str) -> Option<u64> {
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => s.parse().ok(),
    }
}
