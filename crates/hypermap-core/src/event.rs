//! Raw and decoded event types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EventError;
use crate::hash::Namehash;
use crate::serde_hex;

/// A raw EVM log as returned by `eth_getLogs`.
/// This is the input to the event decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    /// Contract address that emitted the log
    pub address: String,
    /// topics[0] is the event signature hash; topics[1..] are indexed params
    pub topics: Vec<String>,
    /// ABI-encoded non-indexed parameters
    #[serde(with = "serde_hex::bytes")]
    pub data: Vec<u8>,
    #[serde(with = "serde_hex::quantity")]
    pub block_number: u64,
    pub transaction_hash: String,
    #[serde(with = "serde_hex::quantity")]
    pub log_index: u32,
    /// Set by the node when the log was dropped by a reorg
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
}

impl RawLog {
    /// The event signature hash (topics[0]), if present.
    pub fn signature(&self) -> Option<&str> {
        self.topics.first().map(|s| s.as_str())
    }

    /// Returns `true` if this log was removed by a reorg.
    pub fn is_removed(&self) -> bool {
        self.removed.unwrap_or(false)
    }
}

/// The closed set of Hypermap contract events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Mint,
    Note,
    Fact,
    Transfer,
    Gene,
    Zero,
    Upgraded,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::Mint,
        EventKind::Note,
        EventKind::Fact,
        EventKind::Transfer,
        EventKind::Gene,
        EventKind::Zero,
        EventKind::Upgraded,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Mint => "Mint",
            EventKind::Note => "Note",
            EventKind::Fact => "Fact",
            EventKind::Transfer => "Transfer",
            EventKind::Gene => "Gene",
            EventKind::Zero => "Zero",
            EventKind::Upgraded => "Upgraded",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown Hypermap event '{s}'"))
    }
}

/// A decoded event parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ParamValue {
    /// 20-byte address, `0x`-prefixed lowercase hex
    Address(String),
    /// Raw 32-byte topic or `bytes32`, `0x`-prefixed hex
    Hash(String),
    /// Dynamic byte string
    Bytes(#[serde(with = "serde_hex::bytes")] Vec<u8>),
    /// Unsigned integer rendered in decimal to avoid precision loss
    Uint(String),
    Null,
}

impl ParamValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

/// A log decoded against the event table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedEvent {
    pub kind: EventKind,
    pub block_number: u64,
    pub transaction_hash: String,
    pub log_index: u32,
    /// Parameter values keyed by ABI name, in declaration order
    pub params: IndexMap<String, ParamValue>,
}

impl DecodedEvent {
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    fn required(&self, name: &str) -> Result<&ParamValue, EventError> {
        match self.params.get(name) {
            Some(ParamValue::Null) | None => Err(EventError::MissingParam {
                name: name.to_string(),
            }),
            Some(v) => Ok(v),
        }
    }

    /// A `bytes32` parameter as a namehash.
    pub fn hash_param(&self, name: &str) -> Result<Namehash, EventError> {
        match self.required(name)? {
            ParamValue::Hash(h) => Namehash::from_hex(h).map_err(|_| EventError::WrongType {
                name: name.to_string(),
                expected: "bytes32",
            }),
            _ => Err(EventError::WrongType {
                name: name.to_string(),
                expected: "bytes32",
            }),
        }
    }

    /// A dynamic `bytes` parameter.
    pub fn bytes_param(&self, name: &str) -> Result<&[u8], EventError> {
        match self.required(name)? {
            ParamValue::Bytes(b) => Ok(b),
            _ => Err(EventError::WrongType {
                name: name.to_string(),
                expected: "bytes",
            }),
        }
    }

    pub fn address_param(&self, name: &str) -> Result<&str, EventError> {
        match self.required(name)? {
            ParamValue::Address(a) => Ok(a),
            _ => Err(EventError::WrongType {
                name: name.to_string(),
                expected: "address",
            }),
        }
    }

    /// An `address` parameter that may be absent; `Null` reads as `None`.
    pub fn optional_address_param(&self, name: &str) -> Result<Option<&str>, EventError> {
        match self.params.get(name) {
            Some(ParamValue::Null) => Ok(None),
            _ => self.address_param(name).map(Some),
        }
    }

    /// A `uint256` parameter in its decimal (or raw hex topic) rendering.
    pub fn uint_param(&self, name: &str) -> Result<&str, EventError> {
        match self.required(name)? {
            ParamValue::Uint(v) | ParamValue::Hash(v) => Ok(v),
            _ => Err(EventError::WrongType {
                name: name.to_string(),
                expected: "uint256",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> DecodedEvent {
        let mut params = IndexMap::new();
        params.insert(
            "parenthash".to_string(),
            ParamValue::Hash(Namehash::ROOT.to_string()),
        );
        params.insert("label".to_string(), ParamValue::Bytes(b"alice".to_vec()));
        params.insert("labelhash".to_string(), ParamValue::Null);
        DecodedEvent {
            kind: EventKind::Mint,
            block_number: 10,
            transaction_hash: "0xabc".into(),
            log_index: 0,
            params,
        }
    }

    #[test]
    fn raw_log_from_rpc_json() {
        let json = r#"{
            "address": "0x000000000044c6b8cb4d8f0f889a3e47664eaeda",
            "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
            "data": "0x0102",
            "blockNumber": "0x1a01b70",
            "transactionHash": "0xfeed",
            "logIndex": "0x3",
            "blockHash": "0xbeef",
            "removed": false
        }"#;
        let log: RawLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.block_number, 27_270_000);
        assert_eq!(log.log_index, 3);
        assert_eq!(log.data, vec![1, 2]);
        assert!(!log.is_removed());
        assert!(log.signature().unwrap().starts_with("0xddf252ad"));
    }

    #[test]
    fn raw_log_accepts_plain_numbers() {
        let json = r#"{"address":"0x0","topics":[],"data":"0x","blockNumber":11,"transactionHash":"0x1","logIndex":2}"#;
        let log: RawLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.block_number, 11);
        assert_eq!(log.log_index, 2);
        assert!(log.signature().is_none());
    }

    #[test]
    fn event_kind_parses_names() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("Approval".parse::<EventKind>().is_err());
    }

    #[test]
    fn typed_param_accessors() {
        let e = sample_event();
        assert_eq!(e.hash_param("parenthash").unwrap(), Namehash::ROOT);
        assert_eq!(e.bytes_param("label").unwrap(), b"alice");
        assert!(matches!(
            e.bytes_param("labelhash"),
            Err(EventError::MissingParam { .. })
        ));
        assert!(matches!(
            e.address_param("label"),
            Err(EventError::WrongType { .. })
        ));
    }

    #[test]
    fn optional_address_reads_null_as_none() {
        let e = sample_event();
        assert_eq!(e.optional_address_param("labelhash").unwrap(), None);
        assert!(matches!(
            e.optional_address_param("label"),
            Err(EventError::WrongType { .. })
        ));
        assert!(matches!(
            e.optional_address_param("owner"),
            Err(EventError::MissingParam { .. })
        ));
    }
}
