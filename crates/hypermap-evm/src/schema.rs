//! The event-signature table.
//!
//! Maps each event's fingerprint to its ordered field list. Built once at
//! startup, either from the built-in Hypermap definitions or from a
//! contract JSON ABI.

use alloy_core::dyn_abi::DynSolType;
use alloy_json_abi::JsonAbi;
use hypermap_core::error::DecodeError;
use hypermap_core::event::EventKind;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::fingerprint;

/// ABI types that appear in Hypermap events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Address,
    Bytes32,
    Uint256,
    Bytes,
}

impl FieldType {
    pub fn abi_name(&self) -> &'static str {
        match self {
            FieldType::Address => "address",
            FieldType::Bytes32 => "bytes32",
            FieldType::Uint256 => "uint256",
            FieldType::Bytes => "bytes",
        }
    }

    /// The alloy dynamic type used for data-payload decoding.
    pub fn to_dyn(&self) -> DynSolType {
        match self {
            FieldType::Address => DynSolType::Address,
            FieldType::Bytes32 => DynSolType::FixedBytes(32),
            FieldType::Uint256 => DynSolType::Uint(256),
            FieldType::Bytes => DynSolType::Bytes,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abi_name())
    }
}

impl FromStr for FieldType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "address" => Ok(FieldType::Address),
            "bytes32" => Ok(FieldType::Bytes32),
            "uint256" | "uint" => Ok(FieldType::Uint256),
            "bytes" => Ok(FieldType::Bytes),
            other => Err(DecodeError::UnsupportedType { ty: other.to_string() }),
        }
    }
}

/// One event parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    /// Carried in topics[1..] rather than the data payload
    pub indexed: bool,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType, indexed: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed,
        }
    }
}

/// A single event's decoding schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSchema {
    pub kind: EventKind,
    /// Ordered field definitions (order matters for ABI decode)
    pub fields: Vec<FieldDef>,
    /// keccak256 of [`EventSchema::signature`]
    pub fingerprint: String,
}

impl EventSchema {
    pub fn new(kind: EventKind, fields: Vec<FieldDef>) -> Self {
        let signature = canonical_signature(kind, &fields);
        Self {
            kind,
            fingerprint: fingerprint::keccak256_signature(&signature),
            fields,
        }
    }

    /// `Name(type,type,...)`
    pub fn signature(&self) -> String {
        canonical_signature(self.kind, &self.fields)
    }

    /// Fields carried in topics[1..], in declaration order.
    pub fn indexed_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.indexed)
    }

    /// Fields carried in the data payload, in declaration order.
    pub fn data_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.indexed)
    }
}

fn canonical_signature(kind: EventKind, fields: &[FieldDef]) -> String {
    let types: Vec<_> = fields.iter().map(|f| f.ty.abi_name()).collect();
    format!("{kind}({})", types.join(","))
}

/// Fingerprint → schema lookup table.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    by_fingerprint: HashMap<String, EventSchema>,
}

impl EventTable {
    pub fn from_schemas(schemas: impl IntoIterator<Item = EventSchema>) -> Self {
        Self {
            by_fingerprint: schemas
                .into_iter()
                .map(|s| (s.fingerprint.clone(), s))
                .collect(),
        }
    }

    /// The Hypermap contract's events.
    pub fn hypermap() -> Self {
        use FieldType::*;
        let f = FieldDef::new;
        Self::from_schemas([
            EventSchema::new(
                EventKind::Mint,
                vec![
                    f("parenthash", Bytes32, true),
                    f("childhash", Bytes32, true),
                    f("labelhash", Bytes, true),
                    f("label", Bytes, false),
                ],
            ),
            EventSchema::new(
                EventKind::Fact,
                vec![
                    f("parenthash", Bytes32, true),
                    f("facthash", Bytes32, true),
                    f("labelhash", Bytes, true),
                    f("label", Bytes, false),
                    f("data", Bytes, false),
                ],
            ),
            EventSchema::new(
                EventKind::Note,
                vec![
                    f("parenthash", Bytes32, true),
                    f("notehash", Bytes32, true),
                    f("labelhash", Bytes, true),
                    f("label", Bytes, false),
                    f("data", Bytes, false),
                ],
            ),
            EventSchema::new(
                EventKind::Gene,
                vec![f("entry", Bytes32, true), f("gene", Address, true)],
            ),
            EventSchema::new(EventKind::Zero, vec![f("zeroTba", Address, true)]),
            EventSchema::new(
                EventKind::Transfer,
                vec![
                    f("from", Address, true),
                    f("to", Address, true),
                    f("id", Uint256, true),
                ],
            ),
            EventSchema::new(EventKind::Upgraded, vec![f("implementation", Address, true)]),
        ])
    }

    /// Build a table from a contract JSON ABI.
    ///
    /// Non-event items, anonymous events and events outside [`EventKind`]
    /// are ignored; an event using a type outside [`FieldType`] is an error.
    pub fn from_json_abi(json: &str) -> Result<Self, DecodeError> {
        let abi: JsonAbi = serde_json::from_str(json).map_err(|e| DecodeError::InvalidAbi {
            reason: e.to_string(),
        })?;

        let mut schemas = Vec::new();
        for event in abi.events() {
            if event.anonymous {
                continue;
            }
            let Ok(kind) = event.name.parse::<EventKind>() else {
                tracing::debug!(event = %event.name, "Ignoring non-Hypermap event in ABI");
                continue;
            };
            let fields = event
                .inputs
                .iter()
                .map(|p| -> Result<FieldDef, DecodeError> {
                    Ok(FieldDef::new(p.name.clone(), p.ty.parse()?, p.indexed))
                })
                .collect::<Result<Vec<_>, _>>()?;
            schemas.push(EventSchema::new(kind, fields));
        }

        if schemas.is_empty() {
            return Err(DecodeError::InvalidAbi {
                reason: "ABI declares no Hypermap events".into(),
            });
        }
        Ok(Self::from_schemas(schemas))
    }

    /// Look up a schema by fingerprint (case-insensitive).
    pub fn get(&self, fingerprint: &str) -> Option<&EventSchema> {
        self.by_fingerprint
            .get(fingerprint)
            .or_else(|| self.by_fingerprint.get(&fingerprint.to_ascii_lowercase()))
    }

    /// The schema registered for `kind`, if any.
    pub fn by_kind(&self, kind: EventKind) -> Option<&EventSchema> {
        self.by_fingerprint.values().find(|s| s.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventSchema> {
        self.by_fingerprint.values()
    }

    pub fn len(&self) -> usize {
        self.by_fingerprint.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_fingerprint.is_empty()
    }
}
