//! `EventDecoder`: turns raw Hypermap logs into [`DecodedEvent`]s.
//!
//! - topics[0] selects the schema from the [`EventTable`]
//! - topics[1..] carry the indexed parameters, one 32-byte word each
//! - `data` carries the remaining parameters as an ABI-encoded tuple

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use hypermap_core::error::DecodeError;
use hypermap_core::event::{DecodedEvent, ParamValue, RawLog};
use hypermap_core::serde_hex::to_hex;
use indexmap::IndexMap;
use rayon::prelude::*;

use crate::fingerprint;
use crate::normalizer;
use crate::schema::{EventSchema, EventTable, FieldDef, FieldType};

/// Result of decoding a batch of logs.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    /// Successfully decoded events, in input order
    pub events: Vec<DecodedEvent>,
    /// Logs whose topics[0] matched no schema
    pub unknown: usize,
    /// Logs that matched a schema but failed to decode
    pub failed: usize,
}

/// Decodes logs against an [`EventTable`].
/// Stateless apart from the table; safe to share across threads.
#[derive(Debug, Clone)]
pub struct EventDecoder {
    table: EventTable,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new(EventTable::hypermap())
    }
}

impl EventDecoder {
    pub fn new(table: EventTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &EventTable {
        &self.table
    }

    /// Decode one log.
    ///
    /// Returns `Ok(None)` when the log carries no topics or its signature
    /// is not in the table.
    pub fn decode(&self, log: &RawLog) -> Result<Option<DecodedEvent>, DecodeError> {
        let Some(fp) = fingerprint::from_topics(&log.topics) else {
            return Ok(None);
        };
        let Some(schema) = self.table.get(&fp) else {
            return Ok(None);
        };
        self.decode_with(log, schema).map(Some)
    }

    fn decode_with(&self, log: &RawLog, schema: &EventSchema) -> Result<DecodedEvent, DecodeError> {
        let mut indexed = IndexMap::new();
        for (i, field) in schema.indexed_fields().enumerate() {
            // topics[0] is the signature
            let value = match log.topics.get(i + 1) {
                Some(topic) => decode_topic(topic, field.ty)?,
                None => ParamValue::Null,
            };
            indexed.insert(field.name.clone(), value);
        }

        let data_fields: Vec<&FieldDef> = schema.data_fields().collect();
        let mut data = decode_data(&log.data, &data_fields)?;

        // Keep declaration order in `params`
        let params = schema
            .fields
            .iter()
            .map(|f| {
                let value = if f.indexed {
                    indexed.shift_remove(&f.name)
                } else {
                    data.shift_remove(&f.name)
                };
                (f.name.clone(), value.unwrap_or(ParamValue::Null))
            })
            .collect();

        Ok(DecodedEvent {
            kind: schema.kind,
            block_number: log.block_number,
            transaction_hash: log.transaction_hash.clone(),
            log_index: log.log_index,
            params,
        })
    }

    /// Decode a batch in parallel with Rayon.
    ///
    /// Unknown signatures are dropped silently; decode failures are dropped
    /// with a warning. Output keeps the input order.
    pub fn decode_batch(&self, logs: &[RawLog]) -> DecodeOutcome {
        let results: Vec<Result<Option<DecodedEvent>, DecodeError>> =
            logs.par_iter().map(|log| self.decode(log)).collect();

        let mut outcome = DecodeOutcome {
            events: Vec::with_capacity(logs.len()),
            ..Default::default()
        };
        for (log, result) in logs.iter().zip(results) {
            match result {
                Ok(Some(event)) => outcome.events.push(event),
                Ok(None) => outcome.unknown += 1,
                Err(err) => {
                    tracing::warn!(
                        block = log.block_number,
                        log_index = log.log_index,
                        tx = %log.transaction_hash,
                        error = %err,
                        "Error decoding event, skipping"
                    );
                    outcome.failed += 1;
                }
            }
        }
        outcome
    }
}

/// Decode a single indexed topic.
///
/// Dynamic `bytes` are stored as their keccak256 in topic position, so the
/// raw word is kept as a hash.
fn decode_topic(topic: &str, ty: FieldType) -> Result<ParamValue, DecodeError> {
    let hex = topic.strip_prefix("0x").unwrap_or(topic);
    let bytes = hex::decode(hex).map_err(|e| DecodeError::InvalidTopic {
        topic: topic.to_string(),
        reason: e.to_string(),
    })?;
    if bytes.len() != 32 {
        return Err(DecodeError::InvalidTopic {
            topic: topic.to_string(),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        });
    }

    match ty {
        FieldType::Bytes | FieldType::Bytes32 => Ok(ParamValue::Hash(to_hex(&bytes))),
        FieldType::Address | FieldType::Uint256 => ty
            .to_dyn()
            .abi_decode(&bytes)
            .map(normalizer::normalize)
            .map_err(|e| DecodeError::AbiDecodeFailed {
                reason: format!("topic decode: {e}"),
            }),
    }
}

/// Decode the non-indexed parameters from the data payload.
///
/// An empty payload yields empty `bytes` for dynamic fields and `Null`
/// for everything else.
fn decode_data(
    raw: &[u8],
    fields: &[&FieldDef],
) -> Result<IndexMap<String, ParamValue>, DecodeError> {
    if fields.is_empty() {
        return Ok(IndexMap::new());
    }
    if raw.is_empty() {
        return Ok(fields
            .iter()
            .map(|f| {
                let value = match f.ty {
                    FieldType::Bytes => ParamValue::Bytes(Vec::new()),
                    _ => ParamValue::Null,
                };
                (f.name.clone(), value)
            })
            .collect());
    }

    let tuple = DynSolType::Tuple(fields.iter().map(|f| f.ty.to_dyn()).collect());
    let decoded = tuple
        .abi_decode_params(raw)
        .map_err(|e| DecodeError::AbiDecodeFailed {
            reason: e.to_string(),
        })?;

    let values = match decoded {
        DynSolValue::Tuple(vals) => vals,
        other => vec![other],
    };
    Ok(fields
        .iter()
        .zip(values)
        .map(|(f, v)| (f.name.clone(), normalizer::normalize(v)))
        .collect())
}
