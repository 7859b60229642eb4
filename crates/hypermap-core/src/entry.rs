//! The namespace node and its timestamped annotations.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hash::Namehash;
use crate::interpret::NoteValue;

/// The reducer's output: every entry keyed by namehash, in hash order.
pub type Namespace = BTreeMap<Namehash, Entry>;

/// Label → history of records, newest first.
pub type RecordBuckets = IndexMap<String, Vec<Record>>;

/// One note or fact emission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Interpreted payload, `None` for opaque or non-text data
    pub data: Option<NoteValue>,
    /// The payload as emitted, `0x` hex
    pub raw_data: String,
    pub block_number: u64,
    pub tx_hash: String,
    pub log_index: u32,
    /// The note/fact hash from the event, when its topic was present
    pub event_hash: Option<Namehash>,
}

impl Record {
    /// Sort key; buckets are kept in descending order of this.
    pub fn position(&self) -> (u64, u32) {
        (self.block_number, self.log_index)
    }
}

/// A node of the namespace tree.
///
/// Parent and children are namehashes into the owning [`Namespace`], never
/// references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub namehash: Namehash,
    pub label: String,
    pub parent_hash: Option<Namehash>,
    pub full_name: String,
    pub owner: Option<String>,
    pub gene: Option<String>,
    pub notes: RecordBuckets,
    pub facts: RecordBuckets,
    pub children: IndexSet<Namehash>,
    pub creation_block: u64,
    pub last_update_block: u64,
}

impl Entry {
    /// A fresh entry first seen at `block`.
    pub fn new(namehash: Namehash, block: u64) -> Self {
        Self {
            namehash,
            label: String::new(),
            parent_hash: None,
            full_name: String::new(),
            owner: None,
            gene: None,
            notes: IndexMap::new(),
            facts: IndexMap::new(),
            children: IndexSet::new(),
            creation_block: block,
            last_update_block: block,
        }
    }

    /// The reserved root entry.
    pub fn root() -> Self {
        Self::new(Namehash::ROOT, 0)
    }

    /// Bump `last_update_block` monotonically.
    pub fn touch(&mut self, block: u64) {
        self.last_update_block = self.last_update_block.max(block);
    }

    /// The most recent record under `label` in the notes bucket.
    pub fn latest_note(&self, label: &str) -> Option<&Record> {
        self.notes.get(label).and_then(|records| records.first())
    }

    /// The most recent record under `label` in the facts bucket.
    pub fn latest_fact(&self, label: &str) -> Option<&Record> {
        self.facts.get(label).and_then(|records| records.first())
    }
}

/// Append `record` under `label` and restore newest-first order.
pub(crate) fn push_record(buckets: &mut RecordBuckets, label: String, record: Record) {
    let bucket = buckets.entry(label).or_default();
    bucket.push(record);
    bucket.sort_by(|a, b| b.position().cmp(&a.position()));
}
