//! The state reducer: folds ordered events into a [`Namespace`].
//!
//! Each event is applied in full before the next is looked at. Failures are
//! per-event: the event is logged and skipped, the fold continues.

use std::collections::HashMap;

use crate::entry::{push_record, Entry, Namespace, Record};
use crate::error::EventError;
use crate::event::{DecodedEvent, EventKind, ParamValue};
use crate::hash::{is_zero_address, Namehash};
use crate::interpret::{decode_utf8_safe, interpret};
use crate::serde_hex::to_hex;

/// Maximum parent hops walked while rebuilding a full name.
pub const MAX_NAME_DEPTH: usize = 100;

/// Appended to a partial path whose chain to the root is broken.
pub const UNRESOLVED_MARKER: &str = "<unknown_path>";

/// Label and parent of a minted hash, kept apart from the entry map so
/// names resolve even before an ancestor entry exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRecord {
    pub label: String,
    pub parent: Option<Namehash>,
}

/// Outcome of walking the name table from a hash to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameResolution {
    /// Labels joined root-first with `.`
    Resolved(String),
    /// The walk hit an unknown hash or the depth ceiling.
    /// `partial` holds the labels collected so far, root-first.
    Unresolved { partial: Vec<String> },
}

impl NameResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, NameResolution::Resolved(_))
    }

    /// The value stored in [`Entry::full_name`].
    pub fn full_name(&self) -> String {
        match self {
            NameResolution::Resolved(name) => name.clone(),
            NameResolution::Unresolved { partial } if partial.is_empty() => String::new(),
            NameResolution::Unresolved { partial } => {
                format!("{}.{UNRESOLVED_MARKER}", partial.join("."))
            }
        }
    }
}

/// Counters for one fold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReduceStats {
    pub applied: usize,
    pub skipped: usize,
    pub unresolved_names: usize,
}

/// Which annotation bucket a Note/Fact event writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    Notes,
    Facts,
}

/// Incrementally built namespace state.
#[derive(Debug, Clone)]
pub struct NamespaceState {
    entries: Namespace,
    names: HashMap<Namehash, NameRecord>,
    stats: ReduceStats,
}

impl Default for NamespaceState {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceState {
    /// A state holding only the root entry.
    pub fn new() -> Self {
        let mut entries = Namespace::new();
        entries.insert(Namehash::ROOT, Entry::root());
        let mut names = HashMap::new();
        names.insert(
            Namehash::ROOT,
            NameRecord {
                label: String::new(),
                parent: None,
            },
        );
        Self {
            entries,
            names,
            stats: ReduceStats::default(),
        }
    }

    /// Fold an already-sequenced event stream into a fresh state.
    pub fn fold<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a DecodedEvent>,
    {
        let mut state = Self::new();
        for event in events {
            state.apply(event);
        }
        state
    }

    pub fn entries(&self) -> &Namespace {
        &self.entries
    }

    pub fn into_entries(self) -> Namespace {
        self.entries
    }

    pub fn get(&self, hash: &Namehash) -> Option<&Entry> {
        self.entries.get(hash)
    }

    pub fn stats(&self) -> ReduceStats {
        self.stats
    }

    /// Apply one event. Returns `false` if the event was skipped.
    pub fn apply(&mut self, event: &DecodedEvent) -> bool {
        match self.try_apply(event) {
            Ok(()) => {
                self.stats.applied += 1;
                true
            }
            Err(err) => {
                tracing::warn!(
                    kind = %event.kind,
                    block = event.block_number,
                    tx = %event.transaction_hash,
                    log_index = event.log_index,
                    error = %err,
                    "Error processing event, skipping"
                );
                self.stats.skipped += 1;
                false
            }
        }
    }

    fn try_apply(&mut self, event: &DecodedEvent) -> Result<(), EventError> {
        match event.kind {
            EventKind::Mint => self.apply_mint(event),
            EventKind::Note => self.apply_annotation(event, Bucket::Notes),
            EventKind::Fact => self.apply_annotation(event, Bucket::Facts),
            EventKind::Transfer => self.apply_transfer(event),
            EventKind::Gene => self.apply_gene(event),
            EventKind::Zero | EventKind::Upgraded => Ok(()),
        }
    }

    fn get_or_create(&mut self, hash: Namehash, block: u64) -> &mut Entry {
        let names = &self.names;
        let entry = self.entries.entry(hash).or_insert_with(|| {
            let mut entry = Entry::new(hash, block);
            if let Some(record) = names.get(&hash) {
                entry.label = record.label.clone();
                entry.parent_hash = record.parent;
            }
            entry
        });
        entry.touch(block);
        entry
    }

    /// Walk the name table from `hash` towards the root.
    pub fn resolve_name(&self, hash: &Namehash) -> NameResolution {
        let mut labels = Vec::new();
        let mut current = Some(*hash);
        let mut depth = 0usize;

        while let Some(h) = current.filter(|h| !h.is_root()) {
            if depth >= MAX_NAME_DEPTH {
                break;
            }
            match self.names.get(&h) {
                Some(record) => {
                    if !record.label.is_empty() {
                        labels.push(record.label.clone());
                    }
                    current = record.parent;
                }
                None => {
                    labels.reverse();
                    return NameResolution::Unresolved { partial: labels };
                }
            }
            depth += 1;
        }

        labels.reverse();
        if depth >= MAX_NAME_DEPTH {
            NameResolution::Unresolved { partial: labels }
        } else {
            NameResolution::Resolved(labels.join("."))
        }
    }

    fn apply_mint(&mut self, event: &DecodedEvent) -> Result<(), EventError> {
        let parent = event.hash_param("parenthash")?;
        let child = event.hash_param("childhash")?;
        let label = decode_utf8_safe(event.bytes_param("label")?);
        let block = event.block_number;

        self.names.insert(
            child,
            NameRecord {
                label: label.clone(),
                parent: Some(parent),
            },
        );

        let resolution = self.resolve_name(&child);
        if !resolution.is_resolved() {
            self.stats.unresolved_names += 1;
            tracing::warn!(
                child = %child,
                block,
                "Name reconstruction failed or too deep"
            );
        }

        let entry = self.get_or_create(child, block);
        entry.label = label;
        entry.parent_hash = Some(parent);
        entry.full_name = resolution.full_name();

        match self.entries.get_mut(&parent) {
            Some(parent_entry) => {
                parent_entry.children.insert(child);
                parent_entry.touch(block);
            }
            None => {
                tracing::warn!(
                    parent = %parent,
                    child = %child,
                    block,
                    "Parent entry not found for minted child"
                );
            }
        }
        Ok(())
    }

    fn apply_annotation(&mut self, event: &DecodedEvent, bucket: Bucket) -> Result<(), EventError> {
        let hash_field = match bucket {
            Bucket::Notes => "notehash",
            Bucket::Facts => "facthash",
        };
        let parent = event.hash_param("parenthash")?;
        let label = decode_utf8_safe(event.bytes_param("label")?);
        let data = event.bytes_param("data")?;
        let event_hash = match event.param(hash_field) {
            Some(ParamValue::Hash(h)) => Namehash::from_hex(h).ok(),
            _ => None,
        };

        let record = Record {
            data: interpret(&label, data),
            raw_data: to_hex(data),
            block_number: event.block_number,
            tx_hash: event.transaction_hash.clone(),
            log_index: event.log_index,
            event_hash,
        };

        let entry = self.get_or_create(parent, event.block_number);
        let buckets = match bucket {
            Bucket::Notes => &mut entry.notes,
            Bucket::Facts => &mut entry.facts,
        };
        push_record(buckets, label, record);
        Ok(())
    }

    fn apply_transfer(&mut self, event: &DecodedEvent) -> Result<(), EventError> {
        let from = event.optional_address_param("from")?;
        let to = event.optional_address_param("to")?.map(str::to_string);
        let namehash = Namehash::from_token_id(event.uint_param("id")?)?;
        let block = event.block_number;

        let entry = self.get_or_create(namehash, block);
        entry.owner = to;
        if from.is_some_and(is_zero_address) {
            entry.creation_block = entry.creation_block.min(block);
        }
        Ok(())
    }

    fn apply_gene(&mut self, event: &DecodedEvent) -> Result<(), EventError> {
        let hash = event.hash_param("entry")?;
        let gene = event.optional_address_param("gene")?.map(str::to_string);
        let entry = self.get_or_create(hash, event.block_number);
        entry.gene = gene;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::ZERO_ADDRESS;
    use crate::interpret::NoteValue;
    use indexmap::IndexMap;

    fn h(n: u8) -> Namehash {
        let mut bytes = [0u8; 32];
        bytes[0] = n;
        Namehash::new(bytes)
    }

    fn event(kind: EventKind, block: u64, log: u32, params: Vec<(&str, ParamValue)>) -> DecodedEvent {
        DecodedEvent {
            kind,
            block_number: block,
            transaction_hash: format!("0x{block:04x}{log:04x}"),
            log_index: log,
            params: params
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect::<IndexMap<_, _>>(),
        }
    }

    fn mint(parent: Namehash, child: Namehash, label: &str, block: u64, log: u32) -> DecodedEvent {
        event(
            EventKind::Mint,
            block,
            log,
            vec![
                ("parenthash", ParamValue::Hash(parent.to_string())),
                ("childhash", ParamValue::Hash(child.to_string())),
                ("labelhash", ParamValue::Hash(Namehash::ROOT.to_string())),
                ("label", ParamValue::Bytes(label.as_bytes().to_vec())),
            ],
        )
    }

    fn note(parent: Namehash, label: &str, data: &[u8], block: u64, log: u32) -> DecodedEvent {
        event(
            EventKind::Note,
            block,
            log,
            vec![
                ("parenthash", ParamValue::Hash(parent.to_string())),
                ("notehash", ParamValue::Hash(h(0xee).to_string())),
                ("labelhash", ParamValue::Hash(Namehash::ROOT.to_string())),
                ("label", ParamValue::Bytes(label.as_bytes().to_vec())),
                ("data", ParamValue::Bytes(data.to_vec())),
            ],
        )
    }

    fn transfer(from: &str, to: &str, id: &str, block: u64, log: u32) -> DecodedEvent {
        event(
            EventKind::Transfer,
            block,
            log,
            vec![
                ("from", ParamValue::Address(from.into())),
                ("to", ParamValue::Address(to.into())),
                ("id", ParamValue::Uint(id.into())),
            ],
        )
    }

    const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
    const BOB: &str = "0x0000000000000000000000000000000000000b0b";

    #[test]
    fn starts_with_root_only() {
        let state = NamespaceState::new();
        assert_eq!(state.entries().len(), 1);
        let root = state.get(&Namehash::ROOT).unwrap();
        assert!(root.label.is_empty());
        assert!(root.parent_hash.is_none());
        assert!(root.full_name.is_empty());
    }

    #[test]
    fn nested_mint_resolves_dotted_name() {
        let (a, b) = (h(1), h(2));
        let state = NamespaceState::fold(&[
            mint(Namehash::ROOT, a, "a", 10, 0),
            mint(a, b, "b", 11, 0),
        ]);
        assert_eq!(state.get(&a).unwrap().full_name, "a");
        assert_eq!(state.get(&b).unwrap().full_name, "a.b");
        assert!(state.get(&Namehash::ROOT).unwrap().children.contains(&a));
        assert!(state.get(&a).unwrap().children.contains(&b));
        assert_eq!(state.get(&a).unwrap().last_update_block, 11);
    }

    #[test]
    fn mint_with_unknown_parent_is_unresolved_but_kept() {
        let (orphan_parent, child) = (h(7), h(8));
        let state = NamespaceState::fold(&[mint(orphan_parent, child, "x", 5, 0)]);
        let entry = state.get(&child).unwrap();
        assert_eq!(entry.full_name, format!("x.{UNRESOLVED_MARKER}"));
        assert_eq!(entry.parent_hash, Some(orphan_parent));
        assert!(state.get(&orphan_parent).is_none());
        assert_eq!(state.stats().unresolved_names, 1);
    }

    #[test]
    fn parent_cycle_terminates_and_is_unresolved() {
        let (a, b) = (h(1), h(2));
        let state = NamespaceState::fold(&[mint(b, a, "a", 1, 0), mint(a, b, "b", 2, 0)]);
        let res = state.resolve_name(&b);
        assert!(!res.is_resolved());
        assert!(state.get(&b).unwrap().full_name.contains(UNRESOLVED_MARKER));
        assert!(state.get(&a).unwrap().full_name.contains(UNRESOLVED_MARKER));
    }

    #[test]
    fn depth_ceiling_applies_to_long_chains() {
        let mut events = Vec::new();
        let mut parent = Namehash::ROOT;
        for i in 0..=MAX_NAME_DEPTH {
            let mut bytes = [0u8; 32];
            bytes[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
            let child = Namehash::new(bytes);
            events.push(mint(parent, child, "n", i as u64, 0));
            parent = child;
        }
        let state = NamespaceState::fold(&events);
        assert!(!state.resolve_name(&parent).is_resolved());
    }

    #[test]
    fn empty_label_ancestors_contribute_nothing() {
        let mut state = NamespaceState::new();
        state.names.insert(
            h(1),
            NameRecord {
                label: String::new(),
                parent: Some(Namehash::ROOT),
            },
        );
        state.apply(&mint(h(1), h(2), "leaf", 3, 0));
        assert_eq!(state.get(&h(2)).unwrap().full_name, "leaf");
    }

    #[test]
    fn replayed_mint_does_not_duplicate_children() {
        let a = h(1);
        let m = mint(Namehash::ROOT, a, "a", 10, 0);
        let state = NamespaceState::fold(&[m.clone(), m]);
        assert_eq!(state.get(&Namehash::ROOT).unwrap().children.len(), 1);
    }

    #[test]
    fn notes_interpret_and_sort_newest_first() {
        let a = h(1);
        let state = NamespaceState::fold(&[
            mint(Namehash::ROOT, a, "alice", 10, 0),
            note(a, "~ip", &[1, 2, 3, 4], 11, 0),
            note(a, "~ip", &[5, 6, 7, 8], 13, 2),
            note(a, "~ip", &[9, 9, 9, 9], 12, 4),
        ]);
        let entry = state.get(&a).unwrap();
        let values: Vec<_> = entry.notes["~ip"]
            .iter()
            .map(|r| r.data.clone().unwrap())
            .collect();
        assert_eq!(
            values,
            vec![
                NoteValue::Text("5.6.7.8".into()),
                NoteValue::Text("9.9.9.9".into()),
                NoteValue::Text("1.2.3.4".into()),
            ]
        );
        assert_eq!(entry.latest_note("~ip").unwrap().raw_data, "0x05060708");
        assert_eq!(entry.latest_note("~ip").unwrap().event_hash, Some(h(0xee)));
        assert_eq!(entry.last_update_block, 13);
    }

    #[test]
    fn facts_use_their_own_bucket() {
        let a = h(1);
        let fact = event(
            EventKind::Fact,
            20,
            1,
            vec![
                ("parenthash", ParamValue::Hash(a.to_string())),
                ("facthash", ParamValue::Hash(h(0xfa).to_string())),
                ("labelhash", ParamValue::Hash(Namehash::ROOT.to_string())),
                ("label", ParamValue::Bytes(b"~tcp-port".to_vec())),
                ("data", ParamValue::Bytes(vec![0x1f, 0x90])),
            ],
        );
        let state = NamespaceState::fold(&[mint(Namehash::ROOT, a, "alice", 10, 0), fact]);
        let entry = state.get(&a).unwrap();
        assert!(entry.notes.is_empty());
        assert_eq!(
            entry.latest_fact("~tcp-port").unwrap().data,
            Some(NoteValue::Uint(8080))
        );
    }

    #[test]
    fn note_on_unknown_parent_creates_entry() {
        let ghost = h(9);
        let state = NamespaceState::fold(&[note(ghost, "~x", b"y", 4, 0)]);
        let entry = state.get(&ghost).unwrap();
        assert_eq!(entry.creation_block, 4);
        assert!(entry.full_name.is_empty());
    }

    #[test]
    fn transfer_from_zero_sets_creation_and_owner() {
        let a = h(1);
        let id = alloy_primitives::U256::from_be_bytes(*a.as_bytes()).to_string();
        let state = NamespaceState::fold(&[
            transfer(ZERO_ADDRESS, ALICE, &id, 15, 0),
            transfer(ALICE, BOB, &id, 30, 0),
        ]);
        let entry = state.get(&a).unwrap();
        assert_eq!(entry.owner.as_deref(), Some(BOB));
        assert_eq!(entry.creation_block, 15);
        assert_eq!(entry.last_update_block, 30);
    }

    #[test]
    fn later_transfer_never_regresses_creation_block() {
        let a = h(1);
        let id = alloy_primitives::U256::from_be_bytes(*a.as_bytes()).to_string();
        let mut state = NamespaceState::fold(&[mint(Namehash::ROOT, a, "a", 10, 0)]);
        state.apply(&transfer(ZERO_ADDRESS, ALICE, &id, 10, 1));
        state.apply(&transfer(ALICE, BOB, &id, 50, 0));
        assert_eq!(state.get(&a).unwrap().creation_block, 10);
    }

    #[test]
    fn malformed_token_id_is_skipped() {
        let mut state = NamespaceState::new();
        assert!(!state.apply(&transfer(ZERO_ADDRESS, ALICE, "not-a-number", 1, 0)));
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.stats().skipped, 1);
        assert_eq!(state.stats().applied, 0);
    }

    #[test]
    fn gene_sets_pointer() {
        let a = h(1);
        let gene = event(
            EventKind::Gene,
            8,
            0,
            vec![
                ("entry", ParamValue::Hash(a.to_string())),
                ("gene", ParamValue::Address(BOB.into())),
            ],
        );
        let state = NamespaceState::fold(&[gene]);
        assert_eq!(state.get(&a).unwrap().gene.as_deref(), Some(BOB));
    }

    #[test]
    fn gene_without_topic_clears_pointer_and_keeps_entry() {
        let a = h(1);
        let set = event(
            EventKind::Gene,
            8,
            0,
            vec![
                ("entry", ParamValue::Hash(a.to_string())),
                ("gene", ParamValue::Address(BOB.into())),
            ],
        );
        let cleared = event(
            EventKind::Gene,
            9,
            0,
            vec![
                ("entry", ParamValue::Hash(a.to_string())),
                ("gene", ParamValue::Null),
            ],
        );
        let state = NamespaceState::fold(&[set, cleared]);
        let entry = state.get(&a).unwrap();
        assert_eq!(entry.gene, None);
        assert_eq!(entry.last_update_block, 9);
        assert_eq!(state.stats().skipped, 0);
    }

    #[test]
    fn transfer_with_null_addresses_still_applies() {
        let a = h(1);
        let id = alloy_primitives::U256::from_be_bytes(*a.as_bytes()).to_string();
        let partial = event(
            EventKind::Transfer,
            12,
            0,
            vec![
                ("from", ParamValue::Null),
                ("to", ParamValue::Null),
                ("id", ParamValue::Uint(id)),
            ],
        );
        let mut state = NamespaceState::fold(&[mint(Namehash::ROOT, a, "a", 10, 0)]);
        assert!(state.apply(&partial));
        let entry = state.get(&a).unwrap();
        assert_eq!(entry.owner, None);
        assert_eq!(entry.creation_block, 10);
        assert_eq!(entry.last_update_block, 12);
    }

    #[test]
    fn zero_and_upgraded_are_inert() {
        let zero = event(
            EventKind::Zero,
            1,
            0,
            vec![("zeroTba", ParamValue::Address(ALICE.into()))],
        );
        let upgraded = event(
            EventKind::Upgraded,
            2,
            0,
            vec![("implementation", ParamValue::Address(BOB.into()))],
        );
        let state = NamespaceState::fold(&[zero, upgraded]);
        assert_eq!(state.entries().len(), 1);
        assert_eq!(state.stats().applied, 2);
    }

    #[test]
    fn failing_event_does_not_stop_the_fold() {
        let a = h(1);
        let broken = event(EventKind::Mint, 9, 0, vec![]);
        let state = NamespaceState::fold(&[broken, mint(Namehash::ROOT, a, "a", 10, 0)]);
        assert_eq!(state.get(&a).unwrap().full_name, "a");
        assert_eq!(state.stats().skipped, 1);
    }

    #[test]
    fn replay_is_deterministic() {
        let (a, b) = (h(1), h(2));
        let events = vec![
            mint(Namehash::ROOT, a, "a", 10, 0),
            mint(a, b, "b", 10, 1),
            note(b, "~ip", &[1, 2, 3, 4], 11, 0),
            note(b, "~ip", &[4, 3, 2, 1], 11, 1),
        ];
        let first = NamespaceState::fold(&events).into_entries();
        let second = NamespaceState::fold(&events).into_entries();
        assert_eq!(first, second);
    }
}
