//! Post-filter: the caller-visible projection of the reduced state.

use crate::entry::{Entry, Namespace};
use crate::reducer::UNRESOLVED_MARKER;

/// `true` if the entry's full name was reconstructed all the way to the root.
pub fn is_resolved(entry: &Entry) -> bool {
    !entry.full_name.is_empty() && !entry.full_name.contains(UNRESOLVED_MARKER)
}

/// Copy out the root plus every entry with a resolved full name.
pub fn filter_resolved(namespace: &Namespace) -> Namespace {
    namespace
        .iter()
        .filter(|(hash, entry)| hash.is_root() || is_resolved(entry))
        .map(|(hash, entry)| (*hash, entry.clone()))
        .collect()
}
