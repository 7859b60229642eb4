//! Deterministic replay order for decoded events.
//!
//! Events replay by `(block_number, log_index)` ascending. A `Mint` can only
//! resolve its full name once every ancestor `Mint` has been applied, so the
//! reducer must see events in exactly this order.

use crate::event::DecodedEvent;

/// The ordering key of an event.
pub fn sequence_key(event: &DecodedEvent) -> (u64, u32) {
    (event.block_number, event.log_index)
}

/// Sort events into replay order. Stable, so equal keys keep arrival order.
pub fn sequence(events: &mut [DecodedEvent]) {
    events.sort_by_key(sequence_key);
}

/// Consume an unordered batch and return it in replay order.
pub fn sequenced(mut events: Vec<DecodedEvent>) -> Vec<DecodedEvent> {
    sequence(&mut events);
    events
}
