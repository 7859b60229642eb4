//! Byte interpreters for note and fact payloads.
//!
//! All functions here are total: malformed input yields a pass-through or
//! `None`, never an error.

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

use crate::serde_hex::to_hex;

/// Largest integer a JSON consumer can hold without losing precision (2^53 - 1).
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Label whose payload is a packed IPv4/IPv6 address.
pub const IP_LABEL: &str = "~ip";
/// Label suffix whose 2-byte payload is a big-endian port number.
pub const PORT_SUFFIX: &str = "-port";
/// Labels carrying opaque binary that must never be text-decoded.
pub const OPAQUE_LABELS: [&str; 2] = ["~net-key", "~routers"];

/// An interpreted note/fact value.
///
/// Serialised untagged, so JSON shows a bare number or string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NoteValue {
    /// Unsigned integer within [`MAX_SAFE_INTEGER`]
    Uint(u64),
    /// Decoded text (including rendered IP addresses)
    Text(String),
    /// Unsigned integer beyond [`MAX_SAFE_INTEGER`], in decimal
    BigUint(String),
}

/// Decode bytes as UTF-8, or return their `0x` hex rendering when the
/// payload is empty or not valid UTF-8.
pub fn decode_utf8_safe(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return to_hex(bytes);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => to_hex(bytes),
    }
}

/// Render a 4-byte (IPv4) or 16-byte (IPv6) payload. Any other length is `None`.
///
/// IPv6 compresses the leftmost longest run of two or more zero groups to `::`.
pub fn decode_ip(bytes: &[u8]) -> Option<String> {
    match bytes.len() {
        4 => Some(Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]).to_string()),
        16 => Some(format_ipv6(bytes)),
        _ => None,
    }
}

fn format_ipv6(bytes: &[u8]) -> String {
    let groups: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();

    // Longest zero run; strict `>` keeps the leftmost on ties.
    let (mut best_start, mut best_len) = (0usize, 0usize);
    let (mut run_start, mut run_len) = (0usize, 0usize);
    for (i, g) in groups.iter().enumerate() {
        if *g == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
            if run_len > best_len {
                best_start = run_start;
                best_len = run_len;
            }
        } else {
            run_len = 0;
        }
    }

    let render = |gs: &[u16]| {
        gs.iter()
            .map(|g| format!("{g:x}"))
            .collect::<Vec<_>>()
            .join(":")
    };

    if best_len > 1 {
        let head = render(&groups[..best_start]);
        let tail = render(&groups[best_start + best_len..]);
        format!("{head}::{tail}")
    } else {
        render(&groups)
    }
}

/// Parse a big-endian unsigned integer of up to 32 bytes.
pub fn decode_uint(bytes: &[u8]) -> Option<NoteValue> {
    if bytes.is_empty() {
        return None;
    }
    let value = U256::try_from_be_slice(bytes)?;
    match u64::try_from(value) {
        Ok(v) if v <= MAX_SAFE_INTEGER => Some(NoteValue::Uint(v)),
        _ => Some(NoteValue::BigUint(value.to_string())),
    }
}

/// Interpret a note/fact payload according to its label.
pub fn interpret(label: &str, data: &[u8]) -> Option<NoteValue> {
    if data.is_empty() {
        return None;
    }
    if OPAQUE_LABELS.contains(&label) {
        return None;
    }

    let typed = if label == IP_LABEL {
        decode_ip(data).map(NoteValue::Text)
    } else if label.ends_with(PORT_SUFFIX) && data.len() == 2 {
        decode_uint(data)
    } else {
        None
    };
    if typed.is_some() {
        return typed;
    }

    let text = decode_utf8_safe(data);
    if text != to_hex(data) {
        Some(NoteValue::Text(text))
    } else {
        None
    }
}
