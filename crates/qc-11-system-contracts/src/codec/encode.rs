//! # Return-Value Encoding
//!
//! Two-pass head/tail layout. Each value reserves one head word; dynamic
//! values put their offset in the head and append a length word plus the
//! zero-padded data to the tail.

use super::AbiValue;
use crate::domain::services::{left_pad_word, u64_word};
use crate::domain::value_objects::EVM_WORD_SIZE;

/// Encodes `values` into return data (`head || tail`).
///
/// An empty value list encodes to empty return data.
#[must_use]
pub fn encode_return_value(values: &[AbiValue]) -> Vec<u8> {
    let head_len = values.len() * EVM_WORD_SIZE;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for value in values {
        match value {
            AbiValue::UInt64(v) => head.extend_from_slice(&u64_word(*v)),
            AbiValue::Address(addr) => head.extend_from_slice(&left_pad_word(addr.as_bytes())),
            AbiValue::String(s) => {
                head.extend_from_slice(&u64_word((head_len + tail.len()) as u64));
                encode_bytes(s.as_bytes(), &mut tail);
            }
            AbiValue::Bytes(b) => {
                head.extend_from_slice(&u64_word((head_len + tail.len()) as u64));
                encode_bytes(b, &mut tail);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Appends `len || data || zero padding to the next word boundary`.
fn encode_bytes(data: &[u8], out: &mut Vec<u8>) {
    out.extend_from_slice(&u64_word(data.len() as u64));
    out.extend_from_slice(data);
    let padding = (EVM_WORD_SIZE - data.len() % EVM_WORD_SIZE) % EVM_WORD_SIZE;
    out.resize(out.len() + padding, 0);
}

// =============================================================================
// TESTS
// =============================================================================
