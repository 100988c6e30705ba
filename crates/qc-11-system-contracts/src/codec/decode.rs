//! # Argument Decoding
//!
//! Positional argument extraction from the payload that follows a selector.
//!
//! For argument `i` the head word is `payload[i*32 .. (i+1)*32]`. Dynamic
//! kinds treat the head word as an offset from the start of the payload to a
//! length word followed by the data.
//!
//! ## Address Fallback
//!
//! When a dynamic kind's head word is not smaller than the payload length it
//! cannot be an offset. The word is then read as an inline right-aligned
//! address and the value becomes its `0x`-prefixed lowercase hex text. This
//! keeps calls that pass an address where a string is declared working; it
//! is a compatibility shim, not a general rule.

use super::{AbiValue, ArgKind};
use crate::domain::value_objects::{Address, ADDRESS_OFFSET, EVM_WORD_SIZE, U256};
use crate::errors::CodecError;

/// Decodes one value per kind, in order.
///
/// # Errors
///
/// Returns the first `CodecError` hit; no partial result is produced.
pub fn extract_params(payload: &[u8], kinds: &[ArgKind]) -> Result<Vec<AbiValue>, CodecError> {
    kinds
        .iter()
        .enumerate()
        .map(|(index, &kind)| extract_param(payload, index, kind))
        .collect()
}

/// Decodes the argument at position `index` as `kind`.
///
/// # Errors
///
/// `OutOfBounds` when any word or data slice lies outside `payload`;
/// `InvalidUtf8` when a string argument is not UTF-8.
pub fn extract_param(payload: &[u8], index: usize, kind: ArgKind) -> Result<AbiValue, CodecError> {
    let word = head_word(payload, index)?;
    match kind {
        ArgKind::UInt64 => Ok(AbiValue::UInt64(word_to_u64(word))),
        ArgKind::Address => Ok(AbiValue::Address(word_to_address(word))),
        ArgKind::Bytes => dynamic_data(payload, word).map(AbiValue::Bytes),
        ArgKind::String => {
            let data = dynamic_data(payload, word)?;
            String::from_utf8(data)
                .map(AbiValue::String)
                .map_err(|_| CodecError::InvalidUtf8 { index })
        }
    }
}

/// Bounds-checked `payload[offset .. offset + len]`.
fn slice(payload: &[u8], offset: usize, len: usize) -> Result<&[u8], CodecError> {
    offset
        .checked_add(len)
        .and_then(|end| payload.get(offset..end))
        .ok_or(CodecError::OutOfBounds {
            offset,
            len,
            available: payload.len(),
        })
}

fn head_word(payload: &[u8], index: usize) -> Result<&[u8], CodecError> {
    let offset = index.checked_mul(EVM_WORD_SIZE).unwrap_or(usize::MAX);
    slice(payload, offset, EVM_WORD_SIZE)
}

/// Low 8 bytes of the word. Non-zero high bytes are ignored (truncation).
fn word_to_u64(word: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[EVM_WORD_SIZE - 8..]);
    u64::from_be_bytes(bytes)
}

fn word_to_address(word: &[u8]) -> Address {
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&word[ADDRESS_OFFSET..]);
    Address::new(bytes)
}

/// Clamps a 256-bit word to `usize`, saturating at `usize::MAX`.
fn word_to_usize(value: U256) -> usize {
    if value > U256::from(usize::MAX) {
        usize::MAX
    } else {
        value.as_usize()
    }
}

fn dynamic_data(payload: &[u8], head: &[u8]) -> Result<Vec<u8>, CodecError> {
    let offset = U256::from_big_endian(head);
    if offset >= U256::from(payload.len()) {
        return Ok(word_to_address(head).to_hex().into_bytes());
    }
    // offset < payload.len(), so it fits in usize
    let offset = offset.as_usize();
    let length = U256::from_big_endian(slice(payload, offset, EVM_WORD_SIZE)?);
    let start = offset + EVM_WORD_SIZE;
    slice(payload, start, word_to_usize(length)).map(<[u8]>::to_vec)
}

// =============================================================================
// TESTS
// =============================================================================
