//! # Domain Services
//!
//! Pure functions shared by the codec, router and buffer engine.
//! Deterministic, no I/O.

use crate::domain::value_objects::{Hash, Selector, EVM_WORD_SIZE, SELECTOR_LEN, U256};
use sha3::{Digest, Keccak256};

// =============================================================================
// HASHING
// =============================================================================

/// Computes the Keccak-256 hash of the given data.
#[must_use]
pub fn keccak256(data: &[u8]) -> Hash {
    let digest = Keccak256::digest(data);
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    Hash::new(bytes)
}

/// Computes the selector of a canonical signature such as `"Read(uint64,uint64)"`.
#[must_use]
pub fn compute_selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    let mut bytes = [0u8; SELECTOR_LEN];
    bytes.copy_from_slice(&hash.as_bytes()[..SELECTOR_LEN]);
    Selector::new(bytes)
}

// =============================================================================
// WORD HELPERS
// =============================================================================

/// Left-pads `bytes` with zeros into one 32-byte word.
///
/// Inputs longer than a word keep their low-order (rightmost) 32 bytes.
#[must_use]
pub fn left_pad_word(bytes: &[u8]) -> [u8; EVM_WORD_SIZE] {
    let mut word = [0u8; EVM_WORD_SIZE];
    let take = bytes.len().min(EVM_WORD_SIZE);
    word[EVM_WORD_SIZE - take..].copy_from_slice(&bytes[bytes.len() - take..]);
    word
}

/// Big-endian 32-byte word holding `value`.
#[must_use]
pub fn u64_word(value: u64) -> [u8; EVM_WORD_SIZE] {
    left_pad_word(&value.to_be_bytes())
}

/// Big-endian 32-byte word holding a 256-bit integer.
#[must_use]
pub fn u256_word(value: U256) -> [u8; EVM_WORD_SIZE] {
    let mut word = [0u8; EVM_WORD_SIZE];
    value.to_big_endian(&mut word);
    word
}

/// Derives the storage key `base + index`, as a 32-byte big-endian word.
///
/// Addition wraps modulo 2^256, so a base hash near the top of the range
/// still yields distinct keys for consecutive indices.
#[must_use]
pub fn offset_key(base: &Hash, index: u64) -> [u8; EVM_WORD_SIZE] {
    let (sum, _) = base.to_u256().overflowing_add(U256::from(index));
    u256_word(sum)
}

// =============================================================================
// TESTS
// =============================================================================
