//! # Call-Data Codec
//!
//! Translates between the EVM word-oriented wire format and native values
//! for the four supported argument kinds.
//!
//! ## Wire Layout
//!
//! ```text
//! payload = head(32 * N) || tail
//!
//! uint64   head word = big-endian value
//! address  head word = 12 zero bytes || 20 address bytes
//! string   head word = offset of (length word || data, zero-padded to 32)
//! bytes    same as string
//! ```
//!
//! Decoding is bounds-checked against the payload: no slice is taken
//! without first checking it lies inside the input.

pub mod decode;
pub mod encode;

pub use decode::{extract_param, extract_params};
pub use encode::encode_return_value;

use crate::domain::value_objects::Address;
use crate::errors::CodecError;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ARGUMENT KINDS
// =============================================================================

/// The argument kinds the codec understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgKind {
    /// UTF-8 string, dynamic length.
    String,
    /// Raw byte sequence, dynamic length.
    Bytes,
    /// Unsigned 64-bit integer in one word.
    UInt64,
    /// 20-byte address, right-aligned in one word.
    Address,
}

impl ArgKind {
    /// Name of the kind as it appears in a canonical signature.
    #[must_use]
    pub const fn type_name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Bytes => "bytes",
            Self::UInt64 => "uint64",
            Self::Address => "address",
        }
    }

    /// Parses a canonical type name.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedType` for anything outside the four supported names.
    pub fn from_type_name(name: &str) -> Result<Self, CodecError> {
        match name.trim() {
            "string" => Ok(Self::String),
            "bytes" => Ok(Self::Bytes),
            "uint64" => Ok(Self::UInt64),
            "address" => Ok(Self::Address),
            other => Err(CodecError::UnsupportedType(other.to_string())),
        }
    }

    /// Whether values of this kind live in the tail region.
    #[must_use]
    pub const fn is_dynamic(self) -> bool {
        matches!(self, Self::String | Self::Bytes)
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

impl FromStr for ArgKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_type_name(s)
    }
}

// =============================================================================
// VALUES
// =============================================================================

/// A decoded argument or an encodable return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    /// `string`
    String(String),
    /// `bytes`
    Bytes(Vec<u8>),
    /// `uint64`
    UInt64(u64),
    /// `address`
    Address(Address),
}

impl AbiValue {
    /// The kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ArgKind {
        match self {
            Self::String(_) => ArgKind::String,
            Self::Bytes(_) => ArgKind::Bytes,
            Self::UInt64(_) => ArgKind::UInt64,
            Self::Address(_) => ArgKind::Address,
        }
    }
}

impl From<String> for AbiValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for AbiValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<Vec<u8>> for AbiValue {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<u64> for AbiValue {
    fn from(value: u64) -> Self {
        Self::UInt64(value)
    }
}

impl From<Address> for AbiValue {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

// =============================================================================
// TYPED ARGUMENT ACCESS
// =============================================================================

/// Decoded arguments handed to a handler, with typed positional accessors.
///
/// Reading an index as a kind it was not decoded as fails with
/// `CodecError::InvalidTarget`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<AbiValue>);

impl Args {
    /// Wraps decoded values.
    #[must_use]
    pub fn new(values: Vec<AbiValue>) -> Self {
        Self(values)
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the call carried no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All values in positional order.
    #[must_use]
    pub fn as_slice(&self) -> &[AbiValue] {
        &self.0
    }

    fn mismatch(&self, index: usize, expected: ArgKind) -> CodecError {
        let found = self
            .0
            .get(index)
            .map_or_else(|| "nothing".to_string(), |value| value.kind().to_string());
        CodecError::InvalidTarget {
            index,
            expected,
            found,
        }
    }

    /// Argument `index` as a string.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` if the argument is missing or not a string.
    pub fn string(&self, index: usize) -> Result<&str, CodecError> {
        match self.0.get(index) {
            Some(AbiValue::String(s)) => Ok(s),
            _ => Err(self.mismatch(index, ArgKind::String)),
        }
    }

    /// Argument `index` as raw bytes.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` if the argument is missing or not bytes.
    pub fn bytes(&self, index: usize) -> Result<&[u8], CodecError> {
        match self.0.get(index) {
            Some(AbiValue::Bytes(b)) => Ok(b),
            _ => Err(self.mismatch(index, ArgKind::Bytes)),
        }
    }

    /// Argument `index` as a u64.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` if the argument is missing or not a uint64.
    pub fn u64(&self, index: usize) -> Result<u64, CodecError> {
        match self.0.get(index) {
            Some(AbiValue::UInt64(v)) => Ok(*v),
            _ => Err(self.mismatch(index, ArgKind::UInt64)),
        }
    }

    /// Argument `index` as an address.
    ///
    /// # Errors
    ///
    /// `InvalidTarget` if the argument is missing or not an address.
    pub fn address(&self, index: usize) -> Result<Address, CodecError> {
        match self.0.get(index) {
            Some(AbiValue::Address(a)) => Ok(*a),
            _ => Err(self.mismatch(index, ArgKind::Address)),
        }
    }
}

impl From<Vec<AbiValue>> for Args {
    fn from(values: Vec<AbiValue>) -> Self {
        Self(values)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_round_trip() {
        for kind in [ArgKind::String, ArgKind::Bytes, ArgKind::UInt64, ArgKind::Address] {
            assert_eq!(ArgKind::from_type_name(kind.type_name()), Ok(kind));
        }
    }

    #[test]
    fn test_unsupported_type_name() {
        assert_eq!(
            "int256".parse::<ArgKind>(),
            Err(CodecError::UnsupportedType("int256".to_string()))
        );
        assert!(ArgKind::from_type_name("uint256").is_err());
        assert!(ArgKind::from_type_name("string[]").is_err());
    }

    #[test]
    fn test_dynamic_kinds() {
        assert!(ArgKind::String.is_dynamic());
        assert!(ArgKind::Bytes.is_dynamic());
        assert!(!ArgKind::UInt64.is_dynamic());
        assert!(!ArgKind::Address.is_dynamic());
    }

    #[test]
    fn test_args_typed_access() {
        let args = Args::new(vec!["alice".into(), 7u64.into(), vec![1u8, 2].into()]);
        assert_eq!(args.string(0).unwrap(), "alice");
        assert_eq!(args.u64(1).unwrap(), 7);
        assert_eq!(args.bytes(2).unwrap(), &[1, 2]);
    }

    #[test]
    fn test_args_wrong_kind_is_invalid_target() {
        let args = Args::new(vec![7u64.into()]);
        let err = args.string(0).unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidTarget {
                index: 0,
                expected: ArgKind::String,
                found: "uint64".to_string(),
            }
        );
    }

    #[test]
    fn test_args_missing_index_is_invalid_target() {
        let args = Args::default();
        assert!(matches!(
            args.address(0),
            Err(CodecError::InvalidTarget { index: 0, .. })
        ));
    }
}
