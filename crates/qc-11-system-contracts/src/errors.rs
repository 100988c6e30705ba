//! # Error Types
//!
//! All error types for system-contract decoding, dispatch and storage.

use crate::codec::ArgKind;
use crate::domain::value_objects::{Address, Selector};
use thiserror::Error;

// =============================================================================
// CODEC ERRORS
// =============================================================================

/// Errors from decoding call data or encoding return data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// ABI type name outside {string, bytes, uint64, address}.
    #[error("unsupported arg type: {0}")]
    UnsupportedType(String),

    /// A decoded argument was read back as the wrong kind, or does not exist.
    #[error("invalid target for argument {index}: expected {expected}, found {found}")]
    InvalidTarget {
        index: usize,
        expected: ArgKind,
        found: String,
    },

    /// String argument is not valid UTF-8.
    #[error("argument {index} is not valid utf-8")]
    InvalidUtf8 { index: usize },

    /// A word, length prefix or data slice reaches past the end of the payload.
    #[error("out of bounds: {len} bytes at offset {offset}, payload is {available} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },
}

// =============================================================================
// REPOSITORY ERRORS
// =============================================================================

/// Errors surfaced by a key-value repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// I/O error during read/write.
    #[error("repository I/O error: {message}")]
    Io { message: String },

    /// Data corruption in the store.
    #[error("repository corruption: {message}")]
    Corruption { message: String },
}

// =============================================================================
// BUFFER ERRORS
// =============================================================================

/// Errors from the chunked system buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    /// Requested range reaches past the current length, or no length is recorded.
    #[error("invalid read position: offset {offset}, size {size}, length {length}")]
    InvalidReadPosition { offset: u64, size: u64, length: u64 },

    /// A chunk inside the recorded length is absent from the repository.
    #[error("missing buffer chunk {index}")]
    MissingChunk { index: u64 },

    /// A stored chunk does not have the fixed chunk width.
    #[error("corrupt buffer chunk {index}: {len} bytes")]
    CorruptChunk { index: u64, len: usize },

    /// Underlying repository failure, passed through unchanged.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// =============================================================================
// COLLABORATOR ERRORS
// =============================================================================

/// Errors from the object-storage client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectStoreError {
    /// The bucket URL could not be used.
    #[error("invalid bucket url: {0}")]
    InvalidUrl(String),

    /// The remote service answered with an error response.
    #[error("response error, code: {code}, message: {message}, resource: {resource}, request id: {request_id}")]
    Response {
        code: String,
        message: String,
        resource: String,
        request_id: String,
    },

    /// The object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// Transport failure.
    #[error("object store I/O error: {0}")]
    Io(String),
}

/// Errors from the cross-chain bridge.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BridgeError {
    /// Chain flag does not name a known target chain.
    #[error("unknown chain: {0}")]
    UnknownChain(String),

    /// The submitted transaction does not match the claimed arguments.
    #[error("tx args not matched: {0}")]
    ArgsMismatch(String),

    /// Transaction could not be decoded.
    #[error("transaction decode failed: {0}")]
    Decode(String),

    /// Remote chain could not be reached.
    #[error("bridge rpc error: {0}")]
    Rpc(String),
}

// =============================================================================
// CONTRACT ERRORS
// =============================================================================

/// Business error reported by a system-contract handler.
///
/// A handler returning one of these suppresses all return data.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Buffer engine failure.
    #[error(transparent)]
    Buffer(#[from] BufferError),

    /// Object storage failure.
    #[error(transparent)]
    ObjectStore(#[from] ObjectStoreError),

    /// Bridge failure.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Handler read its arguments with the wrong kinds.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Argument value was well-formed on the wire but unusable.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

// =============================================================================
// DISPATCH ERRORS
// =============================================================================

/// Errors from routing one call through a system contract.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Call data is shorter than a selector.
    #[error("call data too short for a selector: {len} bytes")]
    MissingSelector { len: usize },

    /// No handler is registered for the selector.
    #[error("routes not found: {0}")]
    RouteNotFound(Selector),

    /// Argument decoding failed; the handler was not invoked.
    #[error("decode error: {0}")]
    Decode(#[source] CodecError),

    /// Handler reported a business error.
    #[error(transparent)]
    Handler(#[from] ContractError),

    /// Handler outputs disagree with the declared output kinds.
    #[error("return kinds mismatch for {selector}: declared {expected:?}, produced {found:?}")]
    ReturnKindMismatch {
        selector: Selector,
        expected: Vec<ArgKind>,
        found: Vec<ArgKind>,
    },

    /// Address is not a registered system contract.
    #[error("not a system contract: {0:?}")]
    UnknownContract(Address),
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

/// Errors from loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File could not be read.
    #[error("failed to read config {path}: {error}")]
    Io { path: String, error: String },

    /// TOML could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Address string is not 20 bytes of hex.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Two contracts share one address.
    #[error("address assigned to more than one system contract: {0:?}")]
    DuplicateAddress(Address),

    /// Stream copy size of zero would never make progress.
    #[error("object storage copy_chunk_size must be non-zero")]
    ZeroCopySize,
}

// =============================================================================
// TESTS
// =============================================================================
