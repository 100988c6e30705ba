//! # QC-11 System Contracts - Native Contracts at Reserved Addresses
//!
//! **Subsystem ID:** 11
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Lets the EVM interpreter route calls aimed at a few reserved addresses
//! to native handlers instead of bytecode. Call data uses the Solidity ABI
//! subset {`string`, `bytes`, `uint64`, `address`}; methods are selected by
//! the first four bytes of `keccak256("name(type1,type2)")`.
//!
//! ## Built-in Contracts
//!
//! | Address | Contract | Methods |
//! |---------|----------|---------|
//! | `0x...011111` | System buffer | `Read`, `Write`, `Length`, `Close` |
//! | `0x...011110` | Object storage | `GetObject`, `PutObject` |
//! | `0x...011101` | Cross-chain bridge | `ForwardFunds`, `GetTxState`, `ReceiveFunds` |
//!
//! ## Components
//!
//! | Component | Location | Purpose |
//! |-----------|----------|---------|
//! | Codec | `codec/` | Head/tail ABI decode and encode |
//! | Router | `router.rs` | Selector -> handler table, dispatch pipeline |
//! | Buffer | `buffer/` | 256-byte chunked stream over a key-value repository |
//! | Contracts | `contracts/` | Object storage and bridge route tables |
//! | Registry | `registry.rs` | Address -> router, interpreter-facing lookup |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `KeyValueRepository` | Persist buffer length and chunks |
//! | `ObjectStore` | Fetch and upload bucket objects |
//! | `CrossChainBridge` | Forward, track and verify cross-chain transfers |
//!
//! ## Usage Example
//!
//! ```
//! use qc_11_system_contracts::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = SystemContractRegistry::with_defaults(
//!     &SystemContractsConfig::default(),
//!     Arc::new(InMemoryRepository::new()),
//!     Arc::new(InMemoryObjectStore::new()),
//!     Arc::new(InMemoryBridge::default()),
//! )
//! .unwrap();
//!
//! let mut call = compute_selector("Write(bytes)").as_bytes().to_vec();
//! call.extend(encode_return_value(&[AbiValue::Bytes(b"hello".to_vec())]));
//! let out = registry.execute(&SYSTEM_BUFFER_ADDRESS, &call).unwrap();
//! assert_eq!(out, u64_word(5).to_vec());
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_possible_truncation)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod errors;
pub mod ports;
pub mod registry;
pub mod router;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Value objects
    pub use crate::domain::value_objects::{Address, Hash, Selector, U256};

    // Domain services
    pub use crate::domain::services::{compute_selector, keccak256, u64_word};

    // Codec
    pub use crate::codec::{encode_return_value, extract_params, AbiValue, ArgKind, Args};

    // Routing
    pub use crate::registry::SystemContractRegistry;
    pub use crate::router::{canonical_signature, HandlerDescriptor, Router};

    // Buffer
    pub use crate::buffer::{BufferContract, BufferStream, SystemBuffer, CHUNK_SIZE};

    // Contracts
    pub use crate::contracts::{BridgeContract, ObjectStorageContract};

    // Ports
    pub use crate::ports::inbound::{DispatchFn, SystemContract, SystemContractLookup};
    pub use crate::ports::outbound::{
        CrossChainBridge, ForwardReceipt, KeyValueRepository, ObjectMeta, ObjectStore,
    };

    // Adapters
    pub use crate::adapters::{InMemoryBridge, InMemoryObjectStore, InMemoryRepository};

    // Config
    pub use crate::config::{
        SystemContractsConfig, BRIDGE_ADDRESS, OBJECT_STORAGE_ADDRESS, SYSTEM_BUFFER_ADDRESS,
    };

    // Errors
    pub use crate::errors::{
        BridgeError, BufferError, CodecError, ConfigError, ContractError, DispatchError,
        ObjectStoreError, RepositoryError,
    };
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 11;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "System Contracts";

// =============================================================================
// TESTS
// =============================================================================
