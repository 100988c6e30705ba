//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the system contracts depend on. Adapters implement these to
//! provide:
//! - Key-value persistence for the system buffer
//! - Cloud object storage for the object-storage contract
//! - Cross-chain transaction handling for the bridge route table
//!
//! None of these are implemented here beyond in-memory test adapters.

use crate::domain::value_objects::{Address, Hash};
use crate::errors::{BridgeError, ObjectStoreError, RepositoryError};
use std::io::Read;

// =============================================================================
// KEY-VALUE REPOSITORY
// =============================================================================

/// Raw key-value persistence.
///
/// No transactions and no iteration. Each call stands alone, so a
/// multi-key update interrupted half way leaves the earlier keys written.
/// Callers needing crash atomicity must get it from the layer that provides
/// this repository.
pub trait KeyValueRepository: Send + Sync {
    /// Get a value by key. `None` if the key was never written or was deleted.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, RepositoryError>;

    /// Put a single key-value pair, replacing any previous value.
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), RepositoryError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn delete(&self, key: &[u8]) -> Result<(), RepositoryError>;
}

// =============================================================================
// OBJECT STORE
// =============================================================================

/// Metadata returned by an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Entity tag of the stored object.
    pub etag: String,
    /// Version id, empty when the bucket is unversioned.
    pub version_id: String,
    /// Server-side encryption algorithm, empty when none.
    pub encryption_alg: String,
}

/// Cloud object storage client.
pub trait ObjectStore: Send + Sync {
    /// Opens the object `name` in the bucket at `bucket_url` for reading.
    fn get_object(
        &self,
        bucket_url: &str,
        name: &str,
    ) -> Result<Box<dyn Read + Send>, ObjectStoreError>;

    /// Uploads everything readable from `body` as object `name`.
    fn put_object(
        &self,
        bucket_url: &str,
        name: &str,
        body: &mut dyn Read,
    ) -> Result<ObjectMeta, ObjectStoreError>;
}

// =============================================================================
// CROSS-CHAIN BRIDGE
// =============================================================================

/// Hashes of the two transactions created by a forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForwardReceipt {
    /// Transaction on this chain.
    pub local_tx: Hash,
    /// Transaction broadcast to the target chain.
    pub target_tx: Hash,
}

/// Cross-chain transfer backend.
///
/// Transaction construction, signing and broadcast live behind this trait.
pub trait CrossChainBridge: Send + Sync {
    /// Forwards `amount` to `to` on the chain named by `chain`.
    fn forward_funds(
        &self,
        to: Address,
        amount: u64,
        payload: &str,
        chain: &str,
    ) -> Result<ForwardReceipt, BridgeError>;

    /// Receipt status of `tx_hash` on `chain` (0 failed, 1 success, 2 pending).
    fn tx_status(&self, tx_hash: Hash, chain: &str) -> Result<u64, BridgeError>;

    /// Checks that `raw_tx`, signed on `src_chain_id`, pays `amount` to `to`.
    fn verify_received(
        &self,
        to: Address,
        amount: u64,
        raw_tx: &[u8],
        src_chain_id: u64,
    ) -> Result<(), BridgeError>;
}
