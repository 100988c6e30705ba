//! # In-Memory Bridge
//!
//! Cross-chain bridge that records forwards locally instead of signing and
//! broadcasting them. Target chains must be registered up front; incoming
//! transfer proofs are accepted only if registered with
//! [`InMemoryBridge::accept_proof`].

use crate::domain::services::keccak256;
use crate::domain::value_objects::{Address, Hash};
use crate::errors::BridgeError;
use crate::ports::outbound::{CrossChainBridge, ForwardReceipt};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Receipt status of a failed transaction.
pub const TX_FAILED: u64 = 0;
/// Receipt status of a successful transaction.
pub const TX_SUCCESS: u64 = 1;

/// A transfer forwarded through the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedTransfer {
    /// Recipient on the target chain.
    pub to: Address,
    /// Amount transferred.
    pub amount: u64,
    /// Opaque payload attached to the transfer.
    pub payload: String,
    /// Target chain flag.
    pub chain: String,
    /// Hashes assigned to the transfer.
    pub receipt: ForwardReceipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Proof {
    to: Address,
    amount: u64,
    raw_tx: Vec<u8>,
    src_chain_id: u64,
}

#[derive(Debug, Default)]
struct BridgeState {
    chains: HashSet<String>,
    unreachable: HashSet<String>,
    forwarded: Vec<ForwardedTransfer>,
    statuses: HashMap<(String, Hash), u64>,
    proofs: HashSet<Proof>,
}

/// In-memory cross-chain bridge.
#[derive(Debug, Default)]
pub struct InMemoryBridge {
    state: RwLock<BridgeState>,
}

impl InMemoryBridge {
    /// Create a bridge that knows the given target chains.
    #[must_use]
    pub fn new<I, S>(chains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bridge = Self::default();
        bridge.state.write().chains = chains.into_iter().map(Into::into).collect();
        bridge
    }

    /// Overrides the receipt status reported for `tx_hash` on `chain`.
    pub fn set_status(&self, chain: &str, tx_hash: Hash, status: u64) {
        self.state
            .write()
            .statuses
            .insert((chain.to_string(), tx_hash), status);
    }

    /// Marks `chain` as unreachable; forwards and status queries to it fail
    /// with an RPC error until cleared.
    pub fn set_unreachable(&self, chain: &str, unreachable: bool) {
        let mut state = self.state.write();
        if unreachable {
            state.unreachable.insert(chain.to_string());
        } else {
            state.unreachable.remove(chain);
        }
    }

    /// Registers a transfer proof that `verify_received` will accept.
    pub fn accept_proof(&self, to: Address, amount: u64, raw_tx: &[u8], src_chain_id: u64) {
        self.state.write().proofs.insert(Proof {
            to,
            amount,
            raw_tx: raw_tx.to_vec(),
            src_chain_id,
        });
    }

    /// Every transfer forwarded so far, oldest first.
    #[must_use]
    pub fn forwarded(&self) -> Vec<ForwardedTransfer> {
        self.state.read().forwarded.clone()
    }

    fn check_chain(state: &BridgeState, chain: &str) -> Result<(), BridgeError> {
        if !state.chains.contains(chain) {
            return Err(BridgeError::UnknownChain(chain.to_string()));
        }
        if state.unreachable.contains(chain) {
            return Err(BridgeError::Rpc(format!("{chain}: connection refused")));
        }
        Ok(())
    }
}

impl CrossChainBridge for InMemoryBridge {
    fn forward_funds(
        &self,
        to: Address,
        amount: u64,
        payload: &str,
        chain: &str,
    ) -> Result<ForwardReceipt, BridgeError> {
        let mut state = self.state.write();
        Self::check_chain(&state, chain)?;

        let nonce = state.forwarded.len() as u64;
        let mut preimage = to.as_bytes().to_vec();
        preimage.extend_from_slice(&amount.to_be_bytes());
        preimage.extend_from_slice(&nonce.to_be_bytes());
        preimage.extend_from_slice(chain.as_bytes());
        preimage.extend_from_slice(payload.as_bytes());
        let local_tx = keccak256(&preimage);
        let target_tx = keccak256(local_tx.as_bytes());

        let receipt = ForwardReceipt {
            local_tx,
            target_tx,
        };
        state
            .statuses
            .insert((chain.to_string(), target_tx), TX_SUCCESS);
        state.forwarded.push(ForwardedTransfer {
            to,
            amount,
            payload: payload.to_string(),
            chain: chain.to_string(),
            receipt,
        });

        info!(%to, amount, chain, target_tx = %target_tx.to_hex(), "funds forwarded");
        Ok(receipt)
    }

    fn tx_status(&self, tx_hash: Hash, chain: &str) -> Result<u64, BridgeError> {
        let state = self.state.read();
        Self::check_chain(&state, chain)?;
        // No receipt yet reads as failed, like a node answering with an empty receipt.
        Ok(state
            .statuses
            .get(&(chain.to_string(), tx_hash))
            .copied()
            .unwrap_or(TX_FAILED))
    }

    fn verify_received(
        &self,
        to: Address,
        amount: u64,
        raw_tx: &[u8],
        src_chain_id: u64,
    ) -> Result<(), BridgeError> {
        if raw_tx.is_empty() {
            return Err(BridgeError::Decode("empty transaction".to_string()));
        }
        let proof = Proof {
            to,
            amount,
            raw_tx: raw_tx.to_vec(),
            src_chain_id,
        };
        if self.state.read().proofs.contains(&proof) {
            info!(%to, amount, src_chain_id, "received funds verified");
            Ok(())
        } else {
            Err(BridgeError::ArgsMismatch(
                "tx args not matched tx's".to_string(),
            ))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
