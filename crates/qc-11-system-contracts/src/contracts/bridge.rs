//! # Cross-Chain Bridge Routes
//!
//! RPC-style route table in front of a [`CrossChainBridge`]. Addresses,
//! hashes and raw transactions cross the ABI boundary as `0x` hex strings.
//!
//! | Method | Outputs |
//! |--------|---------|
//! | `ForwardFunds(string,uint64,string,string)` | `(local_hash, target_hash, 1)` |
//! | `GetTxState(string,uint64,string,string)` | receipt status |
//! | `ReceiveFunds(address,uint64,string,uint64)` | `1` once verified |

use crate::codec::ArgKind;
use crate::domain::value_objects::{Address, Hash};
use crate::errors::ContractError;
use crate::ports::inbound::SystemContract;
use crate::ports::outbound::CrossChainBridge;
use crate::router::Router;
use std::sync::Arc;

/// Value returned by calls that completed.
const CALL_OK: u64 = 1;

/// Bridge route table served at a reserved address.
pub struct BridgeContract {
    address: Address,
    bridge: Arc<dyn CrossChainBridge>,
}

impl BridgeContract {
    /// Creates the route table at `address` over `bridge`.
    #[must_use]
    pub fn new(address: Address, bridge: Arc<dyn CrossChainBridge>) -> Self {
        Self { address, bridge }
    }
}

fn parse_address(raw: &str) -> Result<Address, ContractError> {
    Address::from_hex(raw.trim())
        .ok_or_else(|| ContractError::InvalidArgument(format!("bad address: {raw}")))
}

fn parse_hash(raw: &str) -> Result<Hash, ContractError> {
    Hash::from_hex(raw.trim())
        .ok_or_else(|| ContractError::InvalidArgument(format!("bad tx hash: {raw}")))
}

fn parse_hex_bytes(raw: &str) -> Result<Vec<u8>, ContractError> {
    let digits = raw.trim();
    let digits = digits.strip_prefix("0x").unwrap_or(digits);
    hex::decode(digits).map_err(|e| ContractError::InvalidArgument(format!("bad tx payload: {e}")))
}

impl SystemContract for BridgeContract {
    fn address(&self) -> Address {
        self.address
    }

    fn name(&self) -> &'static str {
        "bridge"
    }

    fn routes(self: Arc<Self>) -> Router {
        let mut router = Router::new(self.name());

        let bridge = Arc::clone(&self.bridge);
        router.register(
            "ForwardFunds",
            &[ArgKind::String, ArgKind::UInt64, ArgKind::String, ArgKind::String],
            &[ArgKind::String, ArgKind::String, ArgKind::UInt64],
            move |args| {
                let to = parse_address(args.string(0)?)?;
                let receipt =
                    bridge.forward_funds(to, args.u64(1)?, args.string(2)?, args.string(3)?)?;
                Ok(vec![
                    receipt.local_tx.to_hex().into(),
                    receipt.target_tx.to_hex().into(),
                    CALL_OK.into(),
                ])
            },
        );

        // The amount and the third string are part of the published selector but unused.
        let bridge = Arc::clone(&self.bridge);
        router.register(
            "GetTxState",
            &[ArgKind::String, ArgKind::UInt64, ArgKind::String, ArgKind::String],
            &[ArgKind::UInt64],
            move |args| {
                let status = bridge.tx_status(parse_hash(args.string(0)?)?, args.string(3)?)?;
                Ok(vec![status.into()])
            },
        );

        let bridge = Arc::clone(&self.bridge);
        router.register(
            "ReceiveFunds",
            &[ArgKind::Address, ArgKind::UInt64, ArgKind::String, ArgKind::UInt64],
            &[ArgKind::UInt64],
            move |args| {
                let raw_tx = parse_hex_bytes(args.string(2)?)?;
                bridge.verify_received(args.address(0)?, args.u64(1)?, &raw_tx, args.u64(3)?)?;
                Ok(vec![CALL_OK.into()])
            },
        );

        router
    }
}

// =============================================================================
// TESTS
// =============================================================================
