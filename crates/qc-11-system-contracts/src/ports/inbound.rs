//! # Driving Ports (API - Inbound)
//!
//! What the interpreter calls: a lookup from contract address to a dispatch
//! function, and the trait every system contract implements to publish its
//! route table.

use crate::domain::value_objects::Address;
use crate::errors::DispatchError;
use crate::router::Router;
use std::sync::Arc;

/// Dispatch function for one system contract: call data in, return data out.
pub type DispatchFn<'a> = Box<dyn Fn(&[u8]) -> Result<Vec<u8>, DispatchError> + 'a>;

/// Address-to-dispatch lookup consulted by the interpreter.
pub trait SystemContractLookup {
    /// True if `address` is served natively instead of by bytecode.
    fn is_system_contract(&self, address: &Address) -> bool;

    /// Dispatch function for `address`, or `None` for ordinary contracts.
    fn get_dispatch_fn(&self, address: &Address) -> Option<DispatchFn<'_>>;
}

/// A native contract reachable at a reserved address.
pub trait SystemContract: Send + Sync {
    /// Reserved address of this contract.
    fn address(&self) -> Address;

    /// Human-readable name, used in logs.
    fn name(&self) -> &'static str;

    /// Builds the route table whose handlers call into this contract.
    fn routes(self: Arc<Self>) -> Router;
}
