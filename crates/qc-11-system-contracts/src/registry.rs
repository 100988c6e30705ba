//! # System Contract Registry
//!
//! Maps reserved addresses to route tables. The interpreter asks it whether
//! a call target is native and, if so, dispatches through it instead of
//! running bytecode.

use crate::buffer::{BufferContract, SystemBuffer};
use crate::config::SystemContractsConfig;
use crate::contracts::{BridgeContract, ObjectStorageContract};
use crate::domain::value_objects::Address;
use crate::errors::{ConfigError, DispatchError};
use crate::ports::inbound::{DispatchFn, SystemContract, SystemContractLookup};
use crate::ports::outbound::{CrossChainBridge, KeyValueRepository, ObjectStore};
use crate::router::Router;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Address-indexed set of system contracts.
#[derive(Default)]
pub struct SystemContractRegistry {
    routers: HashMap<Address, Router>,
}

impl SystemContractRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires the buffer, object-storage and bridge contracts at the
    /// configured addresses. The object-storage contract stages data through
    /// the same buffer the buffer contract serves.
    ///
    /// # Errors
    ///
    /// Whatever [`SystemContractsConfig::validate`] rejects.
    pub fn with_defaults(
        config: &SystemContractsConfig,
        repository: Arc<dyn KeyValueRepository>,
        object_store: Arc<dyn ObjectStore>,
        bridge: Arc<dyn CrossChainBridge>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let buffer = Arc::new(SystemBuffer::new(
            config.buffer_address,
            repository,
            &config.buffer,
        ));

        let mut registry = Self::new();
        registry.install(Arc::new(BufferContract::new(Arc::clone(&buffer))));
        registry.install(Arc::new(ObjectStorageContract::new(
            config.object_storage_address,
            object_store,
            buffer,
            &config.object_storage,
        )));
        registry.install(Arc::new(BridgeContract::new(config.bridge_address, bridge)));
        Ok(registry)
    }

    /// Registers `contract` at its own address.
    pub fn install<C: SystemContract + 'static>(&mut self, contract: Arc<C>) {
        let address = contract.address();
        let router = contract.routes();
        self.register(address, router);
    }

    /// Registers `router` at `address`, replacing any previous contract there.
    pub fn register(&mut self, address: Address, router: Router) {
        info!(%address, contract = router.contract(), routes = router.len(), "system contract registered");
        if let Some(previous) = self.routers.insert(address, router) {
            warn!(%address, replaced = previous.contract(), "system contract replaced");
        }
    }

    /// Route table at `address`.
    #[must_use]
    pub fn router(&self, address: &Address) -> Option<&Router> {
        self.routers.get(address)
    }

    /// Registered addresses, in no particular order.
    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.routers.keys()
    }

    /// Number of registered contracts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routers.len()
    }

    /// True when no contract is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty()
    }

    /// Runs `input` against the contract at `address`.
    ///
    /// # Errors
    ///
    /// `UnknownContract` if nothing is registered there, otherwise whatever
    /// [`Router::dispatch`] reports.
    #[instrument(skip(self, input), fields(%address, input_len = input.len()))]
    pub fn execute(&self, address: &Address, input: &[u8]) -> Result<Vec<u8>, DispatchError> {
        self.routers
            .get(address)
            .ok_or(DispatchError::UnknownContract(*address))?
            .dispatch(input)
    }
}

impl SystemContractLookup for SystemContractRegistry {
    fn is_system_contract(&self, address: &Address) -> bool {
        self.routers.contains_key(address)
    }

    fn get_dispatch_fn(&self, address: &Address) -> Option<DispatchFn<'_>> {
        let router = self.routers.get(address)?;
        Some(Box::new(move |input: &[u8]| router.dispatch(input)))
    }
}

impl fmt::Debug for SystemContractRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.routers.iter()).finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
