//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the system contracts and the outside world.
//!
//! - **Driving Ports (Inbound)**: `SystemContractLookup`, `SystemContract`
//! - **Driven Ports (Outbound)**: `KeyValueRepository`, `ObjectStore`, `CrossChainBridge`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
