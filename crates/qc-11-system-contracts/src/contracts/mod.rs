//! # Native Contracts
//!
//! System contracts beyond the buffer. Each implements
//! [`SystemContract`](crate::ports::inbound::SystemContract) and publishes a
//! [`Router`](crate::router::Router).

pub mod bridge;
pub mod object_storage;

pub use bridge::BridgeContract;
pub use object_storage::ObjectStorageContract;
