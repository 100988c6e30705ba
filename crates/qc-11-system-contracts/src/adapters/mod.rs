//! # Adapters Layer (Outer Hexagon)
//!
//! In-memory implementations of the driven ports. The host node supplies
//! its state database, object-storage client and bridge in production.

pub mod memory_bridge;
pub mod memory_object_store;
pub mod memory_repository;

pub use memory_bridge::*;
pub use memory_object_store::*;
pub use memory_repository::*;
