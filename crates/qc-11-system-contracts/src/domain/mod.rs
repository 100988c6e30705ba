//! # Domain Layer (Inner Hexagon)
//!
//! Pure primitives for the system-contract layer.
//! NO I/O, NO external state.

pub mod services;
pub mod value_objects;

pub use services::*;
pub use value_objects::*;
