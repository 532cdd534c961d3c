//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod cluster;
pub mod kv;
pub mod ports;
pub mod region_rpc;
