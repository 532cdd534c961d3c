//! Entity modules - Domain capability encapsulation.
//!
//! Each module wraps operations over a port and provides the building blocks for use cases.

pub mod position_store;

pub use position_store::PositionStore;
