//! Cell lifecycle use cases.
//!
//! Decides when a cell's region worker must be created, reused or torn down. Provisioning
//! itself is delegated to the cluster controller port.

mod manager;

pub use manager::{
    CellLifecycleManager, EnsureOutcome, Ensured, LifecycleConfig, LifecycleError, RetireOutcome,
};
