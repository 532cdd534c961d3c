//! Cluster controller adapters.

mod local;

pub use local::LocalClusterController;
