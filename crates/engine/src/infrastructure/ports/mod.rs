//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - The key-value store (could swap SQLite -> Redis)
//! - The cluster controller (could swap the local controller -> Kubernetes)
//! - The region description RPC (could swap HTTP/JSON -> gRPC)
//! - Clock (for testing)

mod error;
mod external;
mod store;
mod testing;

// =============================================================================
// Storage Ports
// =============================================================================
pub use store::KeyValueStorePort;

// =============================================================================
// External Service Ports
// =============================================================================
pub use external::{
    ClusterControllerPort, RegionRpcPort, ResourceLimits, ScalingPolicy, WorkerEndpoint,
    WorkerSpec, REGION_CONTAINER_PORT,
};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use external::{MockClusterControllerPort, MockRegionRpcPort};

#[cfg(test)]
pub use store::MockKeyValueStorePort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::{ControllerError, RpcError, StoreError};
