//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use crate::entities::PositionStore;
use crate::infrastructure::ports::{ClockPort, ClusterControllerPort, RegionRpcPort};
use crate::use_cases::lifecycle::LifecycleConfig;
use crate::use_cases::{CellLifecycleManager, Coordinator, RegionClient};

/// Main application state.
///
/// Passed to HTTP handlers via Axum state.
pub struct App {
    pub positions: Arc<PositionStore>,
    pub lifecycle: Arc<CellLifecycleManager>,
    pub coordinator: Arc<Coordinator>,
}

impl App {
    /// Wire the coordinator from its collaborators.
    pub fn new(
        positions: Arc<PositionStore>,
        controller: Arc<dyn ClusterControllerPort>,
        rpc: Arc<dyn RegionRpcPort>,
        clock: Arc<dyn ClockPort>,
        lifecycle: LifecycleConfig,
        describe_timeout: Duration,
    ) -> Self {
        let lifecycle = Arc::new(CellLifecycleManager::new(
            controller,
            clock.clone(),
            lifecycle,
        ));
        let region = Arc::new(RegionClient::new(rpc, positions.clone(), describe_timeout));
        let coordinator = Arc::new(Coordinator::new(
            positions.clone(),
            lifecycle.clone(),
            region,
            clock,
        ));

        Self {
            positions,
            lifecycle,
            coordinator,
        }
    }
}
