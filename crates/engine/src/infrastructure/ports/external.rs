//! External service port traits (cluster controller, region RPC).

use async_trait::async_trait;
use driftscape_domain::{CellLabel, GridCell, WorkerName};
use driftscape_shared::{DescribeRequest, DescribeResponse};

use super::error::{ControllerError, RpcError};

/// Port every region worker listens on inside its compute unit.
pub const REGION_CONTAINER_PORT: u16 = 8081;

// =============================================================================
// Cluster Controller Types
// =============================================================================

/// Resources requested for one worker replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    /// CPU request in millicores (`100` = a tenth of a core)
    pub cpu_millis: u32,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self { cpu_millis: 100 }
    }
}

/// Load-driven replica bounds for one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalingPolicy {
    pub min_replicas: u32,
    pub max_replicas: u32,
    /// Average CPU utilisation the autoscaler aims for
    pub target_cpu_percent: u32,
}

impl ScalingPolicy {
    /// Build a policy with `min_replicas = 1`, clamping `max_replicas` to at least 1.
    pub fn up_to(max_replicas: u32, target_cpu_percent: u32) -> Self {
        Self {
            min_replicas: 1,
            max_replicas: max_replicas.max(1),
            target_cpu_percent: target_cpu_percent.clamp(1, 100),
        }
    }
}

impl Default for ScalingPolicy {
    fn default() -> Self {
        Self::up_to(3, 50)
    }
}

/// Everything the controller needs to provision one cell's worker: a compute unit running the
/// region image, a network endpoint in front of it, and an autoscaling policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    pub cell: GridCell,
    pub name: WorkerName,
    pub x_label: CellLabel,
    pub y_label: CellLabel,
    pub image: String,
    pub resources: ResourceLimits,
    pub scaling: ScalingPolicy,
    pub port: u16,
}

impl WorkerSpec {
    pub fn for_cell(
        cell: GridCell,
        image: impl Into<String>,
        resources: ResourceLimits,
        scaling: ScalingPolicy,
    ) -> Self {
        let (x_label, y_label) = WorkerName::labels(cell);
        Self {
            cell,
            name: WorkerName::for_cell(cell),
            x_label,
            y_label,
            image: image.into(),
            resources,
            scaling,
            port: REGION_CONTAINER_PORT,
        }
    }

    /// Environment handed to the worker process (`REGION_X` / `REGION_Y`).
    pub fn env(&self) -> Vec<(&'static str, String)> {
        vec![
            ("REGION_X", self.cell.x.to_string()),
            ("REGION_Y", self.cell.y.to_string()),
        ]
    }

    /// Selector labels shared by the compute unit and its endpoint.
    pub fn labels(&self) -> Vec<(&'static str, String)> {
        vec![
            ("app", "region".to_string()),
            ("x", self.x_label.to_string()),
            ("y", self.y_label.to_string()),
        ]
    }
}

/// Where a cell's worker can be reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerEndpoint {
    pub worker_name: WorkerName,
    /// Base URL, e.g. `http://127.0.0.1:40123`
    pub address: String,
}

impl WorkerEndpoint {
    pub fn new(worker_name: WorkerName, address: impl Into<String>) -> Self {
        Self {
            worker_name,
            address: address.into().trim_end_matches('/').to_string(),
        }
    }
}

impl std::fmt::Display for WorkerEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.worker_name, self.address)
    }
}

// =============================================================================
// Ports
// =============================================================================

/// The platform that schedules, addresses and autoscales region workers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClusterControllerPort: Send + Sync {
    /// Create the compute unit, network endpoint and scaling policy for `spec.cell`.
    async fn create_worker(&self, spec: &WorkerSpec) -> Result<WorkerEndpoint, ControllerError>;
    /// Delete everything belonging to `cell`'s worker. Deleting nothing is not an error.
    async fn delete_worker(&self, cell: GridCell) -> Result<(), ControllerError>;
    async fn worker_exists(&self, cell: GridCell) -> Result<bool, ControllerError>;
}

/// One description call to a worker. Implementations need not enforce a timeout; the
/// region client bounds every call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegionRpcPort: Send + Sync {
    async fn describe(
        &self,
        endpoint: &WorkerEndpoint,
        request: DescribeRequest,
    ) -> Result<DescribeResponse, RpcError>;
}
