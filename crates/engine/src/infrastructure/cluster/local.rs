//! In-process cluster controller.
//!
//! "Schedules" a region worker by binding a loopback listener and spawning the worker's HTTP
//! server as a tokio task. The worker is configured from the spec's environment, the same way
//! the `driftscape-region` binary is. Runs exactly one replica per cell: the requested scaling
//! policy, image, labels and container port are recorded and logged, not enforced.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use driftscape_domain::GridCell;

use crate::config::RegionWorkerConfig;
use crate::entities::PositionStore;
use crate::infrastructure::ports::{
    ClusterControllerPort, ControllerError, ScalingPolicy, WorkerEndpoint, WorkerSpec,
};
use crate::region::{http as region_http, RegionWorker};

pub const DEFAULT_BIND_HOST: &str = "127.0.0.1";

struct LocalWorker {
    endpoint: WorkerEndpoint,
    scaling: ScalingPolicy,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl LocalWorker {
    fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

pub struct LocalClusterController {
    positions: Arc<PositionStore>,
    bind_host: String,
    workers: DashMap<GridCell, LocalWorker>,
}

impl LocalClusterController {
    /// Workers spawned here share `positions` (and so the terrain cache) with the coordinator.
    pub fn new(positions: Arc<PositionStore>) -> Self {
        Self {
            positions,
            bind_host: DEFAULT_BIND_HOST.to_string(),
            workers: DashMap::new(),
        }
    }

    /// Cells whose worker task is still running.
    pub fn running_cells(&self) -> Vec<GridCell> {
        let mut cells: Vec<GridCell> = self
            .workers
            .iter()
            .filter(|entry| entry.value().is_running())
            .map(|entry| *entry.key())
            .collect();
        cells.sort();
        cells
    }

    pub fn scaling_policy(&self, cell: GridCell) -> Option<ScalingPolicy> {
        self.workers.get(&cell).map(|w| w.scaling)
    }

    /// Stop every worker. Used on coordinator shutdown.
    pub fn shutdown_all(&self) {
        for entry in self.workers.iter() {
            entry.value().shutdown.cancel();
        }
        self.workers.clear();
    }
}

#[async_trait]
impl ClusterControllerPort for LocalClusterController {
    async fn create_worker(&self, spec: &WorkerSpec) -> Result<WorkerEndpoint, ControllerError> {
        if self
            .workers
            .get(&spec.cell)
            .is_some_and(|existing| existing.is_running())
        {
            return Err(ControllerError::Create {
                worker: spec.name.to_string(),
                resource: "compute unit",
                message: "already exists".to_string(),
            });
        }

        let env = spec.env();
        let config = RegionWorkerConfig::from_lookup(|key: &str| {
            env.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.clone())
        })
        .map_err(|e| ControllerError::Create {
            worker: spec.name.to_string(),
            resource: "compute unit",
            message: e.to_string(),
        })?;

        let listener = TcpListener::bind((self.bind_host.as_str(), 0))
            .await
            .map_err(|e| ControllerError::Create {
                worker: spec.name.to_string(),
                resource: "network endpoint",
                message: e.to_string(),
            })?;
        let addr = listener.local_addr().map_err(|e| ControllerError::Create {
            worker: spec.name.to_string(),
            resource: "network endpoint",
            message: e.to_string(),
        })?;

        let endpoint = WorkerEndpoint::new(spec.name.clone(), format!("http://{}", addr));
        let worker = Arc::new(RegionWorker::new(config.cell, self.positions.clone()));
        let shutdown = CancellationToken::new();

        let task_shutdown = shutdown.clone();
        let worker_name = spec.name.clone();
        let task = tokio::spawn(async move {
            if let Err(e) = region_http::serve(listener, worker, task_shutdown).await {
                tracing::error!(worker = %worker_name, error = %e, "Region worker stopped");
            }
        });

        tracing::info!(
            worker = %spec.name,
            address = %endpoint.address,
            image = %spec.image,
            labels = ?spec.labels(),
            container_port = spec.port,
            cpu_millis = spec.resources.cpu_millis,
            min_replicas = spec.scaling.min_replicas,
            max_replicas = spec.scaling.max_replicas,
            target_cpu_percent = spec.scaling.target_cpu_percent,
            "Scheduled region worker locally (single replica)"
        );

        // A finished task left behind by a crashed worker is replaced here.
        if let Some(previous) = self.workers.insert(
            spec.cell,
            LocalWorker {
                endpoint: endpoint.clone(),
                scaling: spec.scaling,
                shutdown,
                task,
            },
        ) {
            previous.shutdown.cancel();
        }

        Ok(endpoint)
    }

    async fn delete_worker(&self, cell: GridCell) -> Result<(), ControllerError> {
        if let Some((_, worker)) = self.workers.remove(&cell) {
            worker.shutdown.cancel();
            tracing::info!(worker = %worker.endpoint.worker_name, "Deleted region worker");
        }
        Ok(())
    }

    async fn worker_exists(&self, cell: GridCell) -> Result<bool, ControllerError> {
        Ok(self
            .workers
            .get(&cell)
            .is_some_and(|worker| worker.is_running()))
    }
}
