//! Cell lifecycle manager.
//!
//! Concurrency model: every `ensure`/`retire` for a cell runs inside that cell's async mutex,
//! so check-then-act sequences for one cell never interleave. Different cells never contend.
//! There are no retries: a failed controller call is logged and the next `ensure` for the
//! cell heals whatever it left behind.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use driftscape_domain::{DomainError, GridCell, WorkerRecord, WorkerStatus};

use crate::infrastructure::ports::{
    ClockPort, ClusterControllerPort, ControllerError, ResourceLimits, ScalingPolicy,
    WorkerEndpoint, WorkerSpec,
};

/// What to provision for every cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    pub image: String,
    pub resources: ResourceLimits,
    pub scaling: ScalingPolicy,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            image: "driftscape-region".to_string(),
            resources: ResourceLimits::default(),
            scaling: ScalingPolicy::default(),
        }
    }
}

/// How `ensure` satisfied the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// A ready worker was already running
    Reused,
    /// Nothing existed; a fresh worker was created
    Provisioned,
    /// Leftovers (orphaned resources or a record the controller disowned) were torn down first
    Recreated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured {
    pub endpoint: WorkerEndpoint,
    pub outcome: EnsureOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetireOutcome {
    Retired,
    /// No worker was tracked for the cell
    NothingToRetire,
}

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Cluster controller failed for {cell}: {source}")]
    Controller {
        cell: GridCell,
        #[source]
        source: ControllerError,
    },
    #[error(transparent)]
    Domain(#[from] DomainError),
}

#[derive(Debug, Clone)]
struct ManagedWorker {
    record: WorkerRecord,
    endpoint: Option<WorkerEndpoint>,
}

impl ManagedWorker {
    fn ready_endpoint(&self) -> Option<&WorkerEndpoint> {
        match self.record.status {
            WorkerStatus::Ready => self.endpoint.as_ref(),
            _ => None,
        }
    }
}

pub struct CellLifecycleManager {
    controller: Arc<dyn ClusterControllerPort>,
    clock: Arc<dyn ClockPort>,
    config: LifecycleConfig,
    /// Sole owner of worker records; nothing else mutates them.
    workers: DashMap<GridCell, ManagedWorker>,
    cell_locks: DashMap<GridCell, Arc<Mutex<()>>>,
}

impl CellLifecycleManager {
    pub fn new(
        controller: Arc<dyn ClusterControllerPort>,
        clock: Arc<dyn ClockPort>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            controller,
            clock,
            config,
            workers: DashMap::new(),
            cell_locks: DashMap::new(),
        }
    }

    /// Guarantee a worker is reachable for `cell`, creating it if needed.
    pub async fn ensure(&self, cell: GridCell) -> Result<Ensured, LifecycleError> {
        let lock = self.lock_for(cell);
        let result = {
            let _guard = lock.lock().await;
            self.ensure_locked(cell).await
        };
        drop(lock);
        self.prune_lock(cell);
        result
    }

    /// Tear down `cell`'s worker, endpoint and scaling policy. Never fails.
    ///
    /// The record is dropped even if the controller refuses; a later `ensure` for the cell
    /// finds the leftovers and removes them.
    pub async fn retire(&self, cell: GridCell) -> RetireOutcome {
        let lock = self.lock_for(cell);
        let outcome = {
            let _guard = lock.lock().await;
            self.retire_locked(cell).await
        };
        drop(lock);
        self.prune_lock(cell);
        outcome
    }

    /// Snapshot of `cell`'s record, if any.
    pub fn record(&self, cell: GridCell) -> Option<WorkerRecord> {
        self.workers.get(&cell).map(|w| w.record.clone())
    }

    /// Snapshot of every record, sorted by cell.
    pub fn records(&self) -> Vec<WorkerRecord> {
        let mut records: Vec<WorkerRecord> =
            self.workers.iter().map(|w| w.record.clone()).collect();
        records.sort_by_key(|r| r.cell);
        records
    }

    async fn ensure_locked(&self, cell: GridCell) -> Result<Ensured, LifecycleError> {
        let known = self.workers.get(&cell).map(|w| w.value().clone());
        let exists = match self.controller.worker_exists(cell).await {
            Ok(exists) => Some(exists),
            Err(e) => {
                tracing::warn!(cell = %cell, error = %e, "Could not check worker existence");
                None
            }
        };

        if exists != Some(false) {
            if let Some(endpoint) = known.as_ref().and_then(ManagedWorker::ready_endpoint) {
                tracing::debug!(
                    cell = %cell,
                    worker = %endpoint.worker_name,
                    "Reusing ready worker"
                );
                return Ok(Ensured {
                    endpoint: endpoint.clone(),
                    outcome: EnsureOutcome::Reused,
                });
            }
        }

        if known.is_none() && exists != Some(true) {
            return self.provision(cell, EnsureOutcome::Provisioned).await;
        }

        tracing::info!(
            cell = %cell,
            record_status = ?known.as_ref().map(|w| w.record.status),
            controller_reports = ?exists,
            "Worker state inconsistent, tearing down before provisioning"
        );
        self.teardown(cell).await;
        self.provision(cell, EnsureOutcome::Recreated).await
    }

    /// Remove whatever the controller holds for `cell` and mark the record stale.
    async fn teardown(&self, cell: GridCell) {
        if let Some(mut managed) = self.workers.get_mut(&cell) {
            if let Err(e) = managed.record.mark_stale() {
                tracing::debug!(cell = %cell, error = %e, "Record already past stale");
            }
        }
        if let Err(e) = self.controller.delete_worker(cell).await {
            tracing::warn!(cell = %cell, error = %e, "Stale worker teardown failed");
        }
        self.workers.remove(&cell);
    }

    async fn provision(
        &self,
        cell: GridCell,
        outcome: EnsureOutcome,
    ) -> Result<Ensured, LifecycleError> {
        let mut record = WorkerRecord::provisioning(cell, self.clock.now());
        self.workers.insert(
            cell,
            ManagedWorker {
                record: record.clone(),
                endpoint: None,
            },
        );

        let spec = WorkerSpec::for_cell(
            cell,
            self.config.image.clone(),
            self.config.resources,
            self.config.scaling,
        );

        match self.controller.create_worker(&spec).await {
            Ok(endpoint) => {
                record.mark_ready()?;
                tracing::info!(
                    cell = %cell,
                    worker = %endpoint.worker_name,
                    address = %endpoint.address,
                    outcome = ?outcome,
                    "Region worker ready"
                );
                self.workers.insert(
                    cell,
                    ManagedWorker {
                        record,
                        endpoint: Some(endpoint.clone()),
                    },
                );
                Ok(Ensured { endpoint, outcome })
            }
            Err(e) => {
                self.workers.remove(&cell);
                tracing::warn!(
                    cell = %cell,
                    worker = %spec.name,
                    error = %e,
                    "Failed to provision region worker"
                );
                Err(LifecycleError::Controller { cell, source: e })
            }
        }
    }

    async fn retire_locked(&self, cell: GridCell) -> RetireOutcome {
        let worker_name = match self.workers.get_mut(&cell) {
            Some(mut managed) => {
                managed.record.begin_termination();
                managed.record.worker_name.clone()
            }
            None => {
                tracing::debug!(cell = %cell, "No worker to retire");
                return RetireOutcome::NothingToRetire;
            }
        };

        match self.controller.delete_worker(cell).await {
            Ok(()) => tracing::info!(cell = %cell, worker = %worker_name, "Retired region worker"),
            Err(e) => tracing::warn!(
                cell = %cell,
                worker = %worker_name,
                error = %e,
                "Failed to delete region worker, dropping record anyway"
            ),
        }
        self.workers.remove(&cell);
        RetireOutcome::Retired
    }

    fn lock_for(&self, cell: GridCell) -> Arc<Mutex<()>> {
        self.cell_locks
            .entry(cell)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the cell's lock entry once nobody else holds or waits on it.
    fn prune_lock(&self, cell: GridCell) {
        self.cell_locks
            .remove_if(&cell, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.cell_locks.len()
    }
}
