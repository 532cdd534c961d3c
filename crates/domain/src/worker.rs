//! Worker records: the lifecycle manager's view of one cell's region worker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cell_label::WorkerName;
use crate::error::DomainError;
use crate::grid::GridCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerStatus {
    /// Creation requested, controller has not confirmed yet
    Provisioning,
    /// Controller confirmed the worker and its endpoint
    Ready,
    /// Record and controller disagree; must be torn down before reuse
    Stale,
    /// Teardown requested
    Terminating,
}

impl std::fmt::Display for WorkerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerStatus::Provisioning => write!(f, "provisioning"),
            WorkerStatus::Ready => write!(f, "ready"),
            WorkerStatus::Stale => write!(f, "stale"),
            WorkerStatus::Terminating => write!(f, "terminating"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRecord {
    pub cell: GridCell,
    pub worker_name: WorkerName,
    pub status: WorkerStatus,
    pub created_at: DateTime<Utc>,
}

impl WorkerRecord {
    pub fn provisioning(cell: GridCell, created_at: DateTime<Utc>) -> Self {
        Self {
            cell,
            worker_name: WorkerName::for_cell(cell),
            status: WorkerStatus::Provisioning,
            created_at,
        }
    }

    pub fn mark_ready(&mut self) -> Result<(), DomainError> {
        match self.status {
            WorkerStatus::Provisioning | WorkerStatus::Ready => {
                self.status = WorkerStatus::Ready;
                Ok(())
            }
            other => Err(DomainError::invalid_state_transition(format!(
                "{} worker {} cannot become ready",
                other, self.worker_name
            ))),
        }
    }

    pub fn mark_stale(&mut self) -> Result<(), DomainError> {
        if self.status == WorkerStatus::Terminating {
            return Err(DomainError::invalid_state_transition(format!(
                "terminating worker {} cannot become stale",
                self.worker_name
            )));
        }
        self.status = WorkerStatus::Stale;
        Ok(())
    }

    /// Any record may be torn down.
    pub fn begin_termination(&mut self) {
        self.status = WorkerStatus::Terminating;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> WorkerRecord {
        let created_at = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        WorkerRecord::provisioning(GridCell::new(-1, 3), created_at)
    }

    #[test]
    fn test_new_record_is_provisioning_with_encoded_name() {
        let record = record();
        assert_eq!(record.status, WorkerStatus::Provisioning);
        assert_eq!(record.worker_name.as_str(), "region-n1-3");
    }

    #[test]
    fn test_ready_then_terminating() {
        let mut record = record();
        record.mark_ready().unwrap();
        assert_eq!(record.status, WorkerStatus::Ready);
        record.begin_termination();
        assert_eq!(record.status, WorkerStatus::Terminating);
    }

    #[test]
    fn test_terminating_cannot_come_back() {
        let mut record = record();
        record.begin_termination();
        assert!(record.mark_ready().is_err());
        assert!(record.mark_stale().is_err());
    }

    #[test]
    fn test_stale_cannot_become_ready() {
        let mut record = record();
        record.mark_stale().unwrap();
        assert_eq!(record.status, WorkerStatus::Stale);
        assert!(record.mark_ready().is_err());
    }
}
