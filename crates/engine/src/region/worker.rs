//! RegionWorker: one cell's terrain behind a description endpoint.

use std::sync::Arc;

use driftscape_domain::{GridCell, TerrainDescriptor};

use crate::entities::PositionStore;
use crate::region::generator;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("This worker serves {serves}, not {requested}")]
    CellMismatch { serves: GridCell, requested: GridCell },
}

/// A worker is scoped to exactly one cell for its whole life.
pub struct RegionWorker {
    cell: GridCell,
    positions: Arc<PositionStore>,
}

impl RegionWorker {
    pub fn new(cell: GridCell, positions: Arc<PositionStore>) -> Self {
        Self { cell, positions }
    }

    pub fn cell(&self) -> GridCell {
        self.cell
    }

    /// Generate this cell's terrain and publish it to the shared cache.
    ///
    /// Store failures never fail the request: a missing southern neighbour just means no
    /// border check, and a failed write-back only costs later fallbacks.
    pub async fn describe(&self, requested: GridCell) -> Result<TerrainDescriptor, WorkerError> {
        if requested != self.cell {
            return Err(WorkerError::CellMismatch {
                serves: self.cell,
                requested,
            });
        }

        let south = match self.cell.south() {
            Some(south) => match self.positions.cached_terrain(south).await {
                Ok(descriptor) => descriptor,
                Err(e) => {
                    tracing::warn!(
                        cell = %self.cell,
                        error = %e,
                        "Could not read southern neighbour, skipping border check"
                    );
                    None
                }
            },
            None => None,
        };

        let descriptor = generator::generate(self.cell, south.as_ref());

        if let Err(e) = self.positions.cache_terrain(self.cell, &descriptor).await {
            tracing::warn!(
                cell = %self.cell,
                error = %e,
                "Failed to cache generated terrain"
            );
        }

        tracing::debug!(
            cell = %self.cell,
            terrain = %descriptor,
            south_cached = south.is_some(),
            "Described region"
        );
        Ok(descriptor)
    }
}
