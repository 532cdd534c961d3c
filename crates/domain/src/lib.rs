//! DriftScape domain types.
//!
//! Value types and their invariants only. No async and no I/O.

pub mod cell_label;
pub mod error;
pub mod grid;
pub mod navigator;
pub mod terrain;
pub mod worker;

pub use cell_label::{CellLabel, Sign, WorkerName};
pub use error::DomainError;
pub use grid::{Direction, GridCell};
pub use navigator::{NavigatorId, NavigatorState};
pub use terrain::{BaseTerrain, Feature, TerrainDescriptor};
pub use worker::{WorkerRecord, WorkerStatus};
