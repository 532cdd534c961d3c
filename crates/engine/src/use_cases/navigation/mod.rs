//! Navigation use cases.
//!
//! The coordinator turns `look` and `move` requests into lifecycle and description calls.

mod coordinator;
mod occupancy;

pub use coordinator::Coordinator;
pub use occupancy::Occupancy;

use driftscape_domain::{DomainError, GridCell, NavigatorId, TerrainDescriptor};
use driftscape_shared::DescriptionSource;

use crate::infrastructure::ports::StoreError;
use crate::use_cases::region_client::Description;

/// What a navigator is told after `look` or `move`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narration {
    pub cell: GridCell,
    pub text: String,
    pub descriptor: Option<TerrainDescriptor>,
    pub source: DescriptionSource,
}

impl Narration {
    pub fn look(cell: GridCell, description: Description) -> Self {
        let text = format!("You're in a {} at {}", description.terrain, cell);
        Self::from_description(cell, text, description)
    }

    pub fn arrival(cell: GridCell, description: Description) -> Self {
        let text = format!("You moved to a {} at {}", description.terrain, cell);
        Self::from_description(cell, text, description)
    }

    fn from_description(cell: GridCell, text: String, description: Description) -> Self {
        Self {
            cell,
            text,
            descriptor: description.descriptor,
            source: description.source,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Validation(#[from] DomainError),
    #[error("Position of navigator {navigator} is unavailable: {source}")]
    PositionUnavailable {
        navigator: NavigatorId,
        #[source]
        source: StoreError,
    },
}

impl CoordinatorError {
    pub fn is_client_error(&self) -> bool {
        match self {
            CoordinatorError::Validation(e) => e.is_client_error(),
            CoordinatorError::PositionUnavailable { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftscape_domain::BaseTerrain;

    #[test]
    fn narration_texts() {
        let plains = TerrainDescriptor::new(BaseTerrain::Plains, None);
        let look = Narration::look(GridCell::ORIGIN, Description::live(plains.clone()));
        assert_eq!(look.text, "You're in a plains at (0,0)");

        let moved = Narration::arrival(GridCell::new(0, 1), Description::cached(plains, "down"));
        assert_eq!(moved.text, "You moved to a plains at (0,1)");
        assert_eq!(moved.source, DescriptionSource::Cached);
    }

    #[test]
    fn placeholder_narration_has_no_descriptor() {
        let narration = Narration::look(GridCell::new(-2, 9), Description::placeholder("gone"));
        assert_eq!(narration.text, "You're in a mist-shrouded land at (-2,9)");
        assert_eq!(narration.descriptor, None);
    }
}
