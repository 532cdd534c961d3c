//! PositionStore entity operations.
//!
//! Authoritative record of where each navigator stands, plus the advisory per-cell terrain
//! cache. Both live in the external key-value store:
//!
//! - `navigator:{id}` -> JSON `NavigatorState`
//! - `region:{x},{y}` -> rendered terrain (`"hills with a waterfall"`)

use std::sync::Arc;

use driftscape_domain::{GridCell, NavigatorId, NavigatorState, TerrainDescriptor};

use crate::infrastructure::ports::{ClockPort, KeyValueStorePort, StoreError};

pub struct PositionStore {
    store: Arc<dyn KeyValueStorePort>,
    clock: Arc<dyn ClockPort>,
}

impl PositionStore {
    pub fn new(store: Arc<dyn KeyValueStorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self { store, clock }
    }

    pub fn navigator_key(navigator: &NavigatorId) -> String {
        format!("navigator:{}", navigator)
    }

    pub fn terrain_key(cell: GridCell) -> String {
        format!("region:{},{}", cell.x, cell.y)
    }

    // Navigator state

    /// Current state of `navigator`; a navigator never seen before stands at the origin.
    pub async fn read(&self, navigator: &NavigatorId) -> Result<NavigatorState, StoreError> {
        let key = Self::navigator_key(navigator);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(NavigatorState::initial());
        };

        if let Ok(state) = serde_json::from_str::<NavigatorState>(&raw) {
            return Ok(state);
        }
        // Bare "x,y" values predate the JSON record.
        raw.parse::<GridCell>()
            .map(|position| NavigatorState {
                position,
                last_move_at: None,
            })
            .map_err(|e| StoreError::serialization(key, e))
    }

    /// Record that `navigator` now stands on `position`. One atomic key write.
    pub async fn write(
        &self,
        navigator: &NavigatorId,
        position: GridCell,
    ) -> Result<NavigatorState, StoreError> {
        let key = Self::navigator_key(navigator);
        let state = NavigatorState::moved_to(position, self.clock.now());
        let json =
            serde_json::to_string(&state).map_err(|e| StoreError::serialization(&key, e))?;
        self.store.set(&key, &json).await?;
        Ok(state)
    }

    // Terrain cache

    /// Last-known descriptor for `cell`. Unreadable cache entries count as absent.
    pub async fn cached_terrain(
        &self,
        cell: GridCell,
    ) -> Result<Option<TerrainDescriptor>, StoreError> {
        let key = Self::terrain_key(cell);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        match raw.parse::<TerrainDescriptor>() {
            Ok(descriptor) => Ok(Some(descriptor)),
            Err(e) => {
                tracing::warn!(
                    cell = %cell,
                    value = %raw,
                    error = %e,
                    "Ignoring unreadable terrain cache entry"
                );
                Ok(None)
            }
        }
    }

    pub async fn cache_terrain(
        &self,
        cell: GridCell,
        descriptor: &TerrainDescriptor,
    ) -> Result<(), StoreError> {
        self.store
            .set(&Self::terrain_key(cell), &descriptor.rendered)
            .await
    }
}
