//! Coordinator use case.
//!
//! Every request walks the same path: resolve the target cell, ensure its worker, describe it,
//! settle state. For moves the previous cell is retired last, so the navigator always has at
//! least one reachable worker. Requests from one navigator run one at a time.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use driftscape_domain::{Direction, DomainError, GridCell, NavigatorId};

use super::{CoordinatorError, Narration, Occupancy};
use crate::entities::PositionStore;
use crate::infrastructure::ports::ClockPort;
use crate::use_cases::lifecycle::CellLifecycleManager;
use crate::use_cases::region_client::{Description, RegionClient};

pub struct Coordinator {
    positions: Arc<PositionStore>,
    lifecycle: Arc<CellLifecycleManager>,
    region: Arc<RegionClient>,
    clock: Arc<dyn ClockPort>,
    occupancy: Occupancy,
    navigator_locks: DashMap<NavigatorId, Arc<Mutex<()>>>,
}

impl Coordinator {
    pub fn new(
        positions: Arc<PositionStore>,
        lifecycle: Arc<CellLifecycleManager>,
        region: Arc<RegionClient>,
        clock: Arc<dyn ClockPort>,
    ) -> Self {
        Self {
            positions,
            lifecycle,
            region,
            clock,
            occupancy: Occupancy::default(),
            navigator_locks: DashMap::new(),
        }
    }

    /// Where `navigator` stands. An unreadable store reports the origin.
    pub async fn position(&self, navigator: &NavigatorId) -> GridCell {
        match self.positions.read(navigator).await {
            Ok(state) => state.position,
            Err(e) => {
                tracing::warn!(
                    navigator = %navigator,
                    error = %e,
                    "Position unreadable, assuming origin"
                );
                GridCell::ORIGIN
            }
        }
    }

    /// Describe the navigator's current cell.
    ///
    /// An unreadable store describes the origin, but the navigator is not recorded as standing
    /// there.
    pub async fn look(&self, navigator: &NavigatorId) -> Narration {
        let lock = self.lock_for(navigator);
        let narration = {
            let _guard = lock.lock().await;
            self.look_locked(navigator).await
        };
        drop(lock);
        self.prune_lock(navigator);
        narration
    }

    async fn look_locked(&self, navigator: &NavigatorId) -> Narration {
        let cell = match self.positions.read(navigator).await {
            Ok(state) => {
                self.occupancy
                    .arrive(navigator, state.position, self.clock.now());
                state.position
            }
            Err(e) => {
                tracing::warn!(
                    navigator = %navigator,
                    error = %e,
                    "Position unreadable, describing origin"
                );
                GridCell::ORIGIN
            }
        };

        let description = self.describe(cell).await;
        tracing::debug!(
            navigator = %navigator,
            cell = %cell,
            source = description.source.as_str(),
            "Look"
        );
        Narration::look(cell, description)
    }

    /// Move one cell in `direction` from the stored position.
    ///
    /// Unlike `look`, this refuses to guess: a relative move from an unknown position could
    /// land the navigator anywhere.
    pub async fn step(
        &self,
        navigator: &NavigatorId,
        direction: Direction,
    ) -> Result<Narration, CoordinatorError> {
        let lock = self.lock_for(navigator);
        let result = {
            let _guard = lock.lock().await;
            self.step_locked(navigator, direction).await
        };
        drop(lock);
        self.prune_lock(navigator);
        result
    }

    async fn step_locked(
        &self,
        navigator: &NavigatorId,
        direction: Direction,
    ) -> Result<Narration, CoordinatorError> {
        let state = self.positions.read(navigator).await.map_err(|source| {
            CoordinatorError::PositionUnavailable {
                navigator: navigator.clone(),
                source,
            }
        })?;
        let target = state.position.step(direction).ok_or_else(|| {
            DomainError::validation(format!(
                "Cannot go {} from {}: edge of the world",
                direction, state.position
            ))
        })?;

        self.travel(navigator, Some(state.position), target).await
    }

    /// Move straight to `target`.
    pub async fn move_to(
        &self,
        navigator: &NavigatorId,
        target: GridCell,
    ) -> Result<Narration, CoordinatorError> {
        let lock = self.lock_for(navigator);
        let result = {
            let _guard = lock.lock().await;
            self.move_to_locked(navigator, target).await
        };
        drop(lock);
        self.prune_lock(navigator);
        result
    }

    async fn move_to_locked(
        &self,
        navigator: &NavigatorId,
        target: GridCell,
    ) -> Result<Narration, CoordinatorError> {
        let previous = match self.positions.read(navigator).await {
            Ok(state) => Some(state.position),
            Err(e) => {
                tracing::warn!(
                    navigator = %navigator,
                    error = %e,
                    "Previous position unreadable, nothing will be retired"
                );
                None
            }
        };
        self.travel(navigator, previous, target).await
    }

    async fn travel(
        &self,
        navigator: &NavigatorId,
        previous: Option<GridCell>,
        target: GridCell,
    ) -> Result<Narration, CoordinatorError> {
        // 1. Ensure and describe the destination before touching the origin
        let description = self.describe(target).await;

        // 2. Persist the new position
        if let Err(source) = self.positions.write(navigator, target).await {
            let occupied = self
                .occupancy
                .occupied_by_other(navigator, target, self.clock.now());
            if previous != Some(target) && !occupied {
                self.lifecycle.retire(target).await;
            }
            return Err(CoordinatorError::PositionUnavailable {
                navigator: navigator.clone(),
                source,
            });
        }
        self.occupancy.arrive(navigator, target, self.clock.now());

        // 3. Retire the origin unless someone else is still there
        if let Some(previous) = previous.filter(|previous| *previous != target) {
            if self
                .occupancy
                .occupied_by_other(navigator, previous, self.clock.now())
            {
                tracing::debug!(cell = %previous, "Origin still occupied, keeping its worker");
            } else {
                self.lifecycle.retire(previous).await;
            }
        }

        tracing::info!(
            navigator = %navigator,
            from = ?previous,
            to = %target,
            source = description.source.as_str(),
            "Navigator moved"
        );
        Ok(Narration::arrival(target, description))
    }

    /// Ensure the cell's worker and ask it for a description, degrading on any failure.
    async fn describe(&self, cell: GridCell) -> Description {
        let ensured = match self.lifecycle.ensure(cell).await {
            Ok(ensured) => ensured,
            Err(e) => return self.region.fallback(cell, e.to_string()).await,
        };

        let description = self.region.describe(&ensured.endpoint, cell).await;
        let live = description
            .descriptor
            .as_ref()
            .filter(|_| description.is_live());
        if let Some(descriptor) = live {
            let cached = match self.positions.cached_terrain(cell).await {
                Ok(cached) => cached,
                Err(e) => {
                    tracing::warn!(cell = %cell, error = %e, "Terrain cache unreadable");
                    None
                }
            };
            if cached.as_ref() != Some(descriptor) {
                if let Err(e) = self.positions.cache_terrain(cell, descriptor).await {
                    tracing::warn!(cell = %cell, error = %e, "Failed to cache terrain");
                }
            }
        }
        description
    }

    fn lock_for(&self, navigator: &NavigatorId) -> Arc<Mutex<()>> {
        self.navigator_locks
            .entry(navigator.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the navigator's lock entry once nobody else holds or waits on it.
    fn prune_lock(&self, navigator: &NavigatorId) {
        self.navigator_locks
            .remove_if(navigator, |_, lock| Arc::strong_count(lock) == 1);
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.navigator_locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::kv::MemoryKvStore;
    use crate::infrastructure::ports::{
        ClusterControllerPort, ControllerError, KeyValueStorePort, MockKeyValueStorePort,
        MockRegionRpcPort, RpcError, StoreError, WorkerEndpoint, WorkerSpec,
    };
    use crate::use_cases::lifecycle::LifecycleConfig;
    use crate::use_cases::region_client::DEFAULT_DESCRIBE_TIMEOUT;
    use async_trait::async_trait;
    use driftscape_domain::{BaseTerrain, TerrainDescriptor};
    use driftscape_shared::{DescribeResponse, DescriptionSource};
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Controller that remembers what is running and what was deleted.
    #[derive(Default)]
    struct RecordingController {
        running: Mutex<HashSet<GridCell>>,
        deleted: Mutex<Vec<GridCell>>,
        refuse_creates: bool,
    }

    impl RecordingController {
        fn running(&self) -> HashSet<GridCell> {
            self.running.lock().unwrap().clone()
        }

        fn deleted(&self) -> Vec<GridCell> {
            self.deleted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ClusterControllerPort for RecordingController {
        async fn create_worker(
            &self,
            spec: &WorkerSpec,
        ) -> Result<WorkerEndpoint, ControllerError> {
            if self.refuse_creates {
                return Err(ControllerError::Unavailable("quota exceeded".to_string()));
            }
            self.running.lock().unwrap().insert(spec.cell);
            Ok(WorkerEndpoint::new(spec.name.clone(), "http://worker.local"))
        }

        async fn delete_worker(&self, cell: GridCell) -> Result<(), ControllerError> {
            self.running.lock().unwrap().remove(&cell);
            self.deleted.lock().unwrap().push(cell);
            Ok(())
        }

        async fn worker_exists(&self, cell: GridCell) -> Result<bool, ControllerError> {
            Ok(self.running.lock().unwrap().contains(&cell))
        }
    }

    /// Worlds answered by the mock RPC: (0,0) is plains, (0,1) a river, everything else hills.
    fn terrain_at(x: i64, y: i64) -> &'static str {
        match (x, y) {
            (0, 0) => "plains",
            (0, 1) => "river",
            _ => "hills",
        }
    }

    fn world_rpc(unreachable: Arc<Mutex<HashSet<GridCell>>>) -> MockRegionRpcPort {
        let mut rpc = MockRegionRpcPort::new();
        rpc.expect_describe().returning(move |endpoint, request| {
            let cell = GridCell::new(request.x, request.y);
            if unreachable.lock().unwrap().contains(&cell) {
                return Err(RpcError::Connect {
                    endpoint: endpoint.address.clone(),
                    message: "connection refused".to_string(),
                });
            }
            Ok(DescribeResponse {
                terrain: terrain_at(request.x, request.y).to_string(),
            })
        });
        rpc
    }

    struct Harness {
        coordinator: Coordinator,
        controller: Arc<RecordingController>,
        positions: Arc<PositionStore>,
        unreachable: Arc<Mutex<HashSet<GridCell>>>,
    }

    fn harness_with(kv: Arc<dyn KeyValueStorePort>, controller: RecordingController) -> Harness {
        let clock = Arc::new(SystemClock::new());
        let positions = Arc::new(PositionStore::new(kv, clock.clone()));
        let controller = Arc::new(controller);
        let unreachable = Arc::new(Mutex::new(HashSet::new()));
        let lifecycle = Arc::new(CellLifecycleManager::new(
            controller.clone(),
            clock.clone(),
            LifecycleConfig::default(),
        ));
        let region = Arc::new(RegionClient::new(
            Arc::new(world_rpc(unreachable.clone())),
            positions.clone(),
            DEFAULT_DESCRIBE_TIMEOUT,
        ));
        Harness {
            coordinator: Coordinator::new(positions.clone(), lifecycle, region, clock),
            controller,
            positions,
            unreachable,
        }
    }

    fn harness() -> Harness {
        harness_with(Arc::new(MemoryKvStore::new()), RecordingController::default())
    }

    fn broken_store() -> MockKeyValueStorePort {
        let mut kv = MockKeyValueStorePort::new();
        kv.expect_get()
            .returning(|_| Err(StoreError::backend("get", "connection reset")));
        kv.expect_set()
            .returning(|_, _| Err(StoreError::backend("set", "connection reset")));
        kv
    }

    /// Memory store whose navigator reads can fail or lag behind.
    #[derive(Default)]
    struct ScriptedStore {
        inner: MemoryKvStore,
        unreadable: HashSet<String>,
        navigator_read_delay: Option<Duration>,
    }

    #[async_trait]
    impl KeyValueStorePort for ScriptedStore {
        async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            if self.unreadable.contains(key) {
                return Err(StoreError::backend("get", "connection reset"));
            }
            let value = self.inner.get(key).await?;
            if let Some(delay) = self.navigator_read_delay.filter(|_| key.starts_with("navigator:"))
            {
                tokio::time::sleep(delay).await;
            }
            Ok(value)
        }

        async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set(key, value).await
        }

        async fn delete(&self, key: &str) -> Result<(), StoreError> {
            self.inner.delete(key).await
        }
    }

    fn navigator(id: &str) -> NavigatorId {
        id.parse().unwrap()
    }

    #[tokio::test]
    async fn look_move_and_fall_back_to_cached_description() {
        let h = harness();
        let nav = NavigatorId::default();

        let look = h.coordinator.look(&nav).await;
        assert_eq!(look.text, "You're in a plains at (0,0)");
        assert_eq!(look.source, DescriptionSource::Live);

        let north = h.coordinator.step(&nav, Direction::North).await.unwrap();
        assert_eq!(north.text, "You moved to a river at (0,1)");
        assert_eq!(h.controller.deleted(), vec![GridCell::ORIGIN]);
        assert_eq!(h.controller.running(), HashSet::from([GridCell::new(0, 1)]));

        h.unreachable.lock().unwrap().insert(GridCell::ORIGIN);
        let south = h.coordinator.step(&nav, Direction::South).await.unwrap();
        assert_eq!(south.text, "You moved to a plains at (0,0)");
        assert_eq!(south.source, DescriptionSource::Cached);
        assert_eq!(h.coordinator.position(&nav).await, GridCell::ORIGIN);
    }

    #[tokio::test]
    async fn live_description_is_cached() {
        let h = harness();
        h.coordinator.look(&NavigatorId::default()).await;

        let cached = h.positions.cached_terrain(GridCell::ORIGIN).await.unwrap();
        assert_eq!(cached, Some(TerrainDescriptor::new(BaseTerrain::Plains, None)));
    }

    #[tokio::test]
    async fn unknown_cell_without_worker_gets_placeholder() {
        let h = harness_with(
            Arc::new(MemoryKvStore::new()),
            RecordingController {
                refuse_creates: true,
                ..Default::default()
            },
        );
        let nav = NavigatorId::default();

        let narration = h.coordinator.move_to(&nav, GridCell::new(4, -4)).await.unwrap();

        assert_eq!(narration.text, "You moved to a mist-shrouded land at (4,-4)");
        assert_eq!(narration.source, DescriptionSource::Placeholder);
        assert_eq!(h.coordinator.position(&nav).await, GridCell::new(4, -4));
    }

    #[tokio::test]
    async fn step_with_unreadable_position_changes_nothing() {
        let h = harness_with(Arc::new(broken_store()), RecordingController::default());

        let err = h
            .coordinator
            .step(&NavigatorId::default(), Direction::East)
            .await
            .unwrap_err();

        assert!(matches!(err, CoordinatorError::PositionUnavailable { .. }));
        assert!(!err.is_client_error());
        assert!(h.controller.running().is_empty());
        assert!(h.controller.deleted().is_empty());
    }

    #[tokio::test]
    async fn look_with_unreadable_store_assumes_origin() {
        let h = harness_with(Arc::new(broken_store()), RecordingController::default());

        let narration = h.coordinator.look(&NavigatorId::default()).await;

        assert_eq!(narration.text, "You're in a plains at (0,0)");
        assert_eq!(narration.source, DescriptionSource::Live);
    }

    #[tokio::test]
    async fn failed_position_write_rolls_back_destination_worker() {
        let h = harness_with(Arc::new(broken_store()), RecordingController::default());

        let err = h
            .coordinator
            .move_to(&NavigatorId::default(), GridCell::new(2, 2))
            .await
            .unwrap_err();

        assert!(matches!(err, CoordinatorError::PositionUnavailable { .. }));
        assert!(h.controller.running().is_empty());
    }

    #[tokio::test]
    async fn occupied_origin_keeps_its_worker() {
        let h = harness();
        let ada = navigator("ada");
        let bo = navigator("bo");
        h.coordinator.look(&ada).await;
        h.coordinator.look(&bo).await;

        h.coordinator.step(&ada, Direction::North).await.unwrap();
        assert!(h.controller.deleted().is_empty());

        h.coordinator.step(&bo, Direction::North).await.unwrap();
        assert_eq!(h.controller.deleted(), vec![GridCell::ORIGIN]);
        assert_eq!(h.controller.running(), HashSet::from([GridCell::new(0, 1)]));
    }

    #[tokio::test]
    async fn moving_to_current_cell_retires_nothing() {
        let h = harness();
        let nav = NavigatorId::default();

        h.coordinator.move_to(&nav, GridCell::ORIGIN).await.unwrap();
        h.coordinator.move_to(&nav, GridCell::ORIGIN).await.unwrap();

        assert!(h.controller.deleted().is_empty());
        assert_eq!(h.controller.running(), HashSet::from([GridCell::ORIGIN]));
    }

    #[tokio::test]
    async fn step_off_the_edge_is_rejected() {
        let h = harness();
        let nav = NavigatorId::default();
        h.coordinator
            .move_to(&nav, GridCell::new(0, i64::MAX))
            .await
            .unwrap();

        let err = h.coordinator.step(&nav, Direction::North).await.unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(
            h.coordinator.position(&nav).await,
            GridCell::new(0, i64::MAX)
        );
    }

    #[tokio::test]
    async fn unreadable_look_does_not_pin_the_origin() {
        let store = ScriptedStore {
            unreadable: HashSet::from(["navigator:ada".to_string()]),
            ..Default::default()
        };
        let h = harness_with(Arc::new(store), RecordingController::default());
        let ada = navigator("ada");
        let bo = navigator("bo");

        h.coordinator.look(&bo).await;
        let narration = h.coordinator.look(&ada).await;
        assert_eq!(narration.cell, GridCell::ORIGIN);

        h.coordinator.step(&bo, Direction::North).await.unwrap();

        assert_eq!(h.controller.deleted(), vec![GridCell::ORIGIN]);
        assert_eq!(h.controller.running(), HashSet::from([GridCell::new(0, 1)]));
    }

    #[tokio::test]
    async fn look_waits_for_a_move_by_the_same_navigator() {
        let store = ScriptedStore {
            navigator_read_delay: Some(Duration::from_millis(30)),
            ..Default::default()
        };
        let h = harness_with(Arc::new(store), RecordingController::default());
        let nav = NavigatorId::default();
        h.coordinator.look(&nav).await;

        let (moved, looked) = tokio::join!(
            h.coordinator.step(&nav, Direction::North),
            h.coordinator.look(&nav)
        );

        assert_eq!(moved.unwrap().cell, GridCell::new(0, 1));
        assert_eq!(looked.cell, GridCell::new(0, 1));
        assert_eq!(h.controller.running(), HashSet::from([GridCell::new(0, 1)]));
        assert_eq!(h.coordinator.tracked_locks(), 0);
    }
}
