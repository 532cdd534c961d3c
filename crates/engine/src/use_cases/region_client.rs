//! Coordinator-side stub for region workers.
//!
//! One bounded call per request, no retries. Any failure turns into a fallback built from the
//! terrain cache, so a slow or missing worker degrades the answer instead of failing it.

use std::sync::Arc;
use std::time::Duration;

use driftscape_domain::{GridCell, TerrainDescriptor};
use driftscape_shared::{DescribeRequest, DescriptionSource};

use crate::entities::PositionStore;
use crate::infrastructure::ports::{RegionRpcPort, RpcError, WorkerEndpoint};

/// Terrain text used when a cell has never been described.
pub const PLACEHOLDER_TERRAIN: &str = "mist-shrouded land";

pub const DEFAULT_DESCRIBE_TIMEOUT: Duration = Duration::from_millis(5000);

/// A cell description as served to a navigator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    /// Text to narrate, e.g. `hills with a waterfall`
    pub terrain: String,
    /// Typed descriptor; `None` only for placeholders
    pub descriptor: Option<TerrainDescriptor>,
    pub source: DescriptionSource,
    /// Why the worker's answer is missing, for degraded descriptions
    pub failure: Option<String>,
}

impl Description {
    pub fn live(descriptor: TerrainDescriptor) -> Self {
        Self {
            terrain: descriptor.rendered.clone(),
            descriptor: Some(descriptor),
            source: DescriptionSource::Live,
            failure: None,
        }
    }

    pub fn cached(descriptor: TerrainDescriptor, failure: impl Into<String>) -> Self {
        Self {
            terrain: descriptor.rendered.clone(),
            descriptor: Some(descriptor),
            source: DescriptionSource::Cached,
            failure: Some(failure.into()),
        }
    }

    pub fn placeholder(failure: impl Into<String>) -> Self {
        Self {
            terrain: PLACEHOLDER_TERRAIN.to_string(),
            descriptor: None,
            source: DescriptionSource::Placeholder,
            failure: Some(failure.into()),
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == DescriptionSource::Live
    }
}

pub struct RegionClient {
    rpc: Arc<dyn RegionRpcPort>,
    positions: Arc<PositionStore>,
    timeout: Duration,
}

impl RegionClient {
    pub fn new(
        rpc: Arc<dyn RegionRpcPort>,
        positions: Arc<PositionStore>,
        timeout: Duration,
    ) -> Self {
        Self {
            rpc,
            positions,
            timeout,
        }
    }

    /// Ask `endpoint` to describe `cell`, falling back to the cache on any failure.
    pub async fn describe(&self, endpoint: &WorkerEndpoint, cell: GridCell) -> Description {
        match self.call(endpoint, cell).await {
            Ok(descriptor) => Description::live(descriptor),
            Err(e) => {
                tracing::warn!(
                    cell = %cell,
                    worker = %endpoint.worker_name,
                    error = %e,
                    "Region worker unavailable, serving fallback"
                );
                self.fallback(cell, e.to_string()).await
            }
        }
    }

    /// Best description available without a worker: the cached descriptor, else a placeholder.
    pub async fn fallback(&self, cell: GridCell, failure: impl Into<String>) -> Description {
        let failure = failure.into();
        match self.positions.cached_terrain(cell).await {
            Ok(Some(descriptor)) => Description::cached(descriptor, failure),
            Ok(None) => Description::placeholder(failure),
            Err(e) => {
                tracing::warn!(cell = %cell, error = %e, "Terrain cache unreadable");
                Description::placeholder(failure)
            }
        }
    }

    async fn call(
        &self,
        endpoint: &WorkerEndpoint,
        cell: GridCell,
    ) -> Result<TerrainDescriptor, RpcError> {
        let request = DescribeRequest {
            x: cell.x,
            y: cell.y,
        };
        let response = tokio::time::timeout(self.timeout, self.rpc.describe(endpoint, request))
            .await
            .map_err(|_| RpcError::Timeout {
                endpoint: endpoint.address.clone(),
                timeout_ms: self.timeout.as_millis() as u64,
            })??;

        response
            .terrain
            .parse::<TerrainDescriptor>()
            .map_err(|e| RpcError::InvalidResponse {
                endpoint: endpoint.address.clone(),
                message: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::clock::SystemClock;
    use crate::infrastructure::kv::MemoryKvStore;
    use crate::infrastructure::ports::MockRegionRpcPort;
    use async_trait::async_trait;
    use driftscape_domain::{BaseTerrain, Feature, WorkerName};
    use driftscape_shared::DescribeResponse;

    fn positions() -> Arc<PositionStore> {
        Arc::new(PositionStore::new(
            Arc::new(MemoryKvStore::new()),
            Arc::new(SystemClock::new()),
        ))
    }

    fn endpoint(cell: GridCell) -> WorkerEndpoint {
        WorkerEndpoint::new(WorkerName::for_cell(cell), "http://127.0.0.1:9")
    }

    fn failing_rpc() -> MockRegionRpcPort {
        let mut rpc = MockRegionRpcPort::new();
        rpc.expect_describe().times(1).returning(|endpoint, _| {
            Err(RpcError::Connect {
                endpoint: endpoint.address.clone(),
                message: "connection refused".to_string(),
            })
        });
        rpc
    }

    #[tokio::test]
    async fn live_answer_is_parsed() {
        let cell = GridCell::new(1, 2);
        let mut rpc = MockRegionRpcPort::new();
        rpc.expect_describe()
            .withf(|_, request| request.x == 1 && request.y == 2)
            .times(1)
            .returning(|_, _| {
                Ok(DescribeResponse {
                    terrain: "hills with a waterfall".to_string(),
                })
            });
        let client = RegionClient::new(Arc::new(rpc), positions(), DEFAULT_DESCRIBE_TIMEOUT);

        let description = client.describe(&endpoint(cell), cell).await;

        assert!(description.is_live());
        assert_eq!(
            description.descriptor,
            Some(TerrainDescriptor::new(
                BaseTerrain::Hills,
                Some(Feature::Waterfall)
            ))
        );
        assert_eq!(description.failure, None);
    }

    #[tokio::test]
    async fn failure_serves_cached_descriptor() {
        let cell = GridCell::ORIGIN;
        let positions = positions();
        let plains = TerrainDescriptor::new(BaseTerrain::Plains, None);
        positions.cache_terrain(cell, &plains).await.unwrap();
        let client =
            RegionClient::new(Arc::new(failing_rpc()), positions, DEFAULT_DESCRIBE_TIMEOUT);

        let description = client.describe(&endpoint(cell), cell).await;

        assert_eq!(description.source, DescriptionSource::Cached);
        assert_eq!(description.terrain, "plains");
        assert!(description
            .failure
            .as_deref()
            .is_some_and(|f| f.contains("connection refused")));
    }

    #[tokio::test]
    async fn failure_without_cache_serves_placeholder() {
        let cell = GridCell::new(-7, 7);
        let client =
            RegionClient::new(Arc::new(failing_rpc()), positions(), DEFAULT_DESCRIBE_TIMEOUT);

        let description = client.describe(&endpoint(cell), cell).await;

        assert_eq!(description.source, DescriptionSource::Placeholder);
        assert_eq!(description.terrain, PLACEHOLDER_TERRAIN);
        assert_eq!(description.descriptor, None);
    }

    #[tokio::test]
    async fn unreadable_answer_falls_back() {
        let cell = GridCell::new(3, 0);
        let mut rpc = MockRegionRpcPort::new();
        rpc.expect_describe().returning(|_, _| {
            Ok(DescribeResponse {
                terrain: "lava".to_string(),
            })
        });
        let client = RegionClient::new(Arc::new(rpc), positions(), DEFAULT_DESCRIBE_TIMEOUT);

        let description = client.describe(&endpoint(cell), cell).await;

        assert_eq!(description.source, DescriptionSource::Placeholder);
    }

    struct StalledRpc;

    #[async_trait]
    impl RegionRpcPort for StalledRpc {
        async fn describe(
            &self,
            _endpoint: &WorkerEndpoint,
            _request: DescribeRequest,
        ) -> Result<DescribeResponse, RpcError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(DescribeResponse {
                terrain: "forest".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn stalled_worker_is_cut_off_at_timeout() {
        let cell = GridCell::ORIGIN;
        let positions = positions();
        let swamp = TerrainDescriptor::new(BaseTerrain::Swamp, Some(Feature::Cave));
        positions.cache_terrain(cell, &swamp).await.unwrap();
        let client = RegionClient::new(Arc::new(StalledRpc), positions, Duration::from_millis(50));

        let started = std::time::Instant::now();
        let description = client.describe(&endpoint(cell), cell).await;

        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(description.source, DescriptionSource::Cached);
        assert_eq!(description.terrain, "swamp with a cave");
        assert!(description
            .failure
            .as_deref()
            .is_some_and(|f| f.contains("50ms")));
    }
}
