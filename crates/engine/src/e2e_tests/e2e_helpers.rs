//! Shared setup for end-to-end tests.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::Router;
use tower::ServiceExt;

use driftscape_domain::GridCell;
use driftscape_shared::NAVIGATOR_ID_HEADER;

use crate::api;
use crate::app::App;
use crate::entities::PositionStore;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::cluster::LocalClusterController;
use crate::infrastructure::kv::MemoryKvStore;
use crate::infrastructure::ports::{
    ClockPort, ClusterControllerPort, ControllerError, WorkerEndpoint, WorkerSpec,
};
use crate::infrastructure::region_rpc::HttpRegionRpc;
use crate::use_cases::lifecycle::LifecycleConfig;

pub struct E2EContext {
    pub app: Arc<App>,
    pub controller: Arc<LocalClusterController>,
    pub positions: Arc<PositionStore>,
    pub router: Router,
}

impl E2EContext {
    pub fn setup() -> Self {
        Self::setup_with_timeout(Duration::from_secs(2))
    }

    pub fn setup_with_timeout(describe_timeout: Duration) -> Self {
        let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let positions = Arc::new(PositionStore::new(
            Arc::new(MemoryKvStore::new()),
            clock.clone(),
        ));
        let controller = Arc::new(LocalClusterController::new(positions.clone()));
        let app = Arc::new(App::new(
            positions.clone(),
            controller.clone(),
            Arc::new(HttpRegionRpc::new()),
            clock,
            LifecycleConfig::default(),
            describe_timeout,
        ));
        let router = api::http::routes().with_state(app.clone());

        Self {
            app,
            controller,
            positions,
            router,
        }
    }

    /// GET `uri` as `navigator`, returning status, source header and body text.
    pub async fn get(&self, navigator: &str, uri: &str) -> TestResponse {
        let request = Request::get(uri)
            .header(NAVIGATOR_ID_HEADER, navigator)
            .body(Body::empty())
            .expect("request should build");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status().as_u16();
        let source = response
            .headers()
            .get(driftscape_shared::DESCRIPTION_SOURCE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        TestResponse {
            status,
            source,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

impl Drop for E2EContext {
    fn drop(&mut self) {
        self.controller.shutdown_all();
    }
}

#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub source: Option<String>,
    pub body: String,
}

/// Controller whose workers all live at an address nothing listens on.
struct UnreachableController;

#[async_trait]
impl ClusterControllerPort for UnreachableController {
    async fn create_worker(&self, spec: &WorkerSpec) -> Result<WorkerEndpoint, ControllerError> {
        Ok(WorkerEndpoint::new(spec.name.clone(), "http://127.0.0.1:1"))
    }

    async fn delete_worker(&self, _cell: GridCell) -> Result<(), ControllerError> {
        Ok(())
    }

    async fn worker_exists(&self, _cell: GridCell) -> Result<bool, ControllerError> {
        Ok(true)
    }
}

/// An app sharing `positions` whose workers can never be reached.
pub fn unreachable_workers_app(
    positions: Arc<PositionStore>,
    describe_timeout: Duration,
) -> Arc<App> {
    Arc::new(App::new(
        positions,
        Arc::new(UnreachableController),
        Arc::new(HttpRegionRpc::new()),
        Arc::new(SystemClock::new()),
        LifecycleConfig::default(),
        describe_timeout,
    ))
}
