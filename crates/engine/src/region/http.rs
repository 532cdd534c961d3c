//! Region worker HTTP routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use driftscape_domain::GridCell;
use driftscape_shared::{DescribeRequest, DescribeResponse, WorkerErrorBody, DESCRIBE_PATH};

use super::worker::{RegionWorker, WorkerError};

pub fn routes(worker: Arc<RegionWorker>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(DESCRIBE_PATH, post(describe))
        .with_state(worker)
}

/// Serve `worker` on `listener` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    worker: Arc<RegionWorker>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let router = routes(worker).layer(TraceLayer::new_for_http());
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

async fn health() -> &'static str {
    "OK"
}

async fn describe(
    State(worker): State<Arc<RegionWorker>>,
    Json(request): Json<DescribeRequest>,
) -> Result<Json<DescribeResponse>, (StatusCode, Json<WorkerErrorBody>)> {
    let requested = GridCell::new(request.x, request.y);
    match worker.describe(requested).await {
        Ok(descriptor) => Ok(Json(DescribeResponse {
            terrain: descriptor.rendered,
        })),
        Err(e @ WorkerError::CellMismatch { .. }) => Err((
            StatusCode::BAD_REQUEST,
            Json(WorkerErrorBody {
                error: e.to_string(),
            }),
        )),
    }
}
