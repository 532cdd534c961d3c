//! DriftScape coordinator - main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftscape_engine::{
    api,
    config::{load_dotenv_from_repo_root, CoordinatorConfig},
    entities::PositionStore,
    infrastructure::{
        clock::SystemClock,
        cluster::LocalClusterController,
        kv::{MemoryKvStore, SqliteKvStore},
        ports::{ClockPort, KeyValueStorePort},
        region_rpc::HttpRegionRpc,
    },
    App,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment from repo root.
    load_dotenv_from_repo_root();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftscape_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting DriftScape coordinator");

    let config = CoordinatorConfig::from_env();
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());

    let store: Arc<dyn KeyValueStorePort> = match &config.kv_database_path {
        Some(path) => {
            tracing::info!(path = %path, "Using SQLite key-value store");
            Arc::new(SqliteKvStore::new(path, clock.clone()).await?)
        }
        None => {
            tracing::info!("KV_DATABASE_PATH not set, using in-memory key-value store");
            Arc::new(MemoryKvStore::new())
        }
    };
    let positions = Arc::new(PositionStore::new(store, clock.clone()));

    let controller = Arc::new(LocalClusterController::new(positions.clone()));
    tracing::info!(
        image = %config.lifecycle.image,
        max_replicas = config.lifecycle.scaling.max_replicas,
        describe_timeout_ms = config.describe_timeout.as_millis() as u64,
        "Region workers will be scheduled in-process"
    );

    let app = Arc::new(App::new(
        positions,
        controller.clone(),
        Arc::new(HttpRegionRpc::new()),
        clock,
        config.lifecycle.clone(),
        config.describe_timeout,
    ));

    let router = api::http::routes()
        .with_state(app)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = config.bind_addr().parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    controller.shutdown_all();
    tracing::info!("Coordinator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
