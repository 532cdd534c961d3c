//! DriftScape region worker - serves one cell's terrain.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftscape_engine::{
    config::{load_dotenv_from_repo_root, RegionWorkerConfig},
    entities::PositionStore,
    infrastructure::{
        clock::SystemClock,
        kv::{MemoryKvStore, SqliteKvStore},
        ports::{ClockPort, KeyValueStorePort},
    },
    region::{http as region_http, RegionWorker},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv_from_repo_root();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftscape_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RegionWorkerConfig::from_env()?;
    tracing::info!(cell = %config.cell, "Starting DriftScape region worker");

    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
    let store: Arc<dyn KeyValueStorePort> = match &config.kv_database_path {
        Some(path) => Arc::new(SqliteKvStore::new(path, clock.clone()).await?),
        None => {
            tracing::warn!("KV_DATABASE_PATH not set, terrain cache is private to this worker");
            Arc::new(MemoryKvStore::new())
        }
    };
    let positions = Arc::new(PositionStore::new(store, clock));
    let worker = Arc::new(RegionWorker::new(config.cell, positions));

    let addr: SocketAddr = config.bind_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    region_http::serve(listener, worker, shutdown).await?;
    tracing::info!(cell = %config.cell, "Region worker stopped");
    Ok(())
}
