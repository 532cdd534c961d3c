//! Environment configuration for the coordinator and region worker binaries.

use std::str::FromStr;
use std::time::Duration;

use driftscape_domain::GridCell;

use crate::infrastructure::ports::{ResourceLimits, ScalingPolicy, REGION_CONTAINER_PORT};
use crate::use_cases::lifecycle::LifecycleConfig;
use crate::use_cases::region_client::DEFAULT_DESCRIBE_TIMEOUT;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordinatorConfig {
    pub server_host: String,
    pub server_port: u16,
    /// SQLite file for the key-value store; in-memory when unset
    pub kv_database_path: Option<String>,
    pub describe_timeout: Duration,
    pub lifecycle: LifecycleConfig,
}

impl CoordinatorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = LifecycleConfig::default();
        let max_replicas = parse_or(&lookup, "REGION_MAX_REPLICAS", defaults.scaling.max_replicas);
        let target_cpu = parse_or(
            &lookup,
            "REGION_TARGET_CPU_PERCENT",
            defaults.scaling.target_cpu_percent,
        );

        Self {
            server_host: non_empty(&lookup, "SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8080),
            kv_database_path: non_empty(&lookup, "KV_DATABASE_PATH"),
            describe_timeout: Duration::from_millis(parse_or(
                &lookup,
                "DESCRIBE_TIMEOUT_MS",
                DEFAULT_DESCRIBE_TIMEOUT.as_millis() as u64,
            )),
            lifecycle: LifecycleConfig {
                image: non_empty(&lookup, "REGION_IMAGE").unwrap_or(defaults.image),
                resources: ResourceLimits {
                    cpu_millis: parse_or(
                        &lookup,
                        "REGION_CPU_MILLIS",
                        defaults.resources.cpu_millis,
                    ),
                },
                scaling: ScalingPolicy::up_to(max_replicas, target_cpu),
            },
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// A standalone region worker process serving one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionWorkerConfig {
    pub cell: GridCell,
    pub host: String,
    pub port: u16,
    pub kv_database_path: Option<String>,
}

impl RegionWorkerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `REGION_X` and `REGION_Y` are required: a worker without a cell has nothing to serve.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let x = non_empty(&lookup, "REGION_X").ok_or(ConfigError::Missing("REGION_X"))?;
        let y = non_empty(&lookup, "REGION_Y").ok_or(ConfigError::Missing("REGION_Y"))?;
        let cell = GridCell::parse_pair(&x, &y).map_err(|e| ConfigError::Invalid {
            key: "REGION_X/REGION_Y",
            message: e.to_string(),
        })?;

        Ok(Self {
            cell,
            host: non_empty(&lookup, "SERVER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "REGION_PORT", REGION_CONTAINER_PORT),
            kv_database_path: non_empty(&lookup, "KV_DATABASE_PATH"),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match non_empty(lookup, key) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(
                key,
                value = %raw,
                default = %default,
                "Unparseable setting, using default"
            );
            default
        }),
    }
}

/// Load `.env.local` then `.env` from the repository root, if present.
pub fn load_dotenv_from_repo_root() {
    let repo_root = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..");

    // Prefer local overrides.
    for filename in [".env.local", ".env"] {
        let path = repo_root.join(filename);
        if path.exists() {
            let _ = dotenvy::from_path(path);
        }
    }
}
