//! Use cases - request orchestration.
//!
//! - `lifecycle` decides when region workers are created, reused or retired
//! - `region_client` asks workers for descriptions, with bounded-time fallback
//! - `navigation` drives `look` and `move` across the two

pub mod lifecycle;
pub mod navigation;
pub mod region_client;

pub use lifecycle::CellLifecycleManager;
pub use navigation::Coordinator;
pub use region_client::RegionClient;
