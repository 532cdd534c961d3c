//! DriftScape Engine library.
//!
//! This crate contains the coordinator and the region worker services.
//!
//! ## Structure
//!
//! - `entities/` - Entity modules over the key-value store
//! - `use_cases/` - Lifecycle, region client and navigation orchestration
//! - `region/` - Terrain generation and the region worker service
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `api/` - Navigator-facing HTTP entry points
//! - `app` - Application composition
//! - `config` - Environment configuration

pub mod api;
pub mod app;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod region;
pub mod use_cases;

/// E2E tests against real worker servers on loopback.
#[cfg(test)]
mod e2e_tests;

pub use app::App;
