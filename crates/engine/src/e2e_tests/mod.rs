//! End-to-end tests.
//!
//! These drive the coordinator through the full stack:
//! - In-memory key-value store
//! - Local cluster controller (real region worker HTTP servers on loopback)
//! - Real HTTP region RPC client
//!
//! # Running E2E Tests
//!
//! ```bash
//! cargo test -p driftscape-engine --lib e2e_tests
//! ```

mod e2e_helpers;

pub use e2e_helpers::*;
