//! API layer - navigator-facing HTTP entry points.

pub mod http;
