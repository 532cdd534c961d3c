//! Region worker: deterministic terrain for one grid cell, served over HTTP.

pub mod generator;
pub mod http;
pub mod worker;

pub use worker::{RegionWorker, WorkerError};
