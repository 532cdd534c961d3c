//! Region description RPC between the coordinator and a region worker.

use serde::{Deserialize, Serialize};

/// `POST /describe` body: the cell the caller wants described.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeRequest {
    pub x: i64,
    pub y: i64,
}

/// Successful describe response: rendered terrain such as `"plains with a cave"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub terrain: String,
}

/// Error body returned by a worker for a rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerErrorBody {
    pub error: String,
}
