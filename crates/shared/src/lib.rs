//! DriftScape Protocol - wire types shared by the coordinator, region workers and navigators.
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - only serde
//! 2. **No business logic** - pure data types and serialization
//! 3. **No domain types** - coordinates travel as raw integers, terrain as rendered text

pub mod messages;
pub mod requests;
pub mod responses;

pub use messages::{DescribeRequest, DescribeResponse, WorkerErrorBody};
pub use requests::MoveQuery;
pub use responses::{DescriptionSource, PositionResponse};

/// Header carrying the navigator identifier on coordinator requests.
pub const NAVIGATOR_ID_HEADER: &str = "x-navigator-id";

/// Header set on degraded coordinator responses (`cached` or `placeholder`).
pub const DESCRIPTION_SOURCE_HEADER: &str = "x-driftscape-source";

/// Path of the region worker's description endpoint.
pub const DESCRIBE_PATH: &str = "/describe";
