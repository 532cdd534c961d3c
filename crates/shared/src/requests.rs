//! Navigator-facing query parameters.

use serde::{Deserialize, Serialize};

/// `GET /move` query: either `?direction=north` or `?x=..&y=..`.
///
/// Values stay raw strings so the coordinator can reject malformed input with a readable
/// message instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}
