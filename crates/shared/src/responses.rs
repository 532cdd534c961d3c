//! Coordinator response vocabulary.

use serde::{Deserialize, Serialize};

/// Where a description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionSource {
    /// Answered by the cell's worker within the timeout
    Live,
    /// Worker unreachable, served from the terrain cache
    Cached,
    /// Worker unreachable and nothing cached
    Placeholder,
}

impl DescriptionSource {
    pub fn as_str(self) -> &'static str {
        match self {
            DescriptionSource::Live => "live",
            DescriptionSource::Cached => "cached",
            DescriptionSource::Placeholder => "placeholder",
        }
    }

    pub fn is_degraded(self) -> bool {
        !matches!(self, DescriptionSource::Live)
    }
}

/// `GET /position` body is the plain `x,y` string; this is its structured form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionResponse {
    pub x: i64,
    pub y: i64,
}
