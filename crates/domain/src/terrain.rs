//! Terrain descriptors and their human-readable rendering.
//!
//! A descriptor renders to text such as `plains` or `hills with a waterfall`, and that text
//! parses back into the same descriptor. The rendered string is what travels over the region
//! RPC and what sits in the terrain cache.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Base terrain of a cell. Order matters: the generator indexes into `ALL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseTerrain {
    Forest,
    Plains,
    Hills,
    Swamp,
    Coast,
    River,
}

impl BaseTerrain {
    pub const ALL: [BaseTerrain; 6] = [
        BaseTerrain::Forest,
        BaseTerrain::Plains,
        BaseTerrain::Hills,
        BaseTerrain::Swamp,
        BaseTerrain::Coast,
        BaseTerrain::River,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BaseTerrain::Forest => "forest",
            BaseTerrain::Plains => "plains",
            BaseTerrain::Hills => "hills",
            BaseTerrain::Swamp => "swamp",
            BaseTerrain::Coast => "coast",
            BaseTerrain::River => "river",
        }
    }
}

impl fmt::Display for BaseTerrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BaseTerrain {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BaseTerrain::ALL
            .into_iter()
            .find(|base| base.name() == s.trim().to_lowercase())
            .ok_or_else(|| DomainError::parse(format!("Unknown base terrain: {}", s)))
    }
}

/// Optional landmark layered on top of the base terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Cave,
    Ruins,
    Waterfall,
    /// Continues a river already narrated by the southward neighbour.
    RiverContinuation,
}

impl Feature {
    const ALL: [Feature; 4] = [
        Feature::Cave,
        Feature::Ruins,
        Feature::Waterfall,
        Feature::RiverContinuation,
    ];

    pub fn phrase(self) -> &'static str {
        match self {
            Feature::Cave => "with a cave",
            Feature::Ruins => "with ancient ruins",
            Feature::Waterfall => "with a waterfall",
            Feature::RiverContinuation => "with a river flowing south",
        }
    }

    /// Features that belong to a watercourse and so must agree with a neighbouring river.
    pub fn is_river_related(self) -> bool {
        matches!(self, Feature::Waterfall | Feature::RiverContinuation)
    }
}

/// Everything a navigator is told about one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerrainDescriptor {
    pub base: BaseTerrain,
    pub feature: Option<Feature>,
    pub rendered: String,
}

impl TerrainDescriptor {
    pub fn new(base: BaseTerrain, feature: Option<Feature>) -> Self {
        let rendered = match feature {
            Some(feature) => format!("{} {}", base.name(), feature.phrase()),
            None => base.name().to_string(),
        };
        Self {
            base,
            feature,
            rendered,
        }
    }

    /// Whether this cell narrates a river a northern neighbour should continue.
    pub fn mentions_river(&self) -> bool {
        self.rendered.contains("river")
    }
}

impl fmt::Display for TerrainDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

impl FromStr for TerrainDescriptor {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (base, rest) = match trimmed.split_once(' ') {
            Some((base, rest)) => (base, Some(rest.trim())),
            None => (trimmed, None),
        };
        let base: BaseTerrain = base.parse()?;
        let feature = match rest {
            None => None,
            Some(phrase) => Some(
                Feature::ALL
                    .into_iter()
                    .find(|feature| feature.phrase() == phrase)
                    .ok_or_else(|| {
                        DomainError::parse(format!("Unknown terrain feature: {}", phrase))
                    })?,
            ),
        };
        Ok(Self::new(base, feature))
    }
}
