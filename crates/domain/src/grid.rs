//! Grid coordinates and compass movement.
//!
//! The world is an unbounded integer plane. North increases `y`, east increases `x`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One unit of the world, identified purely by its coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    pub x: i64,
    pub y: i64,
}

impl GridCell {
    pub const ORIGIN: GridCell = GridCell { x: 0, y: 0 };

    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// The neighbouring cell one step in `direction`, or `None` at the edge of `i64`.
    pub fn step(self, direction: Direction) -> Option<GridCell> {
        let (dx, dy) = direction.offset();
        Some(GridCell {
            x: self.x.checked_add(dx)?,
            y: self.y.checked_add(dy)?,
        })
    }

    /// The cell directly south, used by the border-consistency check.
    pub fn south(self) -> Option<GridCell> {
        self.step(Direction::South)
    }

    /// Parse a pair of raw query values (`?x=..&y=..`).
    pub fn parse_pair(x: &str, y: &str) -> Result<Self, DomainError> {
        let x = x
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::validation(format!("Bad x: {:?}", x)))?;
        let y = y
            .trim()
            .parse::<i64>()
            .map_err(|_| DomainError::validation(format!("Bad y: {:?}", y)))?;
        Ok(Self { x, y })
    }

    /// Canonical `x,y` form used in store keys and the `/position` response.
    pub fn to_pair_string(self) -> String {
        format!("{},{}", self.x, self.y)
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl FromStr for GridCell {
    type Err = DomainError;

    /// Accepts `x,y` with or without surrounding parentheses.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let inner = s
            .trim()
            .trim_start_matches('(')
            .trim_end_matches(')');
        let (x, y) = inner
            .split_once(',')
            .ok_or_else(|| DomainError::parse(format!("Invalid grid cell: {}", s)))?;
        Self::parse_pair(x, y).map_err(|_| DomainError::parse(format!("Invalid grid cell: {}", s)))
    }
}

/// Compass direction for a single navigator step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// `(dx, dy)` for one step.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::North => (0, 1),
            Direction::South => (0, -1),
            Direction::East => (1, 0),
            Direction::West => (-1, 0),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::North => write!(f, "north"),
            Direction::South => write!(f, "south"),
            Direction::East => write!(f, "east"),
            Direction::West => write!(f, "west"),
        }
    }
}

impl FromStr for Direction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            _ => Err(DomainError::validation(format!(
                "Which way? Use: north, south, east, west (got {:?})",
                s
            ))),
        }
    }
}
