//! Resource-identifier-safe labels for grid coordinates.
//!
//! Cluster resource names and labels may not contain a literal minus sign, so a coordinate is
//! carried as a sign tag plus magnitude: `7` stays `7`, `-7` becomes `n7`. Zero is always
//! non-negative, which keeps the encoding injective (`n0` is never produced and never accepted).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::grid::GridCell;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    NonNegative,
    Negative,
}

/// One coordinate encoded for use inside a resource identifier.
///
/// Serialized as its text form, so deserializing goes through the same checks as `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellLabel {
    sign: Sign,
    magnitude: u64,
}

impl CellLabel {
    const NEGATIVE_PREFIX: char = 'n';

    pub fn from_coordinate(value: i64) -> Self {
        if value < 0 {
            Self {
                sign: Sign::Negative,
                magnitude: value.unsigned_abs(),
            }
        } else {
            Self {
                sign: Sign::NonNegative,
                magnitude: value.unsigned_abs(),
            }
        }
    }

    pub fn sign(&self) -> Sign {
        self.sign
    }

    pub fn magnitude(&self) -> u64 {
        self.magnitude
    }

    /// Decode back to the coordinate. Total for every label this type can hold.
    pub fn to_coordinate(self) -> i64 {
        match self.sign {
            Sign::NonNegative => self.magnitude as i64,
            // `0 - magnitude` in i128 covers i64::MIN, whose magnitude exceeds i64::MAX.
            Sign::Negative => (-(self.magnitude as i128)) as i64,
        }
    }
}

impl fmt::Display for CellLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sign {
            Sign::NonNegative => write!(f, "{}", self.magnitude),
            Sign::Negative => write!(f, "{}{}", Self::NEGATIVE_PREFIX, self.magnitude),
        }
    }
}

impl FromStr for CellLabel {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (sign, digits) = match s.strip_prefix(Self::NEGATIVE_PREFIX) {
            Some(rest) => (Sign::Negative, rest),
            None => (Sign::NonNegative, s),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::parse(format!("Invalid cell label: {:?}", s)));
        }
        if digits.len() > 1 && digits.starts_with('0') {
            return Err(DomainError::parse(format!(
                "Cell label has leading zeros: {:?}",
                s
            )));
        }

        let magnitude: u64 = digits
            .parse()
            .map_err(|_| DomainError::parse(format!("Cell label out of range: {:?}", s)))?;

        let in_range = match sign {
            Sign::NonNegative => magnitude <= i64::MAX as u64,
            Sign::Negative => magnitude != 0 && magnitude <= i64::MIN.unsigned_abs(),
        };
        if !in_range {
            return Err(DomainError::parse(format!("Cell label out of range: {:?}", s)));
        }

        Ok(Self { sign, magnitude })
    }
}

/// Name shared by every cluster resource belonging to one cell's worker.
///
/// Format: `region-{xLabel}-{yLabel}`, e.g. `region-2-n4` for `(2,-4)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerName(String);

impl WorkerName {
    const PREFIX: &'static str = "region-";

    pub fn for_cell(cell: GridCell) -> Self {
        Self(format!(
            "{}{}-{}",
            Self::PREFIX,
            CellLabel::from_coordinate(cell.x),
            CellLabel::from_coordinate(cell.y)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Recover the cell a worker name was built from.
    pub fn cell(&self) -> Result<GridCell, DomainError> {
        parse_worker_name(&self.0)
    }

    /// `(x, y)` labels, as attached to the worker's compute unit and network endpoint.
    pub fn labels(cell: GridCell) -> (CellLabel, CellLabel) {
        (
            CellLabel::from_coordinate(cell.x),
            CellLabel::from_coordinate(cell.y),
        )
    }
}

fn parse_worker_name(raw: &str) -> Result<GridCell, DomainError> {
    let rest = raw
        .strip_prefix(WorkerName::PREFIX)
        .ok_or_else(|| DomainError::parse(format!("Not a region worker name: {}", raw)))?;
    let (x, y) = rest
        .split_once('-')
        .ok_or_else(|| DomainError::parse(format!("Not a region worker name: {}", raw)))?;
    let x: CellLabel = x.parse()?;
    let y: CellLabel = y.parse()?;
    Ok(GridCell::new(x.to_coordinate(), y.to_coordinate()))
}

impl fmt::Display for WorkerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for WorkerName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cell = parse_worker_name(s)?;
        let canonical = WorkerName::for_cell(cell);
        if canonical.0 != s {
            return Err(DomainError::parse(format!("Non-canonical worker name: {}", s)));
        }
        Ok(canonical)
    }
}

impl TryFrom<String> for CellLabel {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CellLabel> for String {
    fn from(value: CellLabel) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for WorkerName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkerName> for String {
    fn from(value: WorkerName) -> Self {
        value.0
    }
}
