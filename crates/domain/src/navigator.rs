//! Navigator identity and position state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::grid::GridCell;

/// Identifies one navigator session. Safe to embed in store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NavigatorId(String);

impl NavigatorId {
    pub const DEFAULT: &'static str = "default";
    const MAX_LEN: usize = 64;

    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(DomainError::validation("navigator id cannot be empty"));
        }
        if raw.len() > Self::MAX_LEN {
            return Err(DomainError::validation(format!(
                "navigator id longer than {} characters",
                Self::MAX_LEN
            )));
        }
        if !raw
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(DomainError::validation(format!(
                "navigator id may only contain letters, digits, '-' and '_': {:?}",
                raw
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for NavigatorId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for NavigatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NavigatorId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.trim())
    }
}

impl TryFrom<String> for NavigatorId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NavigatorId> for String {
    fn from(value: NavigatorId) -> Self {
        value.0
    }
}

/// Where a navigator stands and when they last moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigatorState {
    pub position: GridCell,
    pub last_move_at: Option<DateTime<Utc>>,
}

impl NavigatorState {
    /// A navigator nobody has moved yet starts at the origin.
    pub fn initial() -> Self {
        Self {
            position: GridCell::ORIGIN,
            last_move_at: None,
        }
    }

    pub fn moved_to(position: GridCell, at: DateTime<Utc>) -> Self {
        Self {
            position,
            last_move_at: Some(at),
        }
    }
}

impl Default for NavigatorState {
    fn default() -> Self {
        Self::initial()
    }
}
