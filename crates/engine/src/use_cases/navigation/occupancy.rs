//! Which navigator stands where, as far as this coordinator has seen.
//!
//! Entries are keyed by client-chosen navigator ids, so the table is bounded: a navigator not
//! seen for `idle_timeout` no longer counts as present, and past `capacity` the least recently
//! seen entries are dropped first.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use driftscape_domain::{GridCell, NavigatorId};

pub const DEFAULT_IDLE_TIMEOUT_MINUTES: i64 = 30;
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Presence {
    cell: GridCell,
    seen_at: DateTime<Utc>,
}

pub struct Occupancy {
    positions: DashMap<NavigatorId, Presence>,
    idle_timeout: Duration,
    capacity: usize,
}

impl Default for Occupancy {
    fn default() -> Self {
        Self::new(
            Duration::minutes(DEFAULT_IDLE_TIMEOUT_MINUTES),
            DEFAULT_CAPACITY,
        )
    }
}

impl Occupancy {
    pub fn new(idle_timeout: Duration, capacity: usize) -> Self {
        Self {
            positions: DashMap::new(),
            idle_timeout,
            capacity: capacity.max(1),
        }
    }

    /// Record that `navigator` is known to stand on `cell` as of `now`.
    pub fn arrive(&self, navigator: &NavigatorId, cell: GridCell, now: DateTime<Utc>) {
        self.positions
            .insert(navigator.clone(), Presence { cell, seen_at: now });
        self.evict(now);
    }

    /// Whether any navigator other than `navigator`, seen recently, stands on `cell`.
    pub fn occupied_by_other(
        &self,
        navigator: &NavigatorId,
        cell: GridCell,
        now: DateTime<Utc>,
    ) -> bool {
        self.positions.iter().any(|entry| {
            entry.key() != navigator
                && entry.value().cell == cell
                && !self.is_idle(entry.value(), now)
        })
    }

    fn is_idle(&self, presence: &Presence, now: DateTime<Utc>) -> bool {
        now - presence.seen_at > self.idle_timeout
    }

    fn evict(&self, now: DateTime<Utc>) {
        self.positions
            .retain(|_, presence| !self.is_idle(presence, now));

        while self.positions.len() > self.capacity {
            let oldest = self
                .positions
                .iter()
                .min_by_key(|entry| entry.value().seen_at)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(navigator) => {
                    self.positions.remove(&navigator);
                }
                None => break,
            }
        }
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.positions.len()
    }
}
