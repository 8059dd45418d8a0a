//! How a stock figure was obtained, and how methods rank against each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockMethod {
    /// Count inside the freshness window, taken as-is.
    RecentCount,
    /// Older count adjusted by the movements recorded after it.
    Computed,
    /// No covering count; baseline snapshot (or 0).
    NoCount,
}

impl StockMethod {
    /// Higher is more trustworthy.
    pub fn priority(self) -> u8 {
        match self {
            StockMethod::RecentCount => 3,
            StockMethod::Computed => 2,
            StockMethod::NoCount => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StockMethod::RecentCount => "recent_count",
            StockMethod::Computed => "computed",
            StockMethod::NoCount => "no_count",
        }
    }
}

impl core::fmt::Display for StockMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether `candidate` should replace `current` as the representative of a
/// consolidated row: higher priority wins, then the later reference date.
/// Full ties keep `current`, so the first location supplied wins.
pub fn outranks(
    candidate: (StockMethod, Option<DateTime<Utc>>),
    current: (StockMethod, Option<DateTime<Utc>>),
) -> bool {
    (candidate.0.priority(), candidate.1) > (current.0.priority(), current.1)
}
