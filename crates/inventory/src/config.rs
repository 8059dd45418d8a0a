//! Resolver configuration.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use tallystock_core::{DomainError, DomainResult};

use crate::records::CountDetail;

/// Default freshness window: counts younger than this are trusted outright.
pub const DEFAULT_FRESHNESS_WINDOW_HOURS: u32 = 24;

/// Default maximum age of a counted product before a recount is due.
pub const DEFAULT_MAX_COUNT_AGE_DAYS: u32 = 30;

pub const FRESHNESS_WINDOW_ENV: &str = "TALLYSTOCK_FRESHNESS_WINDOW_HOURS";
pub const MAX_COUNT_AGE_ENV: &str = "TALLYSTOCK_MAX_COUNT_AGE_DAYS";

/// Which detail rows make a count "cover" a product.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveragePolicy {
    /// Any detail row for the product counts (stock display, consolidation).
    #[default]
    AnyDetail,
    /// Only detail rows flagged as actually counted (recount scheduling).
    CountedOnly,
}

impl CoveragePolicy {
    pub fn covers(self, detail: &CountDetail) -> bool {
        match self {
            CoveragePolicy::AnyDetail => true,
            CoveragePolicy::CountedOnly => detail.counted,
        }
    }
}

/// Tunables for stock resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    freshness_window: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            freshness_window: Duration::hours(i64::from(DEFAULT_FRESHNESS_WINDOW_HOURS)),
        }
    }
}

impl ResolverConfig {
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    pub fn freshness_window(&self) -> Duration {
        self.freshness_window
    }

    /// Load from process environment, keeping defaults for unset keys.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test fixtures, ...).
    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(hours) = parse_u32(&lookup, FRESHNESS_WINDOW_ENV)? {
            config.freshness_window = Duration::hours(i64::from(hours));
        }
        Ok(config)
    }
}

/// Tunables for the recount check.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecountPolicy {
    max_count_age_days: i64,
}

impl Default for RecountPolicy {
    fn default() -> Self {
        Self {
            max_count_age_days: i64::from(DEFAULT_MAX_COUNT_AGE_DAYS),
        }
    }
}

impl RecountPolicy {
    pub fn with_max_count_age_days(mut self, days: u32) -> Self {
        self.max_count_age_days = i64::from(days);
        self
    }

    pub fn max_count_age_days(&self) -> i64 {
        self.max_count_age_days
    }

    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> DomainResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut policy = Self::default();
        if let Some(days) = parse_u32(&lookup, MAX_COUNT_AGE_ENV)? {
            policy.max_count_age_days = i64::from(days);
        }
        Ok(policy)
    }
}

fn parse_u32<F>(lookup: &F, key: &str) -> DomainResult<Option<u32>>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim().parse::<u32>().map(Some).map_err(|_| {
        DomainError::validation(format!("{key} must be a non-negative integer, got {raw:?}"))
    })
}
