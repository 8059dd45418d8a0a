//! Whether a (product, location) pair is due for a new physical count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallystock_core::{LocationId, ProductId};

use crate::config::{CoveragePolicy, RecountPolicy, ResolverConfig};
use crate::dataset::StockDataset;
use crate::method::StockMethod;
use crate::resolver::StockResolver;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecountStatus {
    /// No eligible count has a counted row for the product.
    NeverCounted,
    Overdue { age_days: i64 },
    UpToDate { age_days: i64 },
}

impl RecountStatus {
    pub fn is_due(self) -> bool {
        !matches!(self, RecountStatus::UpToDate { .. })
    }
}

impl StockResolver<'_> {
    /// Only rows actually flagged as counted make a count cover the product.
    pub fn recount_status(
        &self,
        product_id: &ProductId,
        location_id: &LocationId,
        now: DateTime<Utc>,
        policy: &RecountPolicy,
    ) -> RecountStatus {
        let resolved = self.resolve(product_id, location_id, CoveragePolicy::CountedOnly, now);
        match (resolved.method, resolved.age_days) {
            (StockMethod::NoCount, _) | (_, None) => RecountStatus::NeverCounted,
            (_, Some(age_days)) if age_days > policy.max_count_age_days() => {
                RecountStatus::Overdue { age_days }
            }
            (_, Some(age_days)) => RecountStatus::UpToDate { age_days },
        }
    }
}

/// One-shot recount check; builds a fresh index over `dataset`.
pub fn requires_recount(
    product_id: &ProductId,
    location_id: &LocationId,
    dataset: &StockDataset,
    now: DateTime<Utc>,
    policy: &RecountPolicy,
) -> RecountStatus {
    StockResolver::new(dataset, ResolverConfig::default()).recount_status(product_id, location_id, now, policy)
}
