//! Per-(product, location) stock resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallystock_core::{LocationId, ProductId, ValueObject};

use crate::config::{CoveragePolicy, ResolverConfig};
use crate::dataset::{StockDataset, StockIndex};
use crate::method::StockMethod;
use crate::records::CountDetail;

/// Stock on hand for one (product, location) pair at a given instant.
///
/// Figures are `i128` so sums of `i64` record quantities cannot overflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStock {
    pub quantity: i128,
    pub method: StockMethod,
    /// Effective date of the winning count; `None` for `no_count`.
    pub reference_date: Option<DateTime<Utc>>,
    /// Whole days between `reference_date` and `now`; `None` for `no_count`.
    pub age_days: Option<i64>,
    /// Units received after the count (only for `computed`).
    pub inbound: i128,
    /// Units sent after the count (only for `computed`).
    pub outbound: i128,
}

impl ValueObject for ResolvedStock {}

impl ResolvedStock {
    fn without_count(quantity: i128) -> Self {
        Self {
            quantity,
            method: StockMethod::NoCount,
            reference_date: None,
            age_days: None,
            inbound: 0,
            outbound: 0,
        }
    }
}

/// Resolves stock against one indexed dataset.
///
/// The index is built once in [`StockResolver::new`]; every resolve call after
/// that only reads it, so a resolver can be shared across threads.
#[derive(Debug)]
pub struct StockResolver<'a> {
    index: StockIndex<'a>,
    config: ResolverConfig,
}

impl<'a> StockResolver<'a> {
    pub fn new(dataset: &'a StockDataset, config: ResolverConfig) -> Self {
        Self {
            index: StockIndex::build(dataset),
            config,
        }
    }

    pub fn index(&self) -> &StockIndex<'a> {
        &self.index
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Quantity on hand for `product_id` at `location_id` as of `now`.
    ///
    /// 1. Latest eligible count at the location that covers the product under
    ///    `coverage`; none means the baseline snapshot (or 0).
    /// 2. Inside the freshness window the counted quantity is returned as-is.
    /// 3. Otherwise movements dated strictly after the count are applied.
    pub fn resolve(
        &self,
        product_id: &ProductId,
        location_id: &LocationId,
        coverage: CoveragePolicy,
        now: DateTime<Utc>,
    ) -> ResolvedStock {
        let resolved = match self.latest_covering_count(product_id, location_id, coverage) {
            None => ResolvedStock::without_count(i128::from(
                self.index.baseline(product_id, location_id).unwrap_or(0),
            )),
            Some((detail, counted_at)) => {
                self.resolve_from_count(product_id, location_id, detail, counted_at, now)
            }
        };

        tracing::trace!(
            tenant_id = %self.index.tenant_id(),
            product_id = %product_id,
            location_id = %location_id,
            method = %resolved.method,
            quantity = resolved.quantity,
            "resolved stock"
        );

        resolved
    }

    fn resolve_from_count(
        &self,
        product_id: &ProductId,
        location_id: &LocationId,
        detail: &CountDetail,
        counted_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> ResolvedStock {
        let base = i128::from(detail.base_quantity());
        let age = now - counted_at;

        if age < self.config.freshness_window() {
            return ResolvedStock {
                quantity: base,
                method: StockMethod::RecentCount,
                reference_date: Some(counted_at),
                age_days: Some(age.num_days()),
                inbound: 0,
                outbound: 0,
            };
        }

        let (inbound, outbound) = self.movement_totals(product_id, location_id, counted_at);

        ResolvedStock {
            quantity: base + inbound - outbound,
            method: StockMethod::Computed,
            reference_date: Some(counted_at),
            age_days: Some(age.num_days()),
            inbound,
            outbound,
        }
    }

    /// Newest eligible count at the location with a covering detail row.
    fn latest_covering_count(
        &self,
        product_id: &ProductId,
        location_id: &LocationId,
        coverage: CoveragePolicy,
    ) -> Option<(&'a CountDetail, DateTime<Utc>)> {
        self.index.counts_at(location_id).iter().find_map(|dated| {
            self.index
                .count_details(&dated.count.id, product_id)
                .iter()
                .find(|detail| coverage.covers(detail))
                .map(|detail| (*detail, dated.at))
        })
    }

    /// Sums every detail row of every eligible movement after `after`.
    /// Repeated rows for one (movement, product) are all counted.
    fn movement_totals(
        &self,
        product_id: &ProductId,
        location_id: &LocationId,
        after: DateTime<Utc>,
    ) -> (i128, i128) {
        let mut inbound = 0i128;
        let mut outbound = 0i128;

        for dated in self.index.movements_after(after) {
            let movement = dated.movement;
            for detail in self.index.movement_details(&movement.id, product_id) {
                if &movement.destination_id == location_id {
                    inbound += i128::from(detail.received());
                }
                if &movement.origin_id == location_id {
                    outbound += i128::from(detail.sent());
                }
            }
        }

        (inbound, outbound)
    }
}

/// One-shot resolution; builds a fresh index over `dataset`.
///
/// Prefer a shared [`StockResolver`] when resolving many pairs.
pub fn resolve(
    product_id: &ProductId,
    location_id: &LocationId,
    dataset: &StockDataset,
    now: DateTime<Utc>,
    coverage: CoveragePolicy,
    config: &ResolverConfig,
) -> ResolvedStock {
    StockResolver::new(dataset, *config).resolve(product_id, location_id, coverage, now)
}
