//! Cross-location aggregation of resolved stock.

use std::collections::HashSet;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallystock_core::{LocationId, ProductId, ValueObject};

use crate::config::{CoveragePolicy, ResolverConfig};
use crate::dataset::StockDataset;
use crate::method::{StockMethod, outranks};
use crate::resolver::{ResolvedStock, StockResolver};

/// One location's share of a consolidated row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationStock {
    pub location_id: LocationId,
    #[serde(flatten)]
    pub stock: ResolvedStock,
}

/// Stock for one product summed across the requested locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidatedStock {
    pub product_id: ProductId,
    pub total_units: i128,
    /// Representative method: highest priority across locations, newest on ties.
    pub method: StockMethod,
    pub reference_date: Option<DateTime<Utc>>,
    pub age_days: Option<i64>,
    pub minimum_stock: i64,
    /// In the order the locations were requested.
    pub breakdown: Vec<LocationStock>,
}

impl ValueObject for ConsolidatedStock {}

impl ConsolidatedStock {
    pub fn is_below_minimum(&self) -> bool {
        self.total_units < i128::from(self.minimum_stock)
    }
}

impl StockResolver<'_> {
    /// Resolve every requested product at every requested location (any-detail
    /// coverage) and fold the results per product.
    ///
    /// Requested ids are resolved whether or not the dataset lists them, so
    /// totals always equal the sum of [`StockResolver::resolve`]. Repeated ids
    /// are resolved once. A product with no record at any requested location
    /// yields no row.
    pub fn consolidate(
        &self,
        product_ids: &[ProductId],
        location_ids: &[LocationId],
        now: DateTime<Utc>,
    ) -> Vec<ConsolidatedStock> {
        let locations = distinct(location_ids);
        let mut rows = Vec::new();

        for product_id in distinct(product_ids) {
            if !locations.iter().any(|l| self.index().has_record(product_id, l)) {
                continue;
            }

            let breakdown: Vec<LocationStock> = locations
                .iter()
                .map(|location_id| LocationStock {
                    location_id: (*location_id).clone(),
                    stock: self.resolve(product_id, location_id, CoveragePolicy::AnyDetail, now),
                })
                .collect();

            let minimum_stock = match self.index().product(product_id) {
                Some(product) => product.minimum_stock,
                None => {
                    tracing::debug!(product_id = %product_id, "product not listed; minimum stock 0");
                    0
                }
            };

            rows.push(fold(product_id, minimum_stock, breakdown));
        }

        tracing::debug!(
            tenant_id = %self.index().tenant_id(),
            products = product_ids.len(),
            locations = locations.len(),
            rows = rows.len(),
            "consolidated stock"
        );

        rows
    }

    /// Consolidated rows whose total is under the product's minimum.
    pub fn low_stock(
        &self,
        product_ids: &[ProductId],
        location_ids: &[LocationId],
        now: DateTime<Utc>,
    ) -> Vec<ConsolidatedStock> {
        self.consolidate(product_ids, location_ids, now)
            .into_iter()
            .filter(ConsolidatedStock::is_below_minimum)
            .collect()
    }
}

/// First occurrence of each id, in request order.
fn distinct<T: Eq + Hash>(ids: &[T]) -> Vec<&T> {
    let mut seen = HashSet::new();
    ids.iter().filter(|id| seen.insert(*id)).collect()
}

fn fold(product_id: &ProductId, minimum_stock: i64, breakdown: Vec<LocationStock>) -> ConsolidatedStock {
    let total_units: i128 = breakdown.iter().map(|entry| entry.stock.quantity).sum();

    let mut representative: Option<&ResolvedStock> = None;
    for entry in &breakdown {
        let candidate = &entry.stock;
        representative = match representative {
            Some(current)
                if !outranks(
                    (candidate.method, candidate.reference_date),
                    (current.method, current.reference_date),
                ) =>
            {
                Some(current)
            }
            _ => Some(candidate),
        };
    }

    let (method, reference_date, age_days) = representative
        .map(|r| (r.method, r.reference_date, r.age_days))
        .unwrap_or((StockMethod::NoCount, None, None));

    ConsolidatedStock {
        product_id: product_id.clone(),
        total_units,
        method,
        reference_date,
        age_days,
        minimum_stock,
        breakdown,
    }
}

/// One-shot consolidation; builds a fresh index over `dataset`.
pub fn consolidate(
    product_ids: &[ProductId],
    location_ids: &[LocationId],
    dataset: &StockDataset,
    now: DateTime<Utc>,
    config: &ResolverConfig,
) -> Vec<ConsolidatedStock> {
    StockResolver::new(dataset, *config).consolidate(product_ids, location_ids, now)
}
