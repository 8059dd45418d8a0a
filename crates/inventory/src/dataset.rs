//! Working set supplied by the caller, and the lookup index built over it.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallystock_core::{CountId, Entity, LocationId, MovementId, ProductId, TenantId};

use crate::records::{
    BaselineSnapshot, CountDetail, Location, Movement, MovementDetail, PhysicalCount, Product,
};

/// Already-fetched records for one tenant (and whatever date scope the caller
/// chose). The engine never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDataset {
    pub tenant_id: TenantId,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub baselines: Vec<BaselineSnapshot>,
    #[serde(default)]
    pub counts: Vec<PhysicalCount>,
    #[serde(default)]
    pub count_details: Vec<CountDetail>,
    #[serde(default)]
    pub movements: Vec<Movement>,
    #[serde(default)]
    pub movement_details: Vec<MovementDetail>,
}

impl StockDataset {
    pub fn new(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            products: Vec::new(),
            locations: Vec::new(),
            baselines: Vec::new(),
            counts: Vec::new(),
            count_details: Vec::new(),
            movements: Vec::new(),
            movement_details: Vec::new(),
        }
    }
}

/// Read-only lookup tables over a [`StockDataset`].
///
/// Built once and shared by every (product, location) resolution:
/// - eligible counts per location, newest first
/// - eligible movements ordered by effective date, so the post-count scan
///   starts with a binary partition
/// - rows without an effective date are dropped here
#[derive(Debug)]
pub struct StockIndex<'a> {
    tenant_id: TenantId,
    products: HashMap<&'a ProductId, &'a Product>,
    baselines: HashMap<(&'a ProductId, &'a LocationId), i64>,
    counts_by_location: HashMap<&'a LocationId, Vec<DatedCount<'a>>>,
    count_details: HashMap<&'a CountId, HashMap<&'a ProductId, Vec<&'a CountDetail>>>,
    movements: Vec<DatedMovement<'a>>,
    movement_details: HashMap<&'a MovementId, HashMap<&'a ProductId, Vec<&'a MovementDetail>>>,
    records: HashSet<(&'a ProductId, &'a LocationId)>,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct DatedCount<'a> {
    pub count: &'a PhysicalCount,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Copy, Clone)]
pub(crate) struct DatedMovement<'a> {
    pub movement: &'a Movement,
    pub at: DateTime<Utc>,
}

impl<'a> StockIndex<'a> {
    pub fn build(dataset: &'a StockDataset) -> Self {
        // Headers sharing an id: the first one listed wins.
        let products = first_by_id(&dataset.products).map(|p| (p.id(), p)).collect();
        let counts: Vec<&PhysicalCount> = first_by_id(&dataset.counts).collect();
        let movements_listed: Vec<&Movement> = first_by_id(&dataset.movements).collect();

        let mut records = HashSet::new();

        // First snapshot for a pair wins.
        let mut baselines = HashMap::new();
        for b in &dataset.baselines {
            baselines.entry((&b.product_id, &b.location_id)).or_insert(b.quantity);
            records.insert((&b.product_id, &b.location_id));
        }

        let count_locations: HashMap<&CountId, &LocationId> =
            counts.iter().map(|c| (c.id(), &c.location_id)).collect();

        let mut counts_by_location: HashMap<&LocationId, Vec<DatedCount<'a>>> = HashMap::new();
        for &count in counts.iter().filter(|c| c.status.is_eligible()) {
            if let Some(at) = count.effective_date() {
                counts_by_location
                    .entry(&count.location_id)
                    .or_default()
                    .push(DatedCount { count, at });
            }
        }
        // Stable: equal dates keep input order.
        for counts in counts_by_location.values_mut() {
            counts.sort_by(|a, b| b.at.cmp(&a.at));
        }

        let mut count_details: HashMap<&CountId, HashMap<&ProductId, Vec<&CountDetail>>> =
            HashMap::new();
        for detail in &dataset.count_details {
            let Some(location_id) = count_locations.get(&detail.count_id) else {
                continue;
            };
            count_details
                .entry(&detail.count_id)
                .or_default()
                .entry(&detail.product_id)
                .or_default()
                .push(detail);
            records.insert((&detail.product_id, *location_id));
        }

        let movement_ends: HashMap<&MovementId, (&LocationId, &LocationId)> = movements_listed
            .iter()
            .map(|m| (m.id(), (&m.origin_id, &m.destination_id)))
            .collect();

        let mut movements: Vec<DatedMovement<'a>> = movements_listed
            .into_iter()
            .filter(|m| m.status.is_eligible())
            .filter_map(|movement| movement.effective_date().map(|at| DatedMovement { movement, at }))
            .collect();
        movements.sort_by(|a, b| a.at.cmp(&b.at));

        let mut movement_details: HashMap<&MovementId, HashMap<&ProductId, Vec<&MovementDetail>>> =
            HashMap::new();
        for detail in &dataset.movement_details {
            let Some((origin, destination)) = movement_ends.get(&detail.movement_id) else {
                continue;
            };
            movement_details
                .entry(&detail.movement_id)
                .or_default()
                .entry(&detail.product_id)
                .or_default()
                .push(detail);
            records.insert((&detail.product_id, *origin));
            records.insert((&detail.product_id, *destination));
        }

        Self {
            tenant_id: dataset.tenant_id,
            products,
            baselines,
            counts_by_location,
            count_details,
            movements,
            movement_details,
            records,
        }
    }

    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    pub fn product(&self, product_id: &ProductId) -> Option<&'a Product> {
        self.products.get(product_id).copied()
    }

    /// Whether any baseline, count detail or movement detail ties the product
    /// to the location.
    pub fn has_record(&self, product_id: &ProductId, location_id: &LocationId) -> bool {
        self.records.contains(&(product_id, location_id))
    }

    pub fn baseline(&self, product_id: &ProductId, location_id: &LocationId) -> Option<i64> {
        self.baselines.get(&(product_id, location_id)).copied()
    }

    pub(crate) fn counts_at(&self, location_id: &LocationId) -> &[DatedCount<'a>] {
        self.counts_by_location
            .get(location_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub(crate) fn count_details(&self, count_id: &CountId, product_id: &ProductId) -> &[&'a CountDetail] {
        self.count_details
            .get(count_id)
            .and_then(|by_product| by_product.get(product_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Eligible movements with an effective date strictly after `after`.
    pub(crate) fn movements_after(&self, after: DateTime<Utc>) -> &[DatedMovement<'a>] {
        let start = self.movements.partition_point(|m| m.at <= after);
        &self.movements[start..]
    }

    pub(crate) fn movement_details(
        &self,
        movement_id: &MovementId,
        product_id: &ProductId,
    ) -> &[&'a MovementDetail] {
        self.movement_details
            .get(movement_id)
            .and_then(|by_product| by_product.get(product_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

fn first_by_id<E: Entity>(entities: &[E]) -> impl Iterator<Item = &E> {
    let mut seen = HashSet::new();
    entities.iter().filter(move |&e| seen.insert(e.id()))
}
