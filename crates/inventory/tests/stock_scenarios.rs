//! End-to-end resolution scenarios over a wire-format dataset.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use tallystock_core::{LocationId, ProductId, TenantId};
use tallystock_inventory::{
    ConsolidatedStock, CoveragePolicy, ResolverConfig, StockDataset, StockMethod, StockResolver,
    consolidate, resolve,
};

fn now() -> DateTime<Utc> {
    "2024-06-15T12:00:00Z".parse().unwrap()
}

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

fn pid(raw: &str) -> ProductId {
    raw.parse().unwrap()
}

fn lid(raw: &str) -> LocationId {
    raw.parse().unwrap()
}

/// Two locations, two products:
/// - P1@L1: counted 25 three days ago, 5 sent to L2 one day ago
/// - P1@L2: never counted, baseline 15
/// - P2@L2: never counted, baseline 7
/// - P1@L3: counted 10 two hours ago, 4 received one hour ago
fn dataset() -> StockDataset {
    let raw = json!({
        "tenant_id": TenantId::new(),
        "products": [
            {"id": "P1", "stock_minimo": 40},
            {"id": "P2", "stock_minimo": 0}
        ],
        "locations": [{"id": "L1"}, {"id": "L2"}, {"id": "L3"}],
        "baselines": [
            {"product_id": "P1", "location_id": "L2", "quantity": 15},
            {"product_id": "P2", "location_id": "L2", "quantity": 7}
        ],
        "counts": [
            {
                "id": "c1",
                "location_id": "L1",
                "estado": "completed",
                "fecha_programada": ts(now() - Duration::days(4)),
                "fecha_completado": ts(now() - Duration::days(3))
            },
            {
                "id": "c2",
                "location_id": "L3",
                "estado": "completed",
                "fecha_programada": ts(now() - Duration::hours(5)),
                "fecha_completado": ts(now() - Duration::hours(2))
            }
        ],
        "count_details": [
            {"conteo_id": "c1", "producto_id": "P1", "cantidad_fisica": 25, "cantidad_sistema": 22, "contado": true},
            {"conteo_id": "c2", "producto_id": "P1", "cantidad_fisica": 10, "contado": true}
        ],
        "movements": [
            {
                "id": "m1",
                "origen_id": "L1",
                "destino_id": "L9",
                "estado": "completed",
                "fecha_creacion": ts(now() - Duration::days(2)),
                "fecha_confirmacion": ts(now() - Duration::days(1))
            },
            {
                "id": "m2",
                "origen_id": "L8",
                "destino_id": "L3",
                "estado": "completed",
                "fecha_creacion": ts(now() - Duration::hours(90)),
                "fecha_confirmacion": ts(now() - Duration::hours(1))
            }
        ],
        "movement_details": [
            {"movimiento_id": "m1", "producto_id": "P1", "cantidad_enviada": 5, "cantidad_recibida": 5},
            {"movimiento_id": "m2", "producto_id": "P1", "cantidad_enviada": 4, "cantidad_recibida": 4}
        ]
    });
    serde_json::from_value(raw).unwrap()
}

fn resolve_any(dataset: &StockDataset, product: &str, location: &str) -> tallystock_inventory::ResolvedStock {
    resolve(
        &pid(product),
        &lid(location),
        dataset,
        now(),
        CoveragePolicy::AnyDetail,
        &ResolverConfig::default(),
    )
}

#[test]
fn old_count_is_adjusted_by_later_movements() {
    let resolved = resolve_any(&dataset(), "P1", "L1");
    assert_eq!(resolved.method, StockMethod::Computed);
    assert_eq!(resolved.quantity, 20);
    assert_eq!(resolved.outbound, 5);
    assert_eq!(resolved.reference_date, Some(now() - Duration::days(3)));
    assert_eq!(resolved.age_days, Some(3));
}

#[test]
fn fresh_count_ignores_later_movements() {
    let resolved = resolve_any(&dataset(), "P1", "L3");
    assert_eq!(resolved.method, StockMethod::RecentCount);
    assert_eq!(resolved.quantity, 10);
    assert_eq!(resolved.age_days, Some(0));
}

#[test]
fn uncounted_pair_uses_baseline() {
    let resolved = resolve_any(&dataset(), "P2", "L2");
    assert_eq!(resolved.method, StockMethod::NoCount);
    assert_eq!(resolved.quantity, 7);
    assert_eq!(resolved.reference_date, None);
    assert_eq!(resolved.age_days, None);
}

#[test]
fn consolidation_sums_locations_and_picks_best_method() {
    let dataset = dataset();
    let rows = consolidate(
        &[pid("P1")],
        &[lid("L1"), lid("L2")],
        &dataset,
        now(),
        &ResolverConfig::default(),
    );

    assert_eq!(rows.len(), 1);
    let row: &ConsolidatedStock = &rows[0];
    assert_eq!(row.total_units, 35);
    assert_eq!(row.method, StockMethod::Computed);
    assert_eq!(row.reference_date, Some(now() - Duration::days(3)));

    assert_eq!(row.breakdown.len(), 2);
    assert_eq!(row.breakdown[0].location_id, lid("L1"));
    assert_eq!(row.breakdown[0].stock, resolve_any(&dataset, "P1", "L1"));
    assert_eq!(row.breakdown[1].location_id, lid("L2"));
    assert_eq!(row.breakdown[1].stock.quantity, 15);
    assert_eq!(row.breakdown[1].stock.method, StockMethod::NoCount);

    assert!(row.is_below_minimum());
}

#[test]
fn consolidation_output_is_sparse() {
    let rows = consolidate(
        &[pid("P1"), pid("P2")],
        &[lid("L1"), lid("L3")],
        &dataset(),
        now(),
        &ResolverConfig::default(),
    );

    let products: Vec<_> = rows.iter().map(|r| r.product_id.as_str()).collect();
    assert_eq!(products, vec!["P1"]);
    assert_eq!(rows[0].method, StockMethod::RecentCount);
    assert_eq!(rows[0].total_units, 30);
}

#[test]
fn consolidation_agrees_with_resolve_when_reference_lists_are_incomplete() {
    let mut partial = dataset();
    partial.locations.retain(|l| l.id.as_str() != "L3");
    let mut bare = dataset();
    bare.products.clear();
    bare.locations.clear();

    let products = [pid("P1"), pid("P2")];
    let locations = [lid("L1"), lid("L2"), lid("L3")];

    for dataset in [&partial, &bare] {
        let rows = consolidate(&products, &locations, dataset, now(), &ResolverConfig::default());
        assert_eq!(rows.len(), 2);

        for row in &rows {
            let expected: i128 = locations
                .iter()
                .map(|l| resolve_any(dataset, row.product_id.as_str(), l.as_str()).quantity)
                .sum();
            assert_eq!(row.total_units, expected);
            assert_eq!(row.breakdown.len(), locations.len());
        }
        assert_eq!(rows[0].total_units, 45);
    }

    let bare_rows = consolidate(&products, &locations, &bare, now(), &ResolverConfig::default());
    assert_eq!(bare_rows[0].minimum_stock, 0);
    assert!(!bare_rows[0].is_below_minimum());
}

#[test]
fn resolution_is_repeatable() {
    let dataset = dataset();
    let resolver = StockResolver::new(&dataset, ResolverConfig::default());
    let products = [pid("P1"), pid("P2")];
    let locations = [lid("L1"), lid("L2"), lid("L3")];

    let first = resolver.consolidate(&products, &locations, now());
    let second = resolver.consolidate(&products, &locations, now());
    assert_eq!(first, second);
}

#[test]
fn pairs_resolve_in_parallel_against_shared_resolver() {
    tallystock_observability::init();

    let dataset = dataset();
    let resolver = StockResolver::new(&dataset, ResolverConfig::default());
    let pairs = [("P1", "L1"), ("P1", "L2"), ("P1", "L3"), ("P2", "L2")];

    let parallel: Vec<i128> = std::thread::scope(|scope| {
        let handles: Vec<_> = pairs
            .iter()
            .map(|(product, location)| {
                let resolver = &resolver;
                scope.spawn(move || {
                    resolver
                        .resolve(&pid(product), &lid(location), CoveragePolicy::AnyDetail, now())
                        .quantity
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(parallel, vec![20, 15, 10, 7]);
}
