//! Typed views over the records supplied by the data-access layer.
//!
//! These carry shape only. Serde names follow the wire format of the external
//! document store; dates are parsed leniently (see [`crate::timestamp`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tallystock_core::{CountId, Entity, LocationId, MovementId, ProductId};

use crate::quantity::{deserialize_lenient as lenient_quantity, deserialize_lenient_or_zero, first_present};
use crate::timestamp::deserialize_lenient;

/// A trackable SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Alert threshold; the engine only reports against it.
    #[serde(rename = "stock_minimo", default, deserialize_with = "deserialize_lenient_or_zero")]
    pub minimum_stock: i64,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A warehouse or point of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Last known stock for a (product, location) pair before any count exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub product_id: ProductId,
    pub location_id: LocationId,
    #[serde(default, deserialize_with = "deserialize_lenient_or_zero")]
    pub quantity: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CountStatus {
    Pending,
    InProgress,
    Completed,
    PartiallyCompleted,
    Cancelled,
    /// Missing or unrecognised status.
    #[default]
    #[serde(other)]
    Unknown,
}

impl CountStatus {
    /// Only finished (fully or partially) counts say anything about stock.
    pub fn is_eligible(self) -> bool {
        matches!(self, CountStatus::Completed | CountStatus::PartiallyCompleted)
    }
}

/// A count event header at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalCount {
    pub id: CountId,
    pub location_id: LocationId,
    #[serde(rename = "estado", default)]
    pub status: CountStatus,
    #[serde(rename = "fecha_programada", default, deserialize_with = "deserialize_lenient")]
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_completado", default, deserialize_with = "deserialize_lenient")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PhysicalCount {
    /// Completion date if present, else scheduled date.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.completed_at.or(self.scheduled_for)
    }
}

impl Entity for PhysicalCount {
    type Id = CountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One product's counted quantity within a [`PhysicalCount`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountDetail {
    #[serde(rename = "conteo_id")]
    pub count_id: CountId,
    #[serde(rename = "producto_id")]
    pub product_id: ProductId,
    #[serde(rename = "cantidad_fisica", default, deserialize_with = "lenient_quantity")]
    pub physical_quantity: Option<i64>,
    #[serde(rename = "cantidad_sistema", default, deserialize_with = "lenient_quantity")]
    pub system_quantity: Option<i64>,
    #[serde(rename = "contado", default)]
    pub counted: bool,
}

impl CountDetail {
    /// Physical quantity, else system quantity, else 0.
    pub fn base_quantity(&self) -> i64 {
        first_present([self.physical_quantity, self.system_quantity])
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementStatus {
    Pending,
    InProcess,
    Partial,
    Completed,
    Cancelled,
    /// Missing or unrecognised status.
    #[default]
    #[serde(other)]
    Unknown,
}

impl MovementStatus {
    /// Dispatched movements count, confirmed or not; pending and cancelled do not.
    pub fn is_eligible(self) -> bool {
        matches!(
            self,
            MovementStatus::Completed | MovementStatus::Partial | MovementStatus::InProcess
        )
    }
}

/// A transfer event header between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,
    #[serde(rename = "origen_id")]
    pub origin_id: LocationId,
    #[serde(rename = "destino_id")]
    pub destination_id: LocationId,
    #[serde(rename = "estado", default)]
    pub status: MovementStatus,
    #[serde(rename = "fecha_creacion", default, deserialize_with = "deserialize_lenient")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "fecha_confirmacion", default, deserialize_with = "deserialize_lenient")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Movement {
    /// Confirmation date if present, else creation date.
    pub fn effective_date(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at.or(self.created_at)
    }
}

impl Entity for Movement {
    type Id = MovementId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// One product's quantity within a [`Movement`].
///
/// A movement may carry several rows for the same product; each is counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDetail {
    #[serde(rename = "movimiento_id")]
    pub movement_id: MovementId,
    #[serde(rename = "producto_id")]
    pub product_id: ProductId,
    #[serde(rename = "cantidad_enviada", default, deserialize_with = "lenient_quantity")]
    pub quantity_sent: Option<i64>,
    #[serde(rename = "cantidad_recibida", default, deserialize_with = "lenient_quantity")]
    pub quantity_received: Option<i64>,
    #[serde(rename = "cantidad", default, deserialize_with = "lenient_quantity")]
    pub quantity: Option<i64>,
}

impl MovementDetail {
    /// Units that arrived at the destination.
    pub fn received(&self) -> i64 {
        first_present([self.quantity_received, self.quantity])
    }

    /// Units that left the origin.
    pub fn sent(&self) -> i64 {
        first_present([self.quantity_sent, self.quantity])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn count_effective_date_prefers_completion() {
        let scheduled = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let completed = Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap();
        let mut count = PhysicalCount {
            id: CountId::new("c1").unwrap(),
            location_id: LocationId::new("L1").unwrap(),
            status: CountStatus::Completed,
            scheduled_for: Some(scheduled),
            completed_at: Some(completed),
        };
        assert_eq!(count.effective_date(), Some(completed));

        count.completed_at = None;
        assert_eq!(count.effective_date(), Some(scheduled));

        count.scheduled_for = None;
        assert_eq!(count.effective_date(), None);
    }

    #[test]
    fn status_eligibility() {
        assert!(CountStatus::Completed.is_eligible());
        assert!(CountStatus::PartiallyCompleted.is_eligible());
        assert!(!CountStatus::InProgress.is_eligible());
        assert!(!CountStatus::Cancelled.is_eligible());
        assert!(!CountStatus::Unknown.is_eligible());

        assert!(MovementStatus::Completed.is_eligible());
        assert!(MovementStatus::Partial.is_eligible());
        assert!(MovementStatus::InProcess.is_eligible());
        assert!(!MovementStatus::Pending.is_eligible());
        assert!(!MovementStatus::Cancelled.is_eligible());
        assert!(!MovementStatus::Unknown.is_eligible());
    }

    #[test]
    fn detail_quantity_fallbacks() {
        let detail = CountDetail {
            count_id: CountId::new("c1").unwrap(),
            product_id: ProductId::new("P1").unwrap(),
            physical_quantity: None,
            system_quantity: Some(12),
            counted: true,
        };
        assert_eq!(detail.base_quantity(), 12);

        let row = MovementDetail {
            movement_id: MovementId::new("m1").unwrap(),
            product_id: ProductId::new("P1").unwrap(),
            quantity_sent: Some(6),
            quantity_received: None,
            quantity: Some(5),
        };
        assert_eq!(row.sent(), 6);
        assert_eq!(row.received(), 5);
    }

    #[test]
    fn deserializes_wire_shapes() {
        let count: PhysicalCount = serde_json::from_str(
            r#"{
                "id": "c1",
                "location_id": "L1",
                "estado": "partially-completed",
                "fecha_programada": "2024-05-01",
                "fecha_completado": "not a date"
            }"#,
        )
        .unwrap();
        assert_eq!(count.status, CountStatus::PartiallyCompleted);
        assert_eq!(count.completed_at, None);
        assert_eq!(
            count.effective_date(),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap())
        );

        let movement: Movement = serde_json::from_str(
            r#"{
                "id": "m1",
                "origen_id": "L1",
                "destino_id": "L2",
                "estado": "in-process",
                "fecha_creacion": 1714521600,
                "fecha_confirmacion": null
            }"#,
        )
        .unwrap();
        assert_eq!(movement.status, MovementStatus::InProcess);
        assert_eq!(movement.effective_date(), None);

        let detail: MovementDetail = serde_json::from_str(
            r#"{"movimiento_id": "m1", "producto_id": "P1", "cantidad": 4}"#,
        )
        .unwrap();
        assert_eq!(detail.received(), 4);
        assert_eq!(detail.sent(), 4);

        let product: Product = serde_json::from_str(r#"{"id": "P1", "stock_minimo": 5}"#).unwrap();
        assert_eq!(product.minimum_stock, 5);
    }

    #[test]
    fn malformed_quantities_degrade_instead_of_failing() {
        let baseline: BaselineSnapshot = serde_json::from_str(
            r#"{"product_id": "P1", "location_id": "L1", "quantity": 2.5}"#,
        )
        .unwrap();
        assert_eq!(baseline.quantity, 2);

        let detail: CountDetail = serde_json::from_str(
            r#"{
                "conteo_id": "c1",
                "producto_id": "P1",
                "cantidad_fisica": {"value": 3},
                "cantidad_sistema": "7",
                "contado": true
            }"#,
        )
        .unwrap();
        assert_eq!(detail.physical_quantity, None);
        assert_eq!(detail.base_quantity(), 7);

        let row: MovementDetail = serde_json::from_str(
            r#"{
                "movimiento_id": "m1",
                "producto_id": "P1",
                "cantidad_enviada": "lots",
                "cantidad_recibida": null,
                "cantidad": 4.0
            }"#,
        )
        .unwrap();
        assert_eq!(row.sent(), 4);
        assert_eq!(row.received(), 4);

        let product: Product =
            serde_json::from_str(r#"{"id": "P1", "stock_minimo": [1, 2]}"#).unwrap();
        assert_eq!(product.minimum_stock, 0);
    }

    #[test]
    fn unknown_or_missing_status_is_ineligible() {
        let movement: Movement = serde_json::from_str(
            r#"{"id": "m1", "origen_id": "L1", "destino_id": "L2", "estado": "archived"}"#,
        )
        .unwrap();
        assert_eq!(movement.status, MovementStatus::Unknown);

        let count: PhysicalCount =
            serde_json::from_str(r#"{"id": "c1", "location_id": "L1"}"#).unwrap();
        assert_eq!(count.status, CountStatus::Unknown);
        assert!(!count.status.is_eligible());
    }
}
