//! Stock resolution engine.
//!
//! Determines quantity on hand per (product, location) from the latest
//! physical count plus the movements recorded after it, and consolidates those
//! figures across locations. Everything here is deterministic domain logic
//! over caller-supplied records (no IO, no clock reads: `now` is a parameter).

pub mod config;
pub mod consolidation;
pub mod dataset;
pub mod method;
pub mod quantity;
pub mod recount;
pub mod records;
pub mod resolver;
pub mod timestamp;

pub use config::{CoveragePolicy, DEFAULT_FRESHNESS_WINDOW_HOURS, RecountPolicy, ResolverConfig};
pub use consolidation::{ConsolidatedStock, LocationStock, consolidate};
pub use dataset::{StockDataset, StockIndex};
pub use method::StockMethod;
pub use recount::{RecountStatus, requires_recount};
pub use records::{
    BaselineSnapshot, CountDetail, CountStatus, Location, Movement, MovementDetail,
    MovementStatus, PhysicalCount, Product,
};
pub use resolver::{ResolvedStock, StockResolver, resolve};
