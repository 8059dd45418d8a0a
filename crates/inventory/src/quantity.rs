//! Ordered quantity fallback and lenient quantity parsing.

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

/// Returns the first present quantity in `layers`, or 0 when every layer is
/// missing.
///
/// Precedence is the iteration order, so callers list layers from most to
/// least authoritative:
/// - counts: physical quantity, then system quantity
/// - movements: received (or sent) quantity, then the generic quantity
pub fn first_present<I>(layers: I) -> i64
where
    I: IntoIterator<Item = Option<i64>>,
{
    layers.into_iter().flatten().next().unwrap_or(0)
}

/// Interpret a JSON-ish number as a whole quantity.
///
/// Finite floats are truncated toward zero; values outside `i64` are missing.
pub fn quantity_from_f64(value: f64) -> Option<i64> {
    // 2^63 is exactly representable; i64::MAX is not.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if !value.is_finite() {
        return None;
    }
    let whole = value.trunc();
    if whole >= -LIMIT && whole < LIMIT {
        Some(whole as i64)
    } else {
        None
    }
}

/// Parse a textual quantity with the same rules as numeric ones.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().and_then(quantity_from_f64))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Int(i64),
    Float(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawQuantity {
    fn into_quantity(self) -> Option<i64> {
        match self {
            RawQuantity::Int(value) => Some(value),
            RawQuantity::Float(value) => quantity_from_f64(value),
            RawQuantity::Text(raw) => parse_quantity(&raw),
            RawQuantity::Other(_) => None,
        }
    }
}

/// `deserialize_with` target for optional quantities; unusable values are `None`.
pub(crate) fn deserialize_lenient<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawQuantity>::deserialize(deserializer)?.and_then(RawQuantity::into_quantity))
}

/// `deserialize_with` target for quantities that default to 0.
pub(crate) fn deserialize_lenient_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_lenient(deserializer)?.unwrap_or(0))
}
