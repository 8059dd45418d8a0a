//! Value object trait: equality by value, not identity.

/// Marker trait for derived values.
///
/// Resolution outputs are value objects: they are recomputed on every call,
/// never stored, and two results with the same fields are the same result.
/// Implementors must be immutable once built and safe to share across threads.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug + Send + Sync {}
