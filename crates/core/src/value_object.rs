//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**: two instances
/// with the same attribute values are the same value. To "modify" one, build
/// a new one. `DateRange` and the attribution touch summaries are the main
/// implementors here.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
