//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**; two values with the same attributes are
//! the same value. In the catalog, `Slug` and `ImageRef` are value objects while
//! `Brand` or `Product` are entities.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by value. To "modify" one, build a
/// new one (e.g. `Slug::parse` again) and replace the field holding it.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
