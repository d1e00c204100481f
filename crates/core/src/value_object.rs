//! Value object trait: equality by value, not identity.
//!
//! Value objects have **no identity**. They are defined entirely by their
//! attribute values, so two with the same values are interchangeable.

/// Marker trait for value objects.
///
/// Implementors are immutable once constructed and compared by value. In this
/// workspace that covers quantities, space counts, search terms and order
/// lines; lessons and orders are entities (see [`crate::Entity`]).
///
/// ```ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// struct Quantity(u32);
///
/// impl ValueObject for Quantity {}
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
