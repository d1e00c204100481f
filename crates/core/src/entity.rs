//! Entity trait: identity that survives state changes.

/// Something addressed by identity rather than by value.
///
/// A lesson stays the same lesson while its `spaces` count moves; an order
/// keeps its id for its whole (immutable) life.
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
