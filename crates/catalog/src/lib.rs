//! Lesson catalog domain module.
//!
//! Lessons, their remaining capacity, and the search predicate used over the
//! catalog. Deterministic domain logic only (no IO, no HTTP, no storage).

pub mod fixtures;
pub mod lesson;
pub mod search;

pub use lesson::{Lesson, Spaces};
pub use search::SearchTerm;
