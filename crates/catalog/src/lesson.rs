use serde::{Deserialize, Serialize};

use lessonhub_core::{DomainError, DomainResult, Entity, LessonId, ValueObject};

/// Remaining capacity of a lesson. Never negative by construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Spaces(u32);

impl Spaces {
    pub const ZERO: Spaces = Spaces(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Validate a client-supplied count (e.g. the body of `PUT /lessons/:id`).
    pub fn from_i64(field: &str, value: i64) -> DomainResult<Self> {
        if value < 0 {
            return Err(DomainError::validation(field, "spaces cannot be negative"));
        }
        u32::try_from(value)
            .map(Self)
            .map_err(|_| DomainError::validation(field, "spaces is too large"))
    }

    /// `self - quantity`, or `None` when that would go below zero.
    pub fn checked_take(self, quantity: u32) -> Option<Self> {
        self.0.checked_sub(quantity).map(Self)
    }

    pub fn saturating_give(self, quantity: u32) -> Self {
        Self(self.0.saturating_add(quantity))
    }
}

impl ValueObject for Spaces {}

impl core::fmt::Display for Spaces {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// A purchasable activity with finite capacity.
///
/// `spaces` is the only field that changes after the lesson is catalogued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    pub subject: String,
    pub location: String,
    pub price: f64,
    pub spaces: Spaces,
}

impl Lesson {
    pub fn new(
        id: impl Into<LessonId>,
        subject: impl Into<String>,
        location: impl Into<String>,
        price: f64,
        spaces: u32,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            location: location.into(),
            price,
            spaces: Spaces::new(spaces),
        }
    }

    pub fn is_sold_out(&self) -> bool {
        self.spaces == Spaces::ZERO
    }

    /// Take `quantity` spaces if available; returns the remaining count.
    ///
    /// On shortfall the lesson is left untouched.
    pub fn take_spaces(&mut self, quantity: u32) -> DomainResult<Spaces> {
        match self.spaces.checked_take(quantity) {
            Some(remaining) => {
                self.spaces = remaining;
                Ok(remaining)
            }
            None => Err(DomainError::insufficient_stock(
                self.id.get(),
                quantity,
                self.spaces.get(),
            )),
        }
    }

    pub fn return_spaces(&mut self, quantity: u32) {
        self.spaces = self.spaces.saturating_give(quantity);
    }
}

impl Entity for Lesson {
    type Id = LessonId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
