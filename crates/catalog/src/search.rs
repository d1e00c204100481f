//! Catalog search predicate.
//!
//! A lesson matches when its subject or location contains the term as a
//! case-insensitive substring. Stores that can evaluate this natively (see
//! [`SearchTerm::like_pattern`]) push it down; others scan with
//! [`SearchTerm::matches`].

use lessonhub_core::{DomainError, DomainResult, ValueObject};

use crate::lesson::Lesson;

/// A validated, non-empty search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTerm {
    raw: String,
    folded: String,
}

impl SearchTerm {
    /// Field name reported on validation failures (the `q` query parameter).
    pub const FIELD: &'static str = "q";

    /// Surrounding whitespace is ignored; a blank term is rejected.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation(
                Self::FIELD,
                "search term cannot be empty",
            ));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            folded: trimmed.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, lesson: &Lesson) -> bool {
        lesson.subject.to_lowercase().contains(&self.folded)
            || lesson.location.to_lowercase().contains(&self.folded)
    }

    /// SQL `LIKE`/`ILIKE` pattern for substring containment, with `\` as the
    /// escape character for literal `%`, `_` and `\`.
    pub fn like_pattern(&self) -> String {
        let mut out = String::with_capacity(self.raw.len() + 2);
        out.push('%');
        for c in self.raw.chars() {
            if matches!(c, '%' | '_' | '\\') {
                out.push('\\');
            }
            out.push(c);
        }
        out.push('%');
        out
    }

    /// Linear scan fallback.
    pub fn filter<'a, I>(&self, lessons: I) -> Vec<Lesson>
    where
        I: IntoIterator<Item = &'a Lesson>,
    {
        lessons
            .into_iter()
            .filter(|l| self.matches(l))
            .cloned()
            .collect()
    }
}

impl ValueObject for SearchTerm {}
