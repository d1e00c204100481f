//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// missing references, stock rules). Store and transport failures belong to
/// the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A client-supplied value failed validation. `field` names the offending
    /// input (e.g. `customerName`, `items[0].quantity`).
    #[error("validation failed for `{field}`: {message}")]
    Validation { field: String, message: String },

    /// A referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// A lesson did not have enough spaces left to satisfy a reservation.
    #[error("insufficient stock for lesson {lesson_id} (requested {requested}, available {available})")]
    InsufficientStock {
        lesson_id: i64,
        requested: u32,
        available: u32,
    },
}

impl DomainError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn insufficient_stock(lesson_id: i64, requested: u32, available: u32) -> Self {
        Self::InsufficientStock {
            lesson_id,
            requested,
            available,
        }
    }

    /// Name of the offending field for validation errors.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
