//! Error returned by every store-facing service operation.

use thiserror::Error;

use lessonhub_core::DomainError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// Client input or business rule failure.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Infrastructure failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    #[cfg(test)]
    pub(crate) fn as_domain(&self) -> Option<&DomainError> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Store(_) => None,
        }
    }
}
