//! Catalog Store accessor: listing, search and the spaces override.

use std::sync::Arc;

use tracing::info;

use lessonhub_catalog::{Lesson, SearchTerm, Spaces};
use lessonhub_core::{DomainError, LessonId};

use crate::error::ServiceResult;
use crate::store::CatalogStore;

pub struct CatalogService<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for CatalogService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> CatalogService<S>
where
    S: CatalogStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn list_all(&self) -> ServiceResult<Vec<Lesson>> {
        Ok(self.store.list_lessons().await?)
    }

    /// Case-insensitive substring search over subject and location.
    ///
    /// A blank term is a validation error; no match is an empty list.
    pub async fn search(&self, raw_term: &str) -> ServiceResult<Vec<Lesson>> {
        let term = SearchTerm::parse(raw_term)?;
        Ok(self.store.search_lessons(&term).await?)
    }

    pub async fn get(&self, id: LessonId) -> ServiceResult<Lesson> {
        self.store
            .get_lesson(id)
            .await?
            .ok_or_else(|| DomainError::not_found("lesson", id).into())
    }

    /// Overwrite the remaining spaces of one lesson.
    pub async fn set_spaces(&self, id: LessonId, spaces: Spaces) -> ServiceResult<()> {
        if !self.store.set_spaces(id, spaces).await? {
            return Err(DomainError::not_found("lesson", id).into());
        }
        info!(lesson_id = %id, spaces = spaces.get(), "lesson spaces set");
        Ok(())
    }
}
