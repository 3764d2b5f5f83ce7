//! Persistence seam. Handlers and services only see [`UserStore`] and
//! [`EventStore`]; `PgStore` backs them in production and `MemoryStore` in tests.

use axum::async_trait;
use uuid::Uuid;

use crate::{
    events::repo_types::Event,
    users::repo_types::{User, UserSummary},
};

#[cfg(test)]
pub mod memory;
pub mod pg;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness rule was violated (e.g. email already in use).
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Case-insensitive substring matched against title or description.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: User) -> StoreResult<User>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    /// `None` when the user no longer exists.
    async fn update(&self, user: &User) -> StoreResult<Option<User>>;
    /// Also deletes the user's events and removes them from every participant list.
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
    /// Summaries in the order of `ids`; unknown ids are skipped.
    async fn summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: Event) -> StoreResult<Event>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Event>>;
    /// Ordered by date ascending.
    async fn list(&self, filter: &EventFilter) -> StoreResult<Page<Event>>;
    /// Events created or joined by `user_id`, ordered by date ascending.
    async fn list_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Event>>;
    /// Writes every mutable field if the stored version still equals
    /// `event.version`, bumping it. `None` means the event was changed or
    /// deleted since it was read.
    async fn save(&self, event: &Event) -> StoreResult<Option<Event>>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Escapes LIKE wildcards so user input only ever matches literally.
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::like_pattern;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("jazz"), "%jazz%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }
}
