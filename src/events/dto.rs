use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Event;
use crate::users::repo_types::UserSummary;
use crate::validation::{self, ValidationError};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Body of create and update requests.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub date: Option<OffsetDateTime>,
    pub location: Option<String>,
    pub max_participants: Option<i32>,
}

/// Event fields that passed validation.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub title: String,
    pub description: Option<String>,
    pub date: OffsetDateTime,
    pub location: String,
    /// `None` keeps the default on create and the stored value on update.
    pub max_participants: Option<i32>,
}

impl EventRequest {
    pub fn validate(self, now: OffsetDateTime) -> Result<EventDetails, ValidationError> {
        let title = validation::title(self.title.as_deref())?;
        let description = validation::description(self.description.as_deref())?;
        let date = validation::future_date(self.date, now)?;
        let location = validation::location(self.location.as_deref())?;
        let max_participants = validation::max_participants(self.max_participants)?;
        Ok(EventDetails {
            title,
            description,
            date,
            location,
            max_participants,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
}

impl ListEventsQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1).saturating_mul(self.limit())
    }

    pub fn search(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Event as sent to clients. `P` is a bare id in lists and a
/// [`UserSummary`] when participants are embedded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView<P> {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub location: String,
    pub max_participants: i32,
    pub participants: Vec<P>,
    pub creator_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<UserSummary>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl<P> EventView<P> {
    pub fn new(event: Event, participants: Vec<P>, creator: Option<UserSummary>) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            date: event.date,
            location: event.location,
            max_participants: event.max_participants,
            participants,
            creator_id: event.creator_id,
            creator,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

impl From<Event> for EventView<Uuid> {
    fn from(mut event: Event) -> Self {
        let participants = std::mem::take(&mut event.participants);
        Self::new(event, participants, None)
    }
}

impl EventView<Uuid> {
    pub fn with_creator(event: Event, creator: Option<UserSummary>) -> Self {
        let mut view = Self::from(event);
        view.creator = creator;
        view
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventListResponse {
    pub events: Vec<EventView<Uuid>>,
    pub total_items: i64,
    pub total_pages: i64,
    pub current_page: i64,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub message: &'static str,
    pub event: EventView<Uuid>,
}
