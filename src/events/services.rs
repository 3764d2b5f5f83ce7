use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{
    dto::{EventDetails, EventView, ListEventsQuery},
    participation,
    repo_types::Event,
};
use crate::{
    error::AppError,
    state::AppState,
    storage::{EventFilter, Page},
    users::repo_types::UserSummary,
    validation::DEFAULT_MAX_PARTICIPANTS,
};

/// Attempts at a conditional write before giving up on a contended event.
const MAX_WRITE_ATTEMPTS: usize = 3;

pub async fn load_event(state: &AppState, event_id: Uuid) -> Result<Event, AppError> {
    state
        .events
        .find_by_id(event_id)
        .await?
        .ok_or_else(|| AppError::not_found("Event not found"))
}

/// Callers act on events only while their account exists; a token can
/// outlive the account it was issued for.
async fn require_account(state: &AppState, user_id: Uuid) -> Result<(), AppError> {
    if state.users.find_by_id(user_id).await?.is_none() {
        warn!(%user_id, "token subject has no account");
        return Err(AppError::not_found("User not found"));
    }
    Ok(())
}

/// Re-reads the event and re-applies `apply` until a version-checked save lands.
async fn write_with_retry<F>(
    state: &AppState,
    event_id: Uuid,
    mut apply: F,
) -> Result<Event, AppError>
where
    F: FnMut(&mut Event) -> Result<(), AppError> + Send,
{
    for attempt in 1..=MAX_WRITE_ATTEMPTS {
        let mut event = load_event(state, event_id).await?;
        apply(&mut event)?;
        event.updated_at = OffsetDateTime::now_utc();
        if let Some(saved) = state.events.save(&event).await? {
            return Ok(saved);
        }
        debug!(%event_id, attempt, "stale event version, retrying");
    }
    warn!(%event_id, "event write kept losing the race");
    Err(AppError::conflict(
        "The event was modified concurrently, please retry",
    ))
}

pub async fn create_event(
    state: &AppState,
    creator_id: Uuid,
    details: EventDetails,
) -> Result<Event, AppError> {
    require_account(state, creator_id).await?;
    let now = OffsetDateTime::now_utc();
    let event = state
        .events
        .insert(Event {
            id: Uuid::new_v4(),
            title: details.title,
            description: details.description,
            date: details.date,
            location: details.location,
            max_participants: details.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS),
            participants: vec![creator_id],
            creator_id,
            version: 0,
            created_at: now,
            updated_at: now,
        })
        .await?;
    info!(event_id = %event.id, %creator_id, "event created");
    Ok(event)
}

pub async fn update_event(
    state: &AppState,
    user_id: Uuid,
    event_id: Uuid,
    details: &EventDetails,
) -> Result<Event, AppError> {
    require_account(state, user_id).await?;
    let event = write_with_retry(state, event_id, |event| {
        participation::authorize_mutation(event, user_id)?;
        let max = details.max_participants.unwrap_or(event.max_participants);
        if event.participants.len() > max as usize {
            return Err(AppError::Validation(format!(
                "Maximum number of participants cannot be lower than the current {} participants",
                event.participants.len()
            )));
        }
        event.title = details.title.clone();
        event.description = details.description.clone();
        event.date = details.date;
        event.location = details.location.clone();
        event.max_participants = max;
        Ok(())
    })
    .await?;
    info!(%event_id, %user_id, "event updated");
    Ok(event)
}

pub async fn delete_event(state: &AppState, user_id: Uuid, event_id: Uuid) -> Result<(), AppError> {
    require_account(state, user_id).await?;
    let event = load_event(state, event_id).await?;
    participation::authorize_mutation(&event, user_id)?;
    if !state.events.delete(event_id).await? {
        return Err(AppError::not_found("Event not found"));
    }
    info!(%event_id, %user_id, "event deleted");
    Ok(())
}

pub async fn join_event(state: &AppState, user_id: Uuid, event_id: Uuid) -> Result<Event, AppError> {
    require_account(state, user_id).await?;
    let event = write_with_retry(state, event_id, |event| {
        event.participants = participation::join(event, user_id)?;
        Ok(())
    })
    .await?;
    info!(%event_id, %user_id, participants = event.participants.len(), "event joined");
    Ok(event)
}

pub async fn leave_event(state: &AppState, user_id: Uuid, event_id: Uuid) -> Result<Event, AppError> {
    require_account(state, user_id).await?;
    let event = write_with_retry(state, event_id, |event| {
        event.participants = participation::leave(event, user_id)?;
        Ok(())
    })
    .await?;
    info!(%event_id, %user_id, participants = event.participants.len(), "event left");
    Ok(event)
}

pub async fn list_events(state: &AppState, query: &ListEventsQuery) -> Result<Page<Event>, AppError> {
    let filter = EventFilter {
        search: query.search(),
        limit: query.limit(),
        offset: query.offset(),
    };
    Ok(state.events.list(&filter).await?)
}

/// Creator summaries for a batch of events, keyed by user id.
pub async fn creators_of(
    state: &AppState,
    events: &[Event],
) -> Result<HashMap<Uuid, UserSummary>, AppError> {
    let mut ids: Vec<Uuid> = events.iter().map(|e| e.creator_id).collect();
    ids.sort();
    ids.dedup();
    Ok(state
        .users
        .summaries(&ids)
        .await?
        .into_iter()
        .map(|s| (s.id, s))
        .collect())
}

/// One event with its creator and participants resolved to summaries.
pub async fn event_with_people(
    state: &AppState,
    event_id: Uuid,
) -> Result<EventView<UserSummary>, AppError> {
    let event = load_event(state, event_id).await?;
    let mut ids = event.participants.clone();
    if !ids.contains(&event.creator_id) {
        ids.push(event.creator_id);
    }
    let mut people = state.users.summaries(&ids).await?;
    let creator = people.iter().find(|p| p.id == event.creator_id).cloned();
    people.retain(|p| event.participants.contains(&p.id));
    Ok(EventView::new(event, people, creator))
}
