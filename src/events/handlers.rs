use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::{
    dto::{EventListResponse, EventRequest, EventResponse, EventView, ListEventsQuery},
    services,
};
use crate::{
    auth::AuthUser,
    dto::MessageResponse,
    error::AppError,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
    users::repo_types::UserSummary,
};

pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/user/events", get(user_events))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
        .route("/events/:id/join", post(join_event))
        .route("/events/:id/leave", post(leave_event))
}

#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListEventsQuery>,
) -> Result<Json<EventListResponse>, AppError> {
    let page = services::list_events(&state, &query).await?;
    let creators = services::creators_of(&state, &page.items).await?;
    let limit = query.limit();
    let events = page
        .items
        .into_iter()
        .map(|e| {
            let creator = creators.get(&e.creator_id).cloned();
            EventView::with_creator(e, creator)
        })
        .collect();
    Ok(Json(EventListResponse {
        events,
        total_items: page.total,
        total_pages: (page.total + limit - 1) / limit,
        current_page: query.page(),
    }))
}

#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EventView<UserSummary>>, AppError> {
    Ok(Json(services::event_with_people(&state, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<EventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), AppError> {
    let details = payload.validate(OffsetDateTime::now_utc()).map_err(|e| {
        warn!(error = %e, %user_id, "invalid event");
        e
    })?;
    let event = services::create_event(&state, user_id, details).await?;
    Ok((
        StatusCode::CREATED,
        Json(EventResponse {
            message: "Event created",
            event: event.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn update_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<EventRequest>,
) -> Result<Json<EventResponse>, AppError> {
    let details = payload.validate(OffsetDateTime::now_utc()).map_err(|e| {
        warn!(error = %e, %user_id, event_id = %id, "invalid event update");
        e
    })?;
    let event = services::update_event(&state, user_id, id, &details).await?;
    Ok(Json(EventResponse {
        message: "Event updated",
        event: event.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_event(&state, user_id, id).await?;
    Ok(Json(MessageResponse::new("Event deleted")))
}

#[instrument(skip(state))]
pub async fn user_events(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<EventView<Uuid>>>, AppError> {
    let events = state.events.list_for_user(user_id).await?;
    let creators = services::creators_of(&state, &events).await?;
    Ok(Json(
        events
            .into_iter()
            .map(|e| {
                let creator = creators.get(&e.creator_id).cloned();
                EventView::with_creator(e, creator)
            })
            .collect(),
    ))
}

#[instrument(skip(state))]
pub async fn join_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::join_event(&state, user_id, id).await?;
    Ok(Json(MessageResponse::new("You joined the event")))
}

#[instrument(skip(state))]
pub async fn leave_event(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::leave_event(&state, user_id, id).await?;
    Ok(Json(MessageResponse::new("You left the event")))
}
