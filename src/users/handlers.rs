use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, UpdateProfileRequest},
    repo_types::User,
};
use crate::{
    auth::{
        password::{burn_verify, hash_password, verify_password},
        AuthUser,
    },
    dto::MessageResponse,
    error::AppError,
    extract::AppJson,
    state::AppState,
    validation,
};

/// Same message for unknown email and wrong password.
const INVALID_CREDENTIALS: &str = "Invalid email or password";
const EMAIL_IN_USE: &str = "This email is already in use";

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route(
            "/users/profile",
            get(get_profile).put(update_profile).delete(delete_profile),
        )
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, AppError> {
    state.users.find_by_id(user_id).await?.ok_or_else(|| {
        warn!(%user_id, "user not found");
        AppError::not_found("User not found")
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let account = payload.validate().map_err(|e| {
        warn!(error = %e, "invalid registration");
        e
    })?;

    if state.users.find_by_email(&account.email).await?.is_some() {
        warn!(email = %account.email, "email already registered");
        return Err(AppError::conflict(EMAIL_IN_USE));
    }

    let password_hash = hash_password(&account.password)?;
    let now = OffsetDateTime::now_utc();
    let user = state
        .users
        .insert(User {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password_hash,
            created_at: now,
            updated_at: now,
        })
        .await?;

    let token = state.jwt.issue(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful",
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = validation::normalize_email(payload.email.as_deref().unwrap_or_default());
    let password = payload.password.unwrap_or_default();

    let Some(user) = state.users.find_by_email(&email).await? else {
        burn_verify(&password);
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.jwt.issue(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse {
        message: "Login successful",
        user: user.into(),
        token,
    }))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<User>, AppError> {
    Ok(Json(load_user(&state, user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let changes = payload.validate().map_err(|e| {
        warn!(error = %e, %user_id, "invalid profile update");
        e
    })?;
    let mut user = load_user(&state, user_id).await?;

    if let Some((current, new)) = changes.password {
        if !verify_password(&current, &user.password_hash)? {
            warn!(%user_id, "profile update with wrong current password");
            return Err(AppError::Unauthorized("Current password is incorrect".into()));
        }
        user.password_hash = hash_password(&new)?;
    }
    if let Some(name) = changes.name {
        user.name = name;
    }
    if let Some(email) = changes.email {
        if email != user.email {
            if let Some(other) = state.users.find_by_email(&email).await? {
                if other.id != user.id {
                    warn!(%user_id, "profile email already in use");
                    return Err(AppError::conflict(EMAIL_IN_USE));
                }
            }
        }
        user.email = email;
    }
    user.updated_at = OffsetDateTime::now_utc();

    let user = state
        .users
        .update(&user)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!(%user_id, "profile updated");
    Ok(Json(ProfileResponse {
        message: "Profile updated",
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    if !state.users.delete(user_id).await? {
        warn!(%user_id, "delete of unknown user");
        return Err(AppError::not_found("User not found"));
    }
    info!(%user_id, "account deleted");
    Ok(Json(MessageResponse::new("Account deleted")))
}
