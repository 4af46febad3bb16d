//! Application user profiles.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::Identity;
use crate::app_state::AppState;
use crate::domain::{ApplicationUser, UserId};
use crate::error::{ErrorResponse, EventlyError};
use crate::service::UserForm;

/// `POST /users`: Register a profile.
///
/// # Errors
///
/// Returns [`EventlyError`] on invalid fields or a taken username.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    summary = "Register a user",
    description = "Creates an application profile with the User role. `id` carries the identity provider subject when known.",
    request_body = UserForm,
    responses(
        (status = 201, description = "User registered", body = ApplicationUser),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 409, description = "Username taken", body = ErrorResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<UserForm>,
) -> Result<impl IntoResponse, EventlyError> {
    let user = state.services.users().register_user(form).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /users/{id}`: A profile; callers may read their own, admins any.
///
/// # Errors
///
/// Returns [`EventlyError::Forbidden`] for someone else's profile and
/// [`EventlyError::UserNotFound`] when it does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    summary = "Get a user",
    params(
        ("id" = uuid::Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "User profile", body = ApplicationUser),
        (status = 403, description = "Not the caller's profile", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    caller: Identity,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let user_id = UserId::from_uuid(id);
    if caller.id != user_id && !caller.is_admin() {
        return Err(EventlyError::Forbidden("not your profile".to_string()));
    }
    let user = state
        .services
        .users()
        .get_user(user_id)
        .await?
        .ok_or(EventlyError::UserNotFound(user_id))?;
    Ok(Json(user))
}

/// User routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/{id}", get(get_user))
}
