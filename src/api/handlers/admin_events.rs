//! Admin event management: list, create, edit, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::RequireAdmin;
use crate::api::dto::{ActionResponse, AdminEventDto, AdminEventsParams};
use crate::app_state::AppState;
use crate::domain::{Event, EventId};
use crate::error::{ErrorResponse, EventlyError};
use crate::persistence::{EventInclude, EventQuery, EventSort};
use crate::service::{EventForm, EventService};

const ADMIN_INCLUDE: EventInclude = EventInclude {
    translations: true,
    bookings: true,
};

async fn load(state: &AppState, id: EventId) -> Result<Event, EventlyError> {
    state
        .services
        .events()
        .get_first_event(EventQuery::new().by_id(id).include(ADMIN_INCLUDE))
        .await?
        .ok_or(EventlyError::EventNotFound(id))
}

/// `GET /admin/events`: Every event, optionally on one day.
///
/// # Errors
///
/// Returns [`EventlyError`] on persistence failures.
#[utoipa::path(
    get,
    path = "/api/v1/admin/events",
    tag = "Admin",
    summary = "List events",
    description = "All active events with every translation, soonest first, optionally restricted to one day.",
    params(AdminEventsParams),
    responses(
        (status = 200, description = "Events", body = Vec<AdminEventDto>),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<AdminEventsParams>,
) -> Result<impl IntoResponse, EventlyError> {
    let mut query = EventQuery::new()
        .include(ADMIN_INCLUDE)
        .sort(EventSort::DateAsc);
    if let Some(day) = params.date {
        query = query.on_date(day);
    }
    let events = state.services.events().get_all_events(query).await?;
    let data: Vec<AdminEventDto> = events.into_iter().map(AdminEventDto::from).collect();
    Ok(Json(data))
}

/// `POST /admin/events`: Create an event with its translations.
///
/// # Errors
///
/// Returns [`EventlyError`] when the form is invalid.
#[utoipa::path(
    post,
    path = "/api/v1/admin/events",
    tag = "Admin",
    summary = "Create an event",
    request_body = EventForm,
    responses(
        (status = 201, description = "Event created", body = EventForm),
        (status = 400, description = "Invalid form", body = ErrorResponse),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Json(form): Json<EventForm>,
) -> Result<impl IntoResponse, EventlyError> {
    let created = state.services.events().create_event(form).await?;
    tracing::debug!(admin = %admin.id, event_id = ?created.id, "admin created event");
    Ok((StatusCode::CREATED, Json(created)))
}

/// `GET /admin/events/{id}`: One event with audit columns.
///
/// # Errors
///
/// Returns [`EventlyError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/admin/events/{id}",
    tag = "Admin",
    summary = "Event details",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event", body = AdminEventDto),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn details(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let event = load(&state, EventId::from_uuid(id)).await?;
    Ok(Json(AdminEventDto::from(event)))
}

/// `GET /admin/events/{id}/edit`: The event as an edit form.
///
/// # Errors
///
/// Returns [`EventlyError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/admin/events/{id}/edit",
    tag = "Admin",
    summary = "Edit form",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Pre-filled form", body = EventForm),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn edit_form(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let event = load(&state, EventId::from_uuid(id)).await?;
    Ok(Json(EventService::map_event_to_update_view_model(&event)))
}

/// `PUT /admin/events/{id}`: Overwrite an event and its translations.
///
/// # Errors
///
/// Returns [`EventlyError`] for an invalid form, an id mismatch between
/// path and body, or an unknown event.
#[utoipa::path(
    put,
    path = "/api/v1/admin/events/{id}",
    tag = "Admin",
    summary = "Update an event",
    description = "Replaces date, price, links and the whole translation set.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = EventForm,
    responses(
        (status = 200, description = "Event updated", body = EventForm),
        (status = 400, description = "Invalid form", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn update(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<uuid::Uuid>,
    Json(mut form): Json<EventForm>,
) -> Result<impl IntoResponse, EventlyError> {
    let event_id = EventId::from_uuid(id);
    if form.id.is_some_and(|body_id| body_id != event_id) {
        return Err(EventlyError::InvalidRequest(
            "event id in body does not match path".to_string(),
        ));
    }
    form.id = Some(event_id);
    let updated = state.services.events().update_event(form).await?;
    Ok(Json(updated))
}

/// `DELETE /admin/events/{id}`: Delete an event with its bookings.
///
/// # Errors
///
/// Returns [`EventlyError`] on persistence failures.
#[utoipa::path(
    delete,
    path = "/api/v1/admin/events/{id}",
    tag = "Admin",
    summary = "Delete an event",
    description = "Removes the event, its translations and its bookings.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event deleted", body = ActionResponse),
        (status = 404, description = "Event not found", body = ActionResponse),
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let deleted = state
        .services
        .events()
        .delete_event(EventId::from_uuid(id))
        .await?;
    if deleted {
        Ok((StatusCode::OK, Json(ActionResponse::ok("Delete successful"))))
    } else {
        Ok((StatusCode::NOT_FOUND, Json(ActionResponse::failed("Event not found"))))
    }
}

/// Admin event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/events", get(list).post(create))
        .route("/admin/events/{id}", get(details).put(update).delete(delete))
        .route("/admin/events/{id}/edit", get(edit_form))
}
