//! Public event handlers: landing page, details, booking.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::auth::{CurrentUser, MaybeUser};
use crate::api::dto::{BookRequest, PageParams};
use crate::api::locale::RequestLocale;
use crate::app_state::AppState;
use crate::domain::EventId;
use crate::error::{ErrorResponse, EventlyError};
use crate::service::{BookingView, EventView, HomePage};

/// `GET /events`: Upcoming events page plus the soonest events.
///
/// # Errors
///
/// Returns [`EventlyError`] on persistence failures.
#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    summary = "Upcoming events",
    description = "Events from today on, soonest first, six per page, plus the two soonest. Each is flagged `is_booked` when the caller holds a booking for it.",
    params(PageParams),
    responses(
        (status = 200, description = "Landing page", body = HomePage),
    )
)]
pub async fn home(
    State(state): State<AppState>,
    viewer: MaybeUser,
    RequestLocale(locale): RequestLocale,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, EventlyError> {
    let page = state
        .services
        .events()
        .home_page(viewer.id(), params.page(), locale)
        .await?;
    Ok(Json(page))
}

/// `GET /events/{id}`: Event details in the caller's locale.
///
/// # Errors
///
/// Returns [`EventlyError::EventNotFound`] if the event does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    summary = "Event details",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Event details", body = EventView),
        (status = 404, description = "Event not found", body = ErrorResponse),
    )
)]
pub async fn details(
    State(state): State<AppState>,
    viewer: MaybeUser,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let event_id = EventId::from_uuid(id);
    let view = state
        .services
        .events()
        .event_details(event_id, viewer.id(), locale)
        .await?
        .ok_or(EventlyError::EventNotFound(event_id))?;
    Ok(Json(view))
}

/// `GET /events/{id}/book`: Booking confirmation view for one ticket.
///
/// # Errors
///
/// Returns [`EventlyError::EventNotFound`] or [`EventlyError::EventInPast`].
#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/book",
    tag = "Events",
    summary = "Booking preview",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    responses(
        (status = 200, description = "Confirmation view", body = BookingView),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 409, description = "Event no longer available", body = ErrorResponse),
    )
)]
pub async fn book_preview(
    State(state): State<AppState>,
    _user: CurrentUser,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let view = state
        .services
        .bookings()
        .booking_preview(EventId::from_uuid(id), locale)
        .await?;
    Ok(Json(view))
}

/// `POST /events/{id}/book`: Book tickets.
///
/// # Errors
///
/// Returns [`EventlyError`] when the quantity is invalid, the event is
/// missing or past, or the caller has no profile.
#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/book",
    tag = "Events",
    summary = "Book tickets",
    description = "Creates a Pending booking for the caller. The event must take place today or later.",
    params(
        ("id" = uuid::Uuid, Path, description = "Event UUID"),
    ),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingView),
        (status = 400, description = "Invalid quantity", body = ErrorResponse),
        (status = 404, description = "Event or user not found", body = ErrorResponse),
        (status = 409, description = "Event in the past", body = ErrorResponse),
    )
)]
pub async fn book(
    State(state): State<AppState>,
    user: CurrentUser,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<BookRequest>,
) -> Result<impl IntoResponse, EventlyError> {
    let view = state
        .services
        .bookings()
        .create_booking(EventId::from_uuid(id), user.id, req.quantity, locale)
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Public event routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(home))
        .route("/events/{id}", get(details))
        .route("/events/{id}/book", get(book_preview).post(book))
}
