//! The caller's own bookings.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::CurrentUser;
use crate::api::dto::{ActionResponse, PageParams};
use crate::api::locale::RequestLocale;
use crate::app_state::AppState;
use crate::domain::BookingId;
use crate::error::{ErrorResponse, EventlyError};
use crate::service::{BookingView, BookingsPage};

/// `GET /bookings`: The caller's bookings, newest first.
///
/// # Errors
///
/// Returns [`EventlyError`] on persistence failures.
#[utoipa::path(
    get,
    path = "/api/v1/bookings",
    tag = "Bookings",
    summary = "My bookings",
    description = "Active bookings, six per page, plus the two nearest upcoming booked events.",
    params(PageParams),
    responses(
        (status = 200, description = "Bookings page", body = BookingsPage),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    RequestLocale(locale): RequestLocale,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, EventlyError> {
    let page = state
        .services
        .bookings()
        .user_bookings_page(user.id, params.page(), locale)
        .await?;
    Ok(Json(page))
}

/// `GET /bookings/{id}`: One of the caller's bookings.
///
/// # Errors
///
/// Returns [`EventlyError::BookingNotFound`] when the booking is not the
/// caller's or has been cancelled.
#[utoipa::path(
    get,
    path = "/api/v1/bookings/{id}",
    tag = "Bookings",
    summary = "Booking details",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Booking", body = BookingView),
        (status = 404, description = "Booking not found", body = ErrorResponse),
    )
)]
pub async fn details(
    State(state): State<AppState>,
    user: CurrentUser,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let booking_id = BookingId::from_uuid(id);
    let view = state
        .services
        .bookings()
        .get_booking_by_id(booking_id, user.id, locale)
        .await?
        .ok_or(EventlyError::BookingNotFound(booking_id))?;
    Ok(Json(view))
}

/// `POST /bookings/{id}/cancel`: Cancel one of the caller's bookings.
///
/// # Errors
///
/// Returns [`EventlyError::BookingNotFound`] for an unknown booking and
/// [`EventlyError::NotCancellable`] when the event has already passed.
#[utoipa::path(
    post,
    path = "/api/v1/bookings/{id}/cancel",
    tag = "Bookings",
    summary = "Cancel a booking",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    responses(
        (status = 200, description = "Booking cancelled", body = ActionResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Booking can no longer be cancelled", body = ErrorResponse),
    )
)]
pub async fn cancel(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, EventlyError> {
    let booking_id = BookingId::from_uuid(id);
    let bookings = state.services.bookings();

    if bookings
        .get_booking_by_id(booking_id, user.id, state.default_locale)
        .await?
        .is_none()
    {
        return Err(EventlyError::BookingNotFound(booking_id));
    }
    if !bookings.cancel_booking(booking_id, user.id).await? {
        return Err(EventlyError::NotCancellable(booking_id));
    }
    Ok(Json(ActionResponse::ok("Booking cancelled")))
}

/// Booking routes for end users.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", get(list))
        .route("/bookings/{id}", get(details))
        .route("/bookings/{id}/cancel", post(cancel))
}
