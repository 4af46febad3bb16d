//! Admin booking management: filtered listing, trash, status changes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::auth::RequireAdmin;
use crate::api::dto::{AdminBookingParams, PageParams, UpdateStatusRequest};
use crate::app_state::AppState;
use crate::domain::{BookingId, BookingStatus};
use crate::error::{ErrorResponse, EventlyError};
use crate::service::{BookingView, PaginatedList};

/// `GET /admin/bookings`: Filtered listing over every user's bookings.
///
/// # Errors
///
/// Returns [`EventlyError::InvalidStatus`] for an unknown status filter.
#[utoipa::path(
    get,
    path = "/api/v1/admin/bookings",
    tag = "Admin",
    summary = "List bookings",
    description = "Active bookings matching every given filter, ten per page, with owner names and totals.",
    params(AdminBookingParams),
    responses(
        (status = 200, description = "Bookings", body = PaginatedList<BookingView>),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 403, description = "Admin role required", body = ErrorResponse),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<AdminBookingParams>,
) -> Result<impl IntoResponse, EventlyError> {
    let filter = params.to_filter()?;
    let page = state
        .services
        .bookings()
        .get_bookings_with_filters(&filter, params.page_number)
        .await?;
    Ok(Json(page))
}

/// `GET /admin/bookings/trash`: Cancelled bookings kept for auditing.
///
/// # Errors
///
/// Returns [`EventlyError`] on persistence failures.
#[utoipa::path(
    get,
    path = "/api/v1/admin/bookings/trash",
    tag = "Admin",
    summary = "Booking trash",
    params(PageParams),
    responses(
        (status = 200, description = "Soft-deleted bookings", body = PaginatedList<BookingView>),
    )
)]
pub async fn trash(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, EventlyError> {
    let page = state
        .services
        .bookings()
        .get_trashed_bookings(params.page())
        .await?;
    Ok(Json(page))
}

/// `POST /admin/bookings/{id}/status`: Change a booking's status.
///
/// # Errors
///
/// Returns [`EventlyError::InvalidStatus`] for an unknown status,
/// [`EventlyError::BookingNotFound`] for an unknown booking and
/// [`EventlyError::InvalidTransition`] when the change is not allowed.
#[utoipa::path(
    post,
    path = "/api/v1/admin/bookings/{id}/status",
    tag = "Admin",
    summary = "Update booking status",
    params(
        ("id" = uuid::Uuid, Path, description = "Booking UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 204, description = "Status updated"),
        (status = 400, description = "Unknown status", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Transition not allowed", body = ErrorResponse),
    )
)]
pub async fn update_status(
    State(state): State<AppState>,
    admin: RequireAdmin,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, EventlyError> {
    let booking_id = BookingId::from_uuid(id);
    let status: BookingStatus = req.status.parse()?;
    let updated = state
        .services
        .bookings()
        .update_booking_status(booking_id, status)
        .await?;
    if !updated {
        return Err(EventlyError::BookingNotFound(booking_id));
    }
    tracing::debug!(admin = %admin.id, %booking_id, %status, "admin changed booking status");
    Ok(StatusCode::NO_CONTENT)
}

/// Admin booking routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/bookings", get(list))
        .route("/admin/bookings/trash", get(trash))
        .route("/admin/bookings/{id}/status", post(update_status))
}
