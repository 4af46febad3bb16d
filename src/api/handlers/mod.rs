//! REST endpoint handlers organized by resource.

pub mod admin_bookings;
pub mod admin_events;
pub mod bookings;
pub mod events;
pub mod system;
pub mod users;

use axum::Router;

use crate::app_state::AppState;

/// Composes all resource routes under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(events::routes())
        .merge(bookings::routes())
        .merge(users::routes())
        .merge(admin_events::routes())
        .merge(admin_bookings::routes())
}
