//! Event DTOs for the public and admin event endpoints.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{Event, EventId};
use crate::service::{EventForm, TranslationForm};

/// Request body for `POST /events/{id}/book`.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
pub struct BookRequest {
    /// Number of tickets. Defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

fn default_quantity() -> i32 {
    1
}

/// Query for `GET /admin/events`.
#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminEventsParams {
    /// Only events on this day (`YYYY-MM-DD`, UTC).
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// An event with every translation and its audit columns, for admins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AdminEventDto {
    /// Event id.
    pub id: EventId,
    /// Event start (UTC).
    pub date: DateTime<Utc>,
    /// Ticket price.
    #[schema(value_type = String, example = "25.00")]
    pub price: Decimal,
    /// Poster image URL.
    pub image_url: Option<String>,
    /// Map link.
    pub google_map_url: Option<String>,
    /// Every translation, in insertion order.
    pub translations: Vec<TranslationForm>,
    /// Active bookings, when loaded.
    pub booking_count: usize,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<Event> for AdminEventDto {
    fn from(event: Event) -> Self {
        let form = EventForm::from_event(&event);
        Self {
            id: event.id,
            date: event.date,
            price: event.price,
            image_url: event.image_url,
            google_map_url: event.google_map_url,
            translations: form.translations,
            booking_count: event.bookings.len(),
            created_at: event.audit.created_at,
            updated_at: event.audit.updated_at,
        }
    }
}
