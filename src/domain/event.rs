//! Events and their per-language translations.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::audit::{AuditFields, Deletable, DeletionPolicy};
use super::{Booking, EventId, Locale, TranslationId};

/// A ticketed event.
///
/// `translations` and `bookings` are only populated when the query that
/// loaded the event asked for those relations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier.
    pub id: EventId,
    /// Date and time the event takes place (UTC).
    pub date: DateTime<Utc>,
    /// Unit ticket price.
    pub price: Decimal,
    /// Public image location.
    pub image_url: Option<String>,
    /// Map link for the venue.
    pub google_map_url: Option<String>,
    /// Audit and soft-delete bookkeeping.
    pub audit: AuditFields,
    /// Localized texts, one per language code.
    pub translations: Vec<EventTranslation>,
    /// Bookings made for this event.
    pub bookings: Vec<Booking>,
}

impl Event {
    /// Calendar day of the event in UTC.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }

    /// Whether the event can still be booked or cancelled on `today`.
    ///
    /// Time of day is ignored: an event happening later today is still open.
    #[must_use]
    pub fn is_open_on(&self, today: NaiveDate) -> bool {
        self.day() >= today
    }

    /// Translation for `locale`, falling back to the first translation.
    #[must_use]
    pub fn translation_for(&self, locale: Locale) -> Option<&EventTranslation> {
        self.translations
            .iter()
            .find(|t| t.language_code == locale.code())
            .or_else(|| self.translations.first())
    }
}

impl Deletable for Event {
    const POLICY: DeletionPolicy = DeletionPolicy::Hard;
}

/// Localized texts of an [`Event`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTranslation {
    /// Row identifier.
    pub id: TranslationId,
    /// Owning event.
    pub event_id: EventId,
    /// Two-letter language code (e.g. `"en"`).
    pub language_code: String,
    /// Event name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Category label.
    pub category: String,
    /// Venue label.
    pub venue: String,
    /// Free-form tags.
    pub tags: String,
}
