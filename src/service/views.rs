//! Request and response shapes produced or consumed by the services.
//!
//! Translation selection always takes an explicit [`Locale`] and falls back
//! to the event's first translation when the locale has none.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain::user::{validate_phone, validate_username};
use crate::domain::{
    Booking, BookingId, BookingStatus, Event, EventId, EventTranslation, Locale, TranslationId,
    UserId,
};

/// Largest price `NUMERIC(18, 2)` can hold.
pub const MAX_PRICE: Decimal = Decimal::from_parts(2_808_348_671, 232_830_643, 0, false, 2);

fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if *price < Decimal::ZERO {
        return Err(
            ValidationError::new("price").with_message("Price must be a positive number".into())
        );
    }
    if *price > MAX_PRICE || price.normalize().scale() > 2 {
        return Err(ValidationError::new("price")
            .with_message("Price must have at most 16 digits and 2 decimals".into()));
    }
    Ok(())
}

fn validate_language_code(code: &str) -> Result<(), ValidationError> {
    code.parse::<Locale>().map(|_| ()).map_err(|_| {
        ValidationError::new("language_code").with_message("Unsupported language code".into())
    })
}

/// Create / edit form for an event and its translations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct EventForm {
    /// Set on update, and on the form returned after a create.
    #[serde(default)]
    pub id: Option<EventId>,
    /// Event start (UTC).
    pub date: DateTime<Utc>,
    /// Ticket price, not negative.
    #[validate(custom(function = "validate_price"))]
    #[schema(value_type = String, example = "25.00")]
    pub price: Decimal,
    /// Map link.
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub google_map_url: Option<String>,
    /// Poster image URL.
    #[serde(default)]
    #[validate(length(max = 2048))]
    pub image_url: Option<String>,
    /// One entry per language; at least one.
    #[validate(length(min = 1, message = "At least one translation is required"), nested)]
    pub translations: Vec<TranslationForm>,
}

/// One language of an [`EventForm`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct TranslationForm {
    /// Ignored on input; new ids are minted on every save.
    #[serde(default)]
    pub id: Option<TranslationId>,
    /// `en` or `ar`.
    #[validate(custom(function = "validate_language_code"))]
    pub language_code: String,
    /// Localized name.
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    /// Localized description.
    #[validate(length(min = 1))]
    pub description: String,
    /// Localized category.
    #[validate(length(min = 1, max = 128))]
    pub category: String,
    /// Localized venue.
    #[validate(length(min = 1, max = 256))]
    pub venue: String,
    /// Localized tags.
    #[validate(length(min = 1))]
    pub tags: String,
}

impl EventForm {
    /// Projects an event, with its translations loaded, into the edit form.
    #[must_use]
    pub fn from_event(event: &Event) -> Self {
        Self {
            id: Some(event.id),
            date: event.date,
            price: event.price,
            google_map_url: event.google_map_url.clone(),
            image_url: event.image_url.clone(),
            translations: event
                .translations
                .iter()
                .map(|t| TranslationForm {
                    id: Some(t.id),
                    language_code: t.language_code.clone(),
                    name: t.name.clone(),
                    description: t.description.clone(),
                    category: t.category.clone(),
                    venue: t.venue.clone(),
                    tags: t.tags.clone(),
                })
                .collect(),
        }
    }

    /// Fresh translation rows for `event_id`, one per form entry, with new
    /// ids.
    #[must_use]
    pub fn to_translations(&self, event_id: EventId) -> Vec<EventTranslation> {
        self.translations
            .iter()
            .map(|t| EventTranslation {
                id: TranslationId::new(),
                event_id,
                language_code: t.language_code.trim().to_ascii_lowercase(),
                name: t.name.clone(),
                description: t.description.clone(),
                category: t.category.clone(),
                venue: t.venue.clone(),
                tags: t.tags.clone(),
            })
            .collect()
    }

    /// First language code that appears more than once.
    #[must_use]
    pub fn duplicate_language(&self) -> Option<String> {
        let mut seen = std::collections::HashSet::new();
        self.translations
            .iter()
            .map(|t| t.language_code.trim().to_ascii_lowercase())
            .find(|code| !seen.insert(code.clone()))
    }
}

/// An event resolved for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventView {
    /// Event id.
    pub id: EventId,
    /// Localized name.
    pub name: String,
    /// Localized category.
    pub category: String,
    /// Localized description.
    pub description: String,
    /// Localized venue.
    pub venue: String,
    /// Localized tags.
    pub tags: String,
    /// Poster image URL.
    pub image_url: Option<String>,
    /// Map link.
    pub google_map_url: Option<String>,
    /// Event start (UTC).
    pub date: DateTime<Utc>,
    /// Ticket price.
    #[schema(value_type = String, example = "25.00")]
    pub price: Decimal,
    /// Whether the viewer holds an active booking for this event.
    pub is_booked: bool,
}

impl EventView {
    /// Resolves `event` for `locale`. Text fields are empty when the event
    /// has no translation at all.
    #[must_use]
    pub fn from_event(event: &Event, locale: Locale, is_booked: bool) -> Self {
        let (name, category, description, venue, tags) = match event.translation_for(locale) {
            Some(t) => (
                t.name.clone(),
                t.category.clone(),
                t.description.clone(),
                t.venue.clone(),
                t.tags.clone(),
            ),
            None => Default::default(),
        };
        Self {
            id: event.id,
            name,
            category,
            description,
            venue,
            tags,
            image_url: event.image_url.clone(),
            google_map_url: event.google_map_url.clone(),
            date: event.date,
            price: event.price,
            is_booked,
        }
    }
}

/// A booking flattened with its event, resolved for one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingView {
    /// Booking id; absent on the pre-booking confirmation view.
    pub id: Option<BookingId>,
    /// Owner.
    pub user_id: Option<UserId>,
    /// Owner's username, on admin listings.
    pub user_name: Option<String>,
    /// Booked event.
    pub event_id: EventId,
    /// Localized event name.
    pub event_name: String,
    /// Poster image URL.
    pub event_image_url: Option<String>,
    /// Localized event category.
    pub event_category: String,
    /// Localized venue.
    pub event_venue: String,
    /// Event start (UTC).
    pub event_date: DateTime<Utc>,
    /// Unit price.
    #[schema(value_type = String, example = "25.00")]
    pub event_price: Decimal,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Ticket count.
    pub quantity: i32,
    /// `quantity × event_price`.
    #[schema(value_type = String, example = "50.00")]
    pub total_price: Decimal,
    /// When the booking was made.
    pub booking_date: Option<DateTime<Utc>>,
    /// `status == Cancelled`.
    pub is_cancelled: bool,
    /// Last update time of a cancelled booking.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl BookingView {
    /// Builds the view from a booking and its event.
    #[must_use]
    pub fn new(booking: &Booking, event: &Event, locale: Locale) -> Self {
        let mut view = Self::preview(event, booking.quantity, locale);
        let cancelled = booking.status == BookingStatus::Cancelled;
        view.id = Some(booking.id);
        view.user_id = Some(booking.user_id);
        view.user_name = booking.user.as_ref().map(|u| u.username.clone());
        view.status = booking.status;
        view.booking_date = Some(booking.audit.created_at);
        view.is_cancelled = cancelled;
        view.cancelled_at = if cancelled {
            booking.audit.updated_at
        } else {
            None
        };
        view
    }

    /// Builds the view from a booking whose event relation is loaded.
    /// `None` when it is not.
    #[must_use]
    pub fn from_booking(booking: &Booking, locale: Locale) -> Option<Self> {
        booking
            .event
            .as_deref()
            .map(|event| Self::new(booking, event, locale))
    }

    /// Confirmation view shown before a booking exists.
    #[must_use]
    pub fn preview(event: &Event, quantity: i32, locale: Locale) -> Self {
        let view = EventView::from_event(event, locale, false);
        Self {
            id: None,
            user_id: None,
            user_name: None,
            event_id: event.id,
            event_name: view.name,
            event_image_url: view.image_url,
            event_category: view.category,
            event_venue: view.venue,
            event_date: event.date,
            event_price: event.price,
            status: BookingStatus::Pending,
            quantity,
            total_price: event.price.saturating_mul(Decimal::from(quantity)),
            booking_date: None,
            is_cancelled: false,
            cancelled_at: None,
        }
    }
}

/// A page of items with navigation metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaginatedList<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page_index: u32,
    /// `ceil(total_items / page_size)`.
    pub total_pages: u32,
    /// Items across all pages.
    pub total_items: u64,
    /// `page_index > 1`.
    pub has_previous: bool,
    /// `page_index < total_pages`.
    pub has_next: bool,
}

impl<T> PaginatedList<T> {
    /// Wraps one page of `items` out of `total_items`.
    #[must_use]
    pub fn new(items: Vec<T>, total_items: u64, page_index: u32, page_size: u32) -> Self {
        let page_size = u64::from(page_size.max(1));
        let total_pages = u32::try_from(total_items.div_ceil(page_size)).unwrap_or(u32::MAX);
        Self {
            items,
            page_index,
            total_pages,
            total_items,
            has_previous: page_index > 1,
            has_next: page_index < total_pages,
        }
    }
}

/// Landing page: paged upcoming events plus the soonest ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HomePage {
    /// Upcoming events, one page.
    pub upcoming_events: PaginatedList<EventView>,
    /// The two soonest upcoming events.
    pub soonest_events: Vec<EventView>,
}

/// "My bookings" page: paged bookings plus the nearest booked events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BookingsPage {
    /// The caller's bookings, newest first.
    pub user_bookings: PaginatedList<BookingView>,
    /// The two nearest upcoming events the caller has booked.
    pub nearest_events: Vec<EventView>,
}

/// Registration form for an application user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema, Validate)]
pub struct UserForm {
    /// Subject id from the identity provider; minted when absent.
    #[serde(default)]
    pub id: Option<UserId>,
    /// Display name.
    #[validate(length(min = 1, max = 256))]
    pub full_name: String,
    /// Contact e-mail.
    #[validate(email, length(max = 256))]
    pub email: String,
    /// Letters, digits and underscores.
    #[validate(length(min = 1, max = 256), custom(function = "validate_username"))]
    pub username: String,
    /// E.164-like phone number.
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::AuditFields;

    fn form() -> EventForm {
        EventForm {
            id: None,
            date: Utc::now(),
            price: Decimal::new(1500, 2),
            google_map_url: None,
            image_url: None,
            translations: vec![TranslationForm {
                id: None,
                language_code: "en".to_string(),
                name: "Jazz Night".to_string(),
                description: "Live jazz".to_string(),
                category: "Music".to_string(),
                venue: "Hall A".to_string(),
                tags: "jazz".to_string(),
            }],
        }
    }

    #[test]
    fn form_requires_a_translation() {
        let mut f = form();
        assert!(f.validate().is_ok());
        f.translations.clear();
        assert!(f.validate().is_err());
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut f = form();
        f.price = Decimal::new(-1, 0);
        assert!(f.validate().is_err());
        f.price = Decimal::ZERO;
        assert!(f.validate().is_ok());
    }

    #[test]
    fn price_must_fit_the_column() {
        assert_eq!(MAX_PRICE, Decimal::new(999_999_999_999_999_999, 2));
        let mut f = form();
        f.price = MAX_PRICE;
        assert!(f.validate().is_ok());
        f.price = Decimal::new(50, 0) * Decimal::new(1_000_000_000_000_000_000, 0);
        assert!(f.validate().is_err());
        f.price = Decimal::new(12_345, 3);
        assert!(f.validate().is_err());
        f.price = Decimal::new(12_500, 3);
        assert!(f.validate().is_ok());
    }

    #[test]
    fn oversized_totals_saturate() {
        let f = form();
        let event_id = EventId::new();
        let event = Event {
            id: event_id,
            date: f.date,
            price: Decimal::MAX,
            image_url: None,
            google_map_url: None,
            audit: AuditFields::default(),
            translations: f.to_translations(event_id),
            bookings: Vec::new(),
        };
        let view = BookingView::preview(&event, 2, Locale::En);
        assert_eq!(view.total_price, Decimal::MAX);
    }

    #[test]
    fn unsupported_language_is_rejected() {
        let mut f = form();
        if let Some(t) = f.translations.first_mut() {
            t.language_code = "fr".to_string();
        }
        assert!(f.validate().is_err());
    }

    #[test]
    fn duplicate_language_detected() {
        let mut f = form();
        let mut again = f.translations.clone();
        if let Some(t) = again.first_mut() {
            t.language_code = "EN".to_string();
        }
        f.translations.extend(again);
        assert_eq!(f.duplicate_language().as_deref(), Some("en"));
    }

    #[test]
    fn pagination_metadata() {
        let page = PaginatedList::new(vec![1, 2, 3], 13, 2, 6);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous);
        assert!(page.has_next);

        let empty: PaginatedList<i32> = PaginatedList::new(Vec::new(), 0, 1, 6);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn booking_view_computes_totals() {
        let f = form();
        let event_id = EventId::new();
        let event = Event {
            id: event_id,
            date: f.date,
            price: f.price,
            image_url: None,
            google_map_url: None,
            audit: AuditFields::default(),
            translations: f.to_translations(event_id),
            bookings: Vec::new(),
        };
        let mut booking = Booking::pending(UserId::new(), event_id, 3, AuditFields::default());
        let view = BookingView::new(&booking, &event, Locale::Ar);
        assert_eq!(view.total_price, Decimal::new(4500, 2));
        assert_eq!(view.event_name, "Jazz Night");
        assert!(view.cancelled_at.is_none());

        let now = Utc::now();
        assert!(booking.transition_to(BookingStatus::Cancelled, now).is_ok());
        let view = BookingView::new(&booking, &event, Locale::En);
        assert!(view.is_cancelled);
        assert_eq!(view.cancelled_at, Some(now));
    }

    #[test]
    fn user_form_validation() {
        let user = UserForm {
            id: None,
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            username: "jane_doe".to_string(),
            phone: "+201001234567".to_string(),
        };
        assert!(user.validate().is_ok());

        let bad = UserForm {
            username: "jane doe".to_string(),
            email: "not-an-email".to_string(),
            ..user
        };
        let Err(errors) = bad.validate() else {
            panic!("expected validation errors");
        };
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
    }
}
