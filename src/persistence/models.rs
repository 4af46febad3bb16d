//! Database row types and their conversion into domain entities.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    ApplicationUser, AuditFields, Booking, BookingId, BookingStatus, Event, EventId,
    EventTranslation, Role, TranslationId, UserId,
};
use crate::error::EventlyError;

/// A row from the `events` table.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    /// Primary key.
    pub id: Uuid,
    /// Event start.
    pub date: DateTime<Utc>,
    /// Ticket price.
    pub price: Decimal,
    /// Poster image URL.
    pub image_url: Option<String>,
    /// Map link.
    pub google_map_url: Option<String>,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Self {
            id: EventId::from_uuid(row.id),
            date: row.date,
            price: row.price,
            image_url: row.image_url,
            google_map_url: row.google_map_url,
            audit: AuditFields {
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
                is_deleted: row.is_deleted,
            },
            translations: Vec::new(),
            bookings: Vec::new(),
        }
    }
}

/// A row from the `event_translations` table.
#[derive(Debug, Clone, FromRow)]
pub struct TranslationRow {
    /// Primary key.
    pub id: Uuid,
    /// Owning event.
    pub event_id: Uuid,
    /// Two-letter language code.
    pub language_code: String,
    /// Localized name.
    pub name: String,
    /// Localized description.
    pub description: String,
    /// Localized category.
    pub category: String,
    /// Localized venue.
    pub venue: String,
    /// Localized tags.
    pub tags: String,
}

impl From<TranslationRow> for EventTranslation {
    fn from(row: TranslationRow) -> Self {
        Self {
            id: TranslationId::from_uuid(row.id),
            event_id: EventId::from_uuid(row.event_id),
            language_code: row.language_code,
            name: row.name,
            description: row.description,
            category: row.category,
            venue: row.venue,
            tags: row.tags,
        }
    }
}

/// A row from the `bookings` table.
#[derive(Debug, Clone, FromRow)]
pub struct BookingRow {
    /// Primary key.
    pub id: Uuid,
    /// Owner.
    pub user_id: Uuid,
    /// Booked event.
    pub event_id: Uuid,
    /// Ticket count.
    pub quantity: i32,
    /// Status name (`Pending`, `Confirmed`, `Cancelled`).
    pub status: String,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_deleted: bool,
}

impl TryFrom<BookingRow> for Booking {
    type Error = EventlyError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let status: BookingStatus = row.status.parse().map_err(|_| {
            EventlyError::PersistenceError(format!(
                "booking {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            user_id: UserId::from_uuid(row.user_id),
            event_id: EventId::from_uuid(row.event_id),
            quantity: row.quantity,
            status,
            audit: AuditFields {
                created_at: row.created_at,
                updated_at: row.updated_at,
                deleted_at: row.deleted_at,
                is_deleted: row.is_deleted,
            },
            event: None,
            user: None,
        })
    }
}

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    /// Primary key.
    pub id: Uuid,
    /// Display name.
    pub full_name: String,
    /// Contact e-mail.
    pub email: String,
    /// Unique login name.
    pub username: String,
    /// Contact phone.
    pub phone: String,
    /// Role name (`User`, `Admin`).
    pub role: String,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for ApplicationUser {
    type Error = EventlyError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role: Role = row.role.parse().map_err(|_| {
            EventlyError::PersistenceError(format!("user {} has unknown role '{}'", row.id, row.role))
        })?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            full_name: row.full_name,
            email: row.email,
            username: row.username,
            phone: row.phone,
            role,
            created_at: row.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking_row(status: &str) -> BookingRow {
        BookingRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_id: Uuid::new_v4(),
            quantity: 3,
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
            is_deleted: false,
        }
    }

    #[test]
    fn booking_row_converts() {
        let row = booking_row("Confirmed");
        let id = row.id;
        let booking = Booking::try_from(row);
        assert!(booking.as_ref().is_ok_and(|b| b.status == BookingStatus::Confirmed));
        assert!(booking.is_ok_and(|b| *b.id.as_uuid() == id && b.quantity == 3));
    }

    #[test]
    fn unknown_status_is_a_persistence_error() {
        let result = Booking::try_from(booking_row("Refunded"));
        assert!(matches!(result, Err(EventlyError::PersistenceError(_))));
    }
}
