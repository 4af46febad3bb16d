//! Storage seam: narrow per-entity read traits and one atomic write.
//!
//! Reads go straight to the backend. Writes are expressed as a list of
//! [`Change`]s that [`Store::commit`] applies in a single transaction: all
//! of them or none.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::query::{BookingQuery, EventQuery};
use crate::domain::{
    ApplicationUser, Booking, BookingId, Event, EventId, EventTranslation, UserId,
};
use crate::error::EventlyError;

/// Row targeted by a delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    /// An event (cascades to translations and bookings when hard-deleted).
    Event(EventId),
    /// A booking.
    Booking(BookingId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(id) => write!(f, "event {id}"),
            Self::Booking(id) => write!(f, "booking {id}"),
        }
    }
}

/// One staged mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    /// Insert an event together with its translations.
    InsertEvent(Event),
    /// Overwrite an event's scalar and audit columns.
    UpdateEvent(Event),
    /// Replace the whole translation set of an event.
    ReplaceTranslations {
        /// Owning event.
        event_id: EventId,
        /// New set, in display order.
        translations: Vec<EventTranslation>,
    },
    /// Insert a booking. Loaded relations are ignored.
    InsertBooking(Booking),
    /// Overwrite a booking's quantity, status and audit columns.
    UpdateBooking(Booking),
    /// Insert a user profile.
    InsertUser(ApplicationUser),
    /// Flag a row as deleted.
    SoftDelete {
        /// Target row.
        target: EntityRef,
        /// Deletion timestamp.
        at: DateTime<Utc>,
    },
    /// Physically remove a row.
    HardDelete(EntityRef),
}

impl Change {
    /// Short name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InsertEvent(_) => "insert_event",
            Self::UpdateEvent(_) => "update_event",
            Self::ReplaceTranslations { .. } => "replace_translations",
            Self::InsertBooking(_) => "insert_booking",
            Self::UpdateBooking(_) => "update_booking",
            Self::InsertUser(_) => "insert_user",
            Self::SoftDelete { .. } => "soft_delete",
            Self::HardDelete(_) => "hard_delete",
        }
    }
}

/// Event reads.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Events matching `query`, with the requested relations loaded.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] on backend failure.
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<Event>, EventlyError>;

    /// Number of events matching `query`, ignoring its page slice.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] on backend failure.
    async fn count_events(&self, query: &EventQuery) -> Result<u64, EventlyError>;
}

/// Booking reads.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Bookings matching `query`, with the requested relations loaded.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] on backend failure.
    async fn fetch_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, EventlyError>;

    /// Number of bookings matching `query`, ignoring its page slice.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] on backend failure.
    async fn count_bookings(&self, query: &BookingQuery) -> Result<u64, EventlyError>;
}

/// User reads.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// User by id.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] on backend failure.
    async fn find_user(&self, id: UserId) -> Result<Option<ApplicationUser>, EventlyError>;

    /// User by exact username.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] on backend failure.
    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ApplicationUser>, EventlyError>;
}

/// A complete storage backend.
#[async_trait]
pub trait Store: EventStore + BookingStore + UserStore + fmt::Debug {
    /// Applies `changes` atomically, in order.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] if any change fails (a
    /// missing target row, a constraint violation, a backend failure). In
    /// that case nothing is persisted.
    async fn commit(&self, changes: Vec<Change>) -> Result<(), EventlyError>;

    /// Checks that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] when it is not.
    async fn ping(&self) -> Result<(), EventlyError>;
}
