//! Bookings and the booking status state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::audit::{AuditFields, Deletable, DeletionPolicy};
use super::{ApplicationUser, BookingId, Event, EventId, UserId};
use crate::error::EventlyError;

/// Lifecycle state of a booking.
///
/// ```text
/// Pending ──► Confirmed
///    │            │
///    └──► Cancelled ◄┘
/// ```
///
/// `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum BookingStatus {
    /// Created, awaiting confirmation.
    #[default]
    Pending,
    /// Confirmed by an administrator.
    Confirmed,
    /// Cancelled by the user or an administrator.
    Cancelled,
}

impl BookingStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Pending, Self::Confirmed, Self::Cancelled];

    /// Wire / storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Whether a booking in `self` may move to `next`.
    ///
    /// Re-applying the current status is allowed and only refreshes the
    /// update timestamp.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, _)
                | (Self::Confirmed, Self::Confirmed | Self::Cancelled)
                | (Self::Cancelled, Self::Cancelled)
        )
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = EventlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| EventlyError::InvalidStatus(s.to_string()))
    }
}

/// A user's reservation of tickets for an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking identifier.
    pub id: BookingId,
    /// Owner.
    pub user_id: UserId,
    /// Booked event.
    pub event_id: EventId,
    /// Number of tickets, at least 1.
    pub quantity: i32,
    /// Lifecycle state.
    pub status: BookingStatus,
    /// Audit and soft-delete bookkeeping.
    pub audit: AuditFields,
    /// Booked event, when loaded.
    pub event: Option<Box<Event>>,
    /// Owner profile, when loaded.
    pub user: Option<ApplicationUser>,
}

impl Booking {
    /// New pending booking with no relations loaded.
    #[must_use]
    pub fn pending(
        user_id: UserId,
        event_id: EventId,
        quantity: i32,
        audit: AuditFields,
    ) -> Self {
        Self {
            id: BookingId::new(),
            user_id,
            event_id,
            quantity,
            status: BookingStatus::Pending,
            audit,
            event: None,
            user: None,
        }
    }

    /// Moves the booking to `next`, stamping the update time.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::InvalidTransition`] when the state machine
    /// forbids the move.
    pub fn transition_to(
        &mut self,
        next: BookingStatus,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), EventlyError> {
        if !self.status.can_transition_to(next) {
            return Err(EventlyError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.audit.touch(now);
        Ok(())
    }
}

impl Deletable for Booking {
    const POLICY: DeletionPolicy = DeletionPolicy::Soft;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "confirmed".parse::<BookingStatus>().ok(),
            Some(BookingStatus::Confirmed)
        );
        assert!("Refunded".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn cancelled_is_terminal() {
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Pending));
        assert!(!BookingStatus::Cancelled.can_transition_to(BookingStatus::Confirmed));
        assert!(BookingStatus::Cancelled.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn confirmed_cannot_go_back_to_pending() {
        assert!(!BookingStatus::Confirmed.can_transition_to(BookingStatus::Pending));
        assert!(BookingStatus::Confirmed.can_transition_to(BookingStatus::Cancelled));
    }

    #[test]
    fn transition_stamps_updated_at() {
        let now = Utc::now();
        let mut booking = Booking::pending(UserId::new(), EventId::new(), 2, AuditFields::created(now));
        assert!(booking.transition_to(BookingStatus::Confirmed, now).is_ok());
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.audit.updated_at, Some(now));
    }

    #[test]
    fn rejected_transition_leaves_booking_untouched() {
        let now = Utc::now();
        let mut booking = Booking::pending(UserId::new(), EventId::new(), 1, AuditFields::created(now));
        booking.status = BookingStatus::Cancelled;

        let result = booking.transition_to(BookingStatus::Confirmed, now);
        assert!(matches!(result, Err(EventlyError::InvalidTransition { .. })));
        assert_eq!(booking.status, BookingStatus::Cancelled);
        assert!(booking.audit.updated_at.is_none());
    }
}
