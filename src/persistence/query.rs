//! Explicit query values for the storage seam.
//!
//! Instead of passing predicates, callers build an [`EventQuery`] or a
//! [`BookingQuery`] (filter + scope + relations + sort + page) and hand it
//! to a repository. Queries are plain data: they can be composed further by
//! the caller before execution and both storage backends interpret them the
//! same way.

use std::str::FromStr;

use chrono::NaiveDate;

use crate::domain::{BookingId, BookingStatus, EventId, UserId};
use crate::error::EventlyError;

/// Which rows a query sees with respect to the soft-delete flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowScope {
    /// Rows that are not soft-deleted.
    #[default]
    Active,
    /// Soft-deleted rows only.
    Trash,
}

impl RowScope {
    /// Whether a row with the given soft-delete flag is in scope.
    #[must_use]
    pub const fn admits(self, is_deleted: bool) -> bool {
        match self {
            Self::Active => !is_deleted,
            Self::Trash => is_deleted,
        }
    }
}

/// 1-based page slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub number: u32,
    /// Rows per page, at least 1.
    pub size: u32,
}

impl PageRequest {
    /// Creates a page request, clamping both values to at least 1.
    #[must_use]
    pub fn new(number: u32, size: u32) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }

    /// Rows to skip: `(number - 1) * size`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.number.saturating_sub(1)) * u64::from(self.size)
    }

    /// Rows to take.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.size)
    }
}

/// Relations to load alongside events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventInclude {
    /// Load [`crate::domain::EventTranslation`] rows.
    pub translations: bool,
    /// Load active bookings.
    pub bookings: bool,
}

impl EventInclude {
    /// Translations only, the common case for anything user facing.
    pub const TRANSLATIONS: Self = Self {
        translations: true,
        bookings: false,
    };
}

impl FromStr for EventInclude {
    type Err = EventlyError;

    /// Parses a comma-separated relation list such as
    /// `"translations,bookings"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut include = Self::default();
        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "translations" | "eventtranslations" => include.translations = true,
                "bookings" => include.bookings = true,
                other => {
                    return Err(EventlyError::InvalidRequest(format!(
                        "unknown event relation: {other}"
                    )));
                }
            }
        }
        Ok(include)
    }
}

/// Relations to load alongside bookings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookingInclude {
    /// Load the booked event.
    pub event: bool,
    /// Load the booked event's translations (implies `event`).
    pub translations: bool,
    /// Load the owner profile.
    pub user: bool,
}

impl BookingInclude {
    /// Event with translations, enough to render a booking.
    pub const EVENT: Self = Self {
        event: true,
        translations: true,
        user: false,
    };

    /// Everything, used by the admin listing.
    pub const ALL: Self = Self {
        event: true,
        translations: true,
        user: true,
    };
}

impl FromStr for BookingInclude {
    type Err = EventlyError;

    /// Parses a comma-separated relation list such as
    /// `"event,event.translations,user"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut include = Self::default();
        for name in s.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "event" => include.event = true,
                "event.translations" | "event.eventtranslations" => {
                    include.event = true;
                    include.translations = true;
                }
                "user" => include.user = true,
                other => {
                    return Err(EventlyError::InvalidRequest(format!(
                        "unknown booking relation: {other}"
                    )));
                }
            }
        }
        Ok(include)
    }
}

/// Conjunctive event filter. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Exact id.
    pub id: Option<EventId>,
    /// Event takes place on this calendar day (UTC).
    pub on_date: Option<NaiveDate>,
    /// Event takes place on or after this calendar day (UTC).
    pub from_date: Option<NaiveDate>,
}

/// Event ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventSort {
    /// Oldest created first.
    #[default]
    CreatedAsc,
    /// Soonest event date first.
    DateAsc,
}

/// A composable event query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventQuery {
    /// Row filter.
    pub filter: EventFilter,
    /// Soft-delete scope.
    pub scope: RowScope,
    /// Relations to load.
    pub include: EventInclude,
    /// Ordering.
    pub sort: EventSort,
    /// Optional page slice.
    pub page: Option<PageRequest>,
}

impl EventQuery {
    /// Unfiltered query over active events.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a single event.
    #[must_use]
    pub fn by_id(mut self, id: EventId) -> Self {
        self.filter.id = Some(id);
        self
    }

    /// Restricts to events on `date`.
    #[must_use]
    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.filter.on_date = Some(date);
        self
    }

    /// Restricts to events on or after `date`.
    #[must_use]
    pub fn from_date(mut self, date: NaiveDate) -> Self {
        self.filter.from_date = Some(date);
        self
    }

    /// Sets the relations to load.
    #[must_use]
    pub fn include(mut self, include: EventInclude) -> Self {
        self.include = include;
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sort(mut self, sort: EventSort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page slice.
    #[must_use]
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Same query restricted to the first `n` rows.
    #[must_use]
    pub fn take(self, n: u32) -> Self {
        self.page(PageRequest::new(1, n))
    }
}

/// Conjunctive booking filter. Unset fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    /// Exact id.
    pub id: Option<BookingId>,
    /// Owner.
    pub user_id: Option<UserId>,
    /// Booked event.
    pub event_id: Option<EventId>,
    /// Status equality.
    pub status: Option<BookingStatus>,
    /// Case-insensitive substring of the owner's username.
    pub username_contains: Option<String>,
    /// Booking was created on this calendar day (UTC).
    pub created_on: Option<NaiveDate>,
    /// Booked event takes place on or after this calendar day (UTC).
    pub event_from_date: Option<NaiveDate>,
}

/// Booking ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingSort {
    /// Oldest booking first.
    #[default]
    CreatedAsc,
    /// Newest booking first.
    CreatedDesc,
    /// Soonest booked event first.
    EventDateAsc,
}

/// A composable booking query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingQuery {
    /// Row filter.
    pub filter: BookingFilter,
    /// Soft-delete scope.
    pub scope: RowScope,
    /// Relations to load.
    pub include: BookingInclude,
    /// Ordering.
    pub sort: BookingSort,
    /// Optional page slice.
    pub page: Option<PageRequest>,
}

impl BookingQuery {
    /// Unfiltered query over active bookings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to a single booking.
    #[must_use]
    pub fn by_id(mut self, id: BookingId) -> Self {
        self.filter.id = Some(id);
        self
    }

    /// Restricts to bookings owned by `user_id`.
    #[must_use]
    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.filter.user_id = Some(user_id);
        self
    }

    /// Restricts to bookings of `event_id`.
    #[must_use]
    pub fn for_event(mut self, event_id: EventId) -> Self {
        self.filter.event_id = Some(event_id);
        self
    }

    /// Restricts to bookings in `status`.
    #[must_use]
    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.filter.status = Some(status);
        self
    }

    /// Restricts to owners whose username contains `fragment`.
    #[must_use]
    pub fn username_contains(mut self, fragment: impl Into<String>) -> Self {
        self.filter.username_contains = Some(fragment.into());
        self
    }

    /// Restricts to bookings created on `date`.
    #[must_use]
    pub fn created_on(mut self, date: NaiveDate) -> Self {
        self.filter.created_on = Some(date);
        self
    }

    /// Restricts to bookings whose event is on or after `date`.
    #[must_use]
    pub fn event_from_date(mut self, date: NaiveDate) -> Self {
        self.filter.event_from_date = Some(date);
        self
    }

    /// Sets the relations to load.
    #[must_use]
    pub fn include(mut self, include: BookingInclude) -> Self {
        self.include = include;
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sort(mut self, sort: BookingSort) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the page slice.
    #[must_use]
    pub fn page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Same query restricted to the first `n` rows.
    #[must_use]
    pub fn take(self, n: u32) -> Self {
        self.page(PageRequest::new(1, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset_is_one_based() {
        assert_eq!(PageRequest::new(1, 10).offset(), 0);
        assert_eq!(PageRequest::new(3, 10).offset(), 20);
        assert_eq!(PageRequest::new(0, 0), PageRequest::new(1, 1));
    }

    #[test]
    fn parses_event_relations() {
        let include: Result<EventInclude, _> = "EventTranslations, Bookings".parse();
        assert_eq!(
            include.ok(),
            Some(EventInclude {
                translations: true,
                bookings: true
            })
        );
        assert!("speakers".parse::<EventInclude>().is_err());
        assert_eq!("".parse::<EventInclude>().ok(), Some(EventInclude::default()));
    }

    #[test]
    fn nested_translation_relation_implies_event() {
        let include: Result<BookingInclude, _> = "event.translations".parse();
        assert_eq!(include.ok(), Some(BookingInclude::EVENT));
    }

    #[test]
    fn scope_admits_rows() {
        assert!(RowScope::Active.admits(false));
        assert!(!RowScope::Active.admits(true));
        assert!(RowScope::Trash.admits(true));
    }

    #[test]
    fn builders_compose() {
        let user = UserId::new();
        let query = BookingQuery::new()
            .for_user(user)
            .sort(BookingSort::CreatedDesc)
            .take(2);
        assert_eq!(query.filter.user_id, Some(user));
        assert_eq!(query.page, Some(PageRequest::new(1, 2)));
        assert_eq!(query.scope, RowScope::Active);
    }
}
