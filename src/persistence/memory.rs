//! In-process storage backend.
//!
//! [`MemoryStore`] keeps every table in a `HashMap` behind a single
//! [`tokio::sync::RwLock`]. Reads share the lock; [`Store::commit`] takes it
//! exclusively, applies the change list to a copy of the tables and swaps
//! the copy in only when every change succeeded. Used by the test suite and
//! when `PERSISTENCE_ENABLED=false`.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::query::{
    BookingInclude, BookingQuery, BookingSort, EventFilter, EventInclude, EventQuery, EventSort,
    PageRequest,
};
use super::store::{BookingStore, Change, EntityRef, EventStore, Store, UserStore};
use crate::domain::{
    ApplicationUser, Booking, BookingId, Event, EventId, EventTranslation, UserId,
};
use crate::error::EventlyError;

/// Table contents. Relations are never stored inline.
#[derive(Debug, Clone, Default)]
struct Tables {
    events: HashMap<EventId, Event>,
    translations: HashMap<EventId, Vec<EventTranslation>>,
    bookings: HashMap<BookingId, Booking>,
    users: HashMap<UserId, ApplicationUser>,
}

/// Storage backend holding all rows in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<Event>, EventlyError> {
        let tables = self.tables.read().await;
        let selected = paginate(tables.select_events(query), query.page);
        Ok(selected
            .into_iter()
            .map(|event| tables.hydrate_event(event, query.include))
            .collect())
    }

    async fn count_events(&self, query: &EventQuery) -> Result<u64, EventlyError> {
        let tables = self.tables.read().await;
        Ok(tables.select_events(query).len() as u64)
    }
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn fetch_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, EventlyError> {
        let tables = self.tables.read().await;
        let selected = paginate(tables.select_bookings(query), query.page);
        Ok(selected
            .into_iter()
            .map(|booking| tables.hydrate_booking(booking, query.include))
            .collect())
    }

    async fn count_bookings(&self, query: &BookingQuery) -> Result<u64, EventlyError> {
        let tables = self.tables.read().await;
        Ok(tables.select_bookings(query).len() as u64)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: UserId) -> Result<Option<ApplicationUser>, EventlyError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ApplicationUser>, EventlyError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn commit(&self, changes: Vec<Change>) -> Result<(), EventlyError> {
        let mut tables = self.tables.write().await;
        let mut next = tables.clone();
        for change in changes {
            next.apply(change)?;
        }
        *tables = next;
        Ok(())
    }

    async fn ping(&self) -> Result<(), EventlyError> {
        Ok(())
    }
}

impl Tables {
    fn select_events(&self, query: &EventQuery) -> Vec<&Event> {
        let mut events: Vec<&Event> = self
            .events
            .values()
            .filter(|e| query.scope.admits(e.audit.is_deleted))
            .filter(|e| event_matches(e, &query.filter))
            .collect();
        match query.sort {
            EventSort::CreatedAsc => events.sort_by_key(|e| (e.audit.created_at, e.id)),
            EventSort::DateAsc => events.sort_by_key(|e| (e.date, e.audit.created_at, e.id)),
        }
        events
    }

    fn hydrate_event(&self, event: &Event, include: EventInclude) -> Event {
        let mut event = event.clone();
        if include.translations {
            event.translations = self
                .translations
                .get(&event.id)
                .cloned()
                .unwrap_or_default();
        }
        if include.bookings {
            let mut bookings: Vec<Booking> = self
                .bookings
                .values()
                .filter(|b| b.event_id == event.id && !b.audit.is_deleted)
                .cloned()
                .collect();
            bookings.sort_by_key(|b| (b.audit.created_at, b.id));
            event.bookings = bookings;
        }
        event
    }

    fn booking_matches(&self, booking: &Booking, query: &BookingQuery) -> bool {
        let filter = &query.filter;
        if !query.scope.admits(booking.audit.is_deleted)
            || filter.id.is_some_and(|id| booking.id != id)
            || filter.user_id.is_some_and(|id| booking.user_id != id)
            || filter.event_id.is_some_and(|id| booking.event_id != id)
            || filter.status.is_some_and(|s| booking.status != s)
            || filter
                .created_on
                .is_some_and(|d| booking.audit.created_at.date_naive() != d)
        {
            return false;
        }
        if let Some(fragment) = &filter.username_contains {
            let fragment = fragment.to_lowercase();
            let matched = self
                .users
                .get(&booking.user_id)
                .is_some_and(|u| u.username.to_lowercase().contains(&fragment));
            if !matched {
                return false;
            }
        }
        if let Some(from) = filter.event_from_date {
            let matched = self
                .events
                .get(&booking.event_id)
                .is_some_and(|e| e.day() >= from);
            if !matched {
                return false;
            }
        }
        true
    }

    fn select_bookings(&self, query: &BookingQuery) -> Vec<&Booking> {
        let mut bookings: Vec<&Booking> = self
            .bookings
            .values()
            .filter(|b| self.booking_matches(b, query))
            .collect();
        match query.sort {
            BookingSort::CreatedAsc => bookings.sort_by_key(|b| (b.audit.created_at, b.id)),
            BookingSort::CreatedDesc => {
                bookings.sort_by_key(|b| Reverse((b.audit.created_at, b.id)));
            }
            BookingSort::EventDateAsc => bookings.sort_by_key(|b| {
                let date = self.events.get(&b.event_id).map(|e| e.date);
                (date.is_none(), date, b.audit.created_at, b.id)
            }),
        }
        bookings
    }

    fn hydrate_booking(&self, booking: &Booking, include: BookingInclude) -> Booking {
        let mut booking = booking.clone();
        if include.event || include.translations {
            let event_include = EventInclude {
                translations: include.translations,
                bookings: false,
            };
            booking.event = self
                .events
                .get(&booking.event_id)
                .map(|e| Box::new(self.hydrate_event(e, event_include)));
        }
        if include.user {
            booking.user = self.users.get(&booking.user_id).cloned();
        }
        booking
    }

    fn apply(&mut self, change: Change) -> Result<(), EventlyError> {
        match change {
            Change::InsertEvent(mut event) => {
                if self.events.contains_key(&event.id) {
                    return Err(duplicate(EntityRef::Event(event.id)));
                }
                let translations = std::mem::take(&mut event.translations);
                ensure_unique_languages(event.id, &translations)?;
                event.bookings.clear();
                self.translations.insert(event.id, translations);
                self.events.insert(event.id, event);
            }
            Change::UpdateEvent(event) => {
                let stored = self
                    .events
                    .get_mut(&event.id)
                    .ok_or_else(|| missing(EntityRef::Event(event.id)))?;
                stored.date = event.date;
                stored.price = event.price;
                stored.image_url = event.image_url;
                stored.google_map_url = event.google_map_url;
                stored.audit = event.audit;
            }
            Change::ReplaceTranslations {
                event_id,
                translations,
            } => {
                if !self.events.contains_key(&event_id) {
                    return Err(missing(EntityRef::Event(event_id)));
                }
                ensure_unique_languages(event_id, &translations)?;
                self.translations.insert(event_id, translations);
            }
            Change::InsertBooking(mut booking) => {
                if self.bookings.contains_key(&booking.id) {
                    return Err(duplicate(EntityRef::Booking(booking.id)));
                }
                if !self.events.contains_key(&booking.event_id) {
                    return Err(EventlyError::PersistenceError(format!(
                        "foreign key violation: event {} does not exist",
                        booking.event_id
                    )));
                }
                if !self.users.contains_key(&booking.user_id) {
                    return Err(EventlyError::PersistenceError(format!(
                        "foreign key violation: user {} does not exist",
                        booking.user_id
                    )));
                }
                booking.event = None;
                booking.user = None;
                self.bookings.insert(booking.id, booking);
            }
            Change::UpdateBooking(booking) => {
                let stored = self
                    .bookings
                    .get_mut(&booking.id)
                    .ok_or_else(|| missing(EntityRef::Booking(booking.id)))?;
                stored.quantity = booking.quantity;
                stored.status = booking.status;
                stored.audit = booking.audit;
            }
            Change::InsertUser(user) => {
                if self.users.contains_key(&user.id)
                    || self.users.values().any(|u| u.username == user.username)
                {
                    return Err(EventlyError::PersistenceError(format!(
                        "unique violation: user {} / {}",
                        user.id, user.username
                    )));
                }
                self.users.insert(user.id, user);
            }
            Change::SoftDelete { target, at } => {
                let audit = match target {
                    EntityRef::Event(id) => self.events.get_mut(&id).map(|e| &mut e.audit),
                    EntityRef::Booking(id) => self.bookings.get_mut(&id).map(|b| &mut b.audit),
                };
                audit.ok_or_else(|| missing(target))?.mark_deleted(at);
            }
            Change::HardDelete(target) => match target {
                EntityRef::Event(id) => {
                    self.events.remove(&id).ok_or_else(|| missing(target))?;
                    self.translations.remove(&id);
                    self.bookings.retain(|_, b| b.event_id != id);
                }
                EntityRef::Booking(id) => {
                    self.bookings.remove(&id).ok_or_else(|| missing(target))?;
                }
            },
        }
        Ok(())
    }
}

fn event_matches(event: &Event, filter: &EventFilter) -> bool {
    filter.id.is_none_or(|id| event.id == id)
        && filter.on_date.is_none_or(|d| event.day() == d)
        && filter.from_date.is_none_or(|d| event.day() >= d)
}

fn ensure_unique_languages(
    event_id: EventId,
    translations: &[EventTranslation],
) -> Result<(), EventlyError> {
    let mut seen = HashSet::new();
    match translations
        .iter()
        .find(|t| !seen.insert(t.language_code.as_str()))
    {
        Some(dup) => Err(EventlyError::PersistenceError(format!(
            "unique violation: event {event_id} already has a '{}' translation",
            dup.language_code
        ))),
        None => Ok(()),
    }
}

fn paginate<T>(rows: Vec<T>, page: Option<PageRequest>) -> Vec<T> {
    match page {
        None => rows,
        Some(page) => rows
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect(),
    }
}

fn missing(target: EntityRef) -> EventlyError {
    EventlyError::PersistenceError(format!("{target} does not exist"))
}

fn duplicate(target: EntityRef) -> EventlyError {
    EventlyError::PersistenceError(format!("{target} already exists"))
}
