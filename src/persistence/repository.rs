//! Per-entity repositories borrowed from a [`UnitOfWork`](super::UnitOfWork).
//!
//! Reads hit the store immediately. Every mutation (`add`, `update`,
//! `remove`, ...) is only staged; nothing is written until
//! [`UnitOfWork::save_changes`](super::UnitOfWork::save_changes).
//!
//! `remove` never picks between soft and hard deletion itself: it applies
//! the entity type's [`Deletable::POLICY`].

use chrono::{DateTime, Utc};

use super::query::{BookingQuery, EventQuery, RowScope};
use super::store::{Change, EntityRef, Store};
use crate::domain::{
    ApplicationUser, Booking, Deletable, DeletionPolicy, Event, EventId, EventTranslation, UserId,
};
use crate::error::EventlyError;

/// Stages the deletion of `target` according to `T`'s policy.
fn stage_removal<T: Deletable>(staged: &mut Vec<Change>, target: EntityRef, at: DateTime<Utc>) {
    let change = match T::POLICY {
        DeletionPolicy::Soft => Change::SoftDelete { target, at },
        DeletionPolicy::Hard => Change::HardDelete(target),
    };
    tracing::debug!(%target, kind = change.kind(), "removal staged");
    staged.push(change);
}

/// Event repository.
#[derive(Debug)]
pub struct EventRepository<'a> {
    store: &'a dyn Store,
    staged: &'a mut Vec<Change>,
}

impl<'a> EventRepository<'a> {
    pub(super) fn new(store: &'a dyn Store, staged: &'a mut Vec<Change>) -> Self {
        Self { store, staged }
    }

    /// Active events matching `query`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_all(&self, mut query: EventQuery) -> Result<Vec<Event>, EventlyError> {
        query.scope = RowScope::Active;
        self.store.fetch_events(&query).await
    }

    /// Soft-deleted events matching `query`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_all_trash(&self, mut query: EventQuery) -> Result<Vec<Event>, EventlyError> {
        query.scope = RowScope::Trash;
        self.store.fetch_events(&query).await
    }

    /// First active event matching `query`, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_first(&self, query: EventQuery) -> Result<Option<Event>, EventlyError> {
        Ok(self.get_all(query.take(1)).await?.into_iter().next())
    }

    /// Number of rows `query` matches in its scope, ignoring its page.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn count(&self, query: &EventQuery) -> Result<u64, EventlyError> {
        self.store.count_events(query).await
    }

    /// Stages an insert of `event` and its translations.
    pub fn add(&mut self, event: Event) {
        self.staged.push(Change::InsertEvent(event));
    }

    /// Stages an update of the event's scalar and audit columns.
    pub fn update(&mut self, event: Event) {
        self.staged.push(Change::UpdateEvent(event));
    }

    /// Stages a full replacement of the event's translations.
    pub fn replace_translations(&mut self, event_id: EventId, translations: Vec<EventTranslation>) {
        self.staged.push(Change::ReplaceTranslations {
            event_id,
            translations,
        });
    }

    /// Stages the removal of `event`.
    pub fn remove(&mut self, event: &Event) {
        stage_removal::<Event>(self.staged, EntityRef::Event(event.id), Utc::now());
    }
}

/// Booking repository.
#[derive(Debug)]
pub struct BookingRepository<'a> {
    store: &'a dyn Store,
    staged: &'a mut Vec<Change>,
}

impl<'a> BookingRepository<'a> {
    pub(super) fn new(store: &'a dyn Store, staged: &'a mut Vec<Change>) -> Self {
        Self { store, staged }
    }

    /// Active bookings matching `query`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_all(&self, mut query: BookingQuery) -> Result<Vec<Booking>, EventlyError> {
        query.scope = RowScope::Active;
        self.store.fetch_bookings(&query).await
    }

    /// Soft-deleted bookings matching `query`.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_all_trash(
        &self,
        mut query: BookingQuery,
    ) -> Result<Vec<Booking>, EventlyError> {
        query.scope = RowScope::Trash;
        self.store.fetch_bookings(&query).await
    }

    /// First active booking matching `query`, if any.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_first(&self, query: BookingQuery) -> Result<Option<Booking>, EventlyError> {
        Ok(self.get_all(query.take(1)).await?.into_iter().next())
    }

    /// Number of rows `query` matches in its scope, ignoring its page.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn count(&self, query: &BookingQuery) -> Result<u64, EventlyError> {
        self.store.count_bookings(query).await
    }

    /// Stages an insert of `booking`.
    pub fn add(&mut self, booking: Booking) {
        self.staged.push(Change::InsertBooking(booking));
    }

    /// Stages an update of quantity, status and audit columns.
    pub fn update(&mut self, booking: Booking) {
        self.staged.push(Change::UpdateBooking(booking));
    }

    /// Stages the removal of `booking`.
    pub fn remove(&mut self, booking: &Booking) {
        stage_removal::<Booking>(self.staged, EntityRef::Booking(booking.id), Utc::now());
    }
}

/// User repository.
#[derive(Debug)]
pub struct UserRepository<'a> {
    store: &'a dyn Store,
    staged: &'a mut Vec<Change>,
}

impl<'a> UserRepository<'a> {
    pub(super) fn new(store: &'a dyn Store, staged: &'a mut Vec<Change>) -> Self {
        Self { store, staged }
    }

    /// User by id.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get(&self, id: UserId) -> Result<Option<ApplicationUser>, EventlyError> {
        self.store.find_user(id).await
    }

    /// User by exact username.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn get_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ApplicationUser>, EventlyError> {
        self.store.find_user_by_username(username).await
    }

    /// Stages an insert of `user`.
    pub fn add(&mut self, user: ApplicationUser) {
        self.staged.push(Change::InsertUser(user));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_follows_entity_policy() {
        let mut staged = Vec::new();
        let event_id = EventId::new();
        let now = Utc::now();

        stage_removal::<Event>(&mut staged, EntityRef::Event(event_id), now);
        stage_removal::<Booking>(
            &mut staged,
            EntityRef::Booking(crate::domain::BookingId::new()),
            now,
        );

        assert!(matches!(
            staged.first(),
            Some(Change::HardDelete(EntityRef::Event(id))) if *id == event_id
        ));
        assert!(matches!(
            staged.get(1),
            Some(Change::SoftDelete { target: EntityRef::Booking(_), at }) if *at == now
        ));
    }
}
