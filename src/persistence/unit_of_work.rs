//! Unit of work: a batch of staged changes committed as one transaction.

use std::sync::Arc;

use super::repository::{BookingRepository, EventRepository, UserRepository};
use super::store::{Change, Store};
use crate::error::EventlyError;

/// Groups repository operations and commits them atomically.
///
/// Obtain one per logical operation, stage changes through
/// [`events`](Self::events), [`bookings`](Self::bookings) and
/// [`users`](Self::users), then call [`save_changes`](Self::save_changes).
/// Dropping a unit of work with staged changes discards them.
#[derive(Debug)]
pub struct UnitOfWork {
    store: Arc<dyn Store>,
    staged: Vec<Change>,
}

impl UnitOfWork {
    /// Opens an empty unit of work over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            staged: Vec::new(),
        }
    }

    /// Event repository bound to this unit of work.
    pub fn events(&mut self) -> EventRepository<'_> {
        EventRepository::new(self.store.as_ref(), &mut self.staged)
    }

    /// Booking repository bound to this unit of work.
    pub fn bookings(&mut self) -> BookingRepository<'_> {
        BookingRepository::new(self.store.as_ref(), &mut self.staged)
    }

    /// User repository bound to this unit of work.
    pub fn users(&mut self) -> UserRepository<'_> {
        UserRepository::new(self.store.as_ref(), &mut self.staged)
    }

    /// Number of staged, uncommitted changes.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    /// Commits every staged change in one transaction and returns how many
    /// were applied. Nothing staged means nothing to do.
    ///
    /// The staged list is consumed either way: after an error the unit of
    /// work is empty and the store is unchanged.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the transaction fails.
    pub async fn save_changes(&mut self) -> Result<usize, EventlyError> {
        if self.staged.is_empty() {
            return Ok(0);
        }
        let changes = std::mem::take(&mut self.staged);
        let count = changes.len();
        self.store.commit(changes).await?;
        Ok(count)
    }
}

impl Drop for UnitOfWork {
    fn drop(&mut self) {
        if !self.staged.is_empty() {
            tracing::debug!(discarded = self.staged.len(), "unit of work dropped with unsaved changes");
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::{AuditFields, Event, EventId, EventTranslation, TranslationId};
    use crate::persistence::memory::MemoryStore;
    use crate::persistence::query::EventQuery;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn event() -> Event {
        let id = EventId::new();
        Event {
            id,
            date: Utc::now(),
            price: Decimal::ZERO,
            image_url: None,
            google_map_url: None,
            audit: AuditFields::default(),
            translations: vec![EventTranslation {
                id: TranslationId::new(),
                event_id: id,
                language_code: "en".to_string(),
                name: "Expo".to_string(),
                description: String::new(),
                category: String::new(),
                venue: String::new(),
                tags: String::new(),
            }],
            bookings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn nothing_is_visible_before_save() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut uow = UnitOfWork::new(Arc::clone(&store));
        uow.events().add(event());
        assert_eq!(uow.pending(), 1);

        let Ok(before) = uow.events().count(&EventQuery::new()).await else {
            panic!("count failed");
        };
        assert_eq!(before, 0);

        let Ok(saved) = uow.save_changes().await else {
            panic!("save failed");
        };
        assert_eq!(saved, 1);
        assert_eq!(uow.pending(), 0);
        assert_eq!(store.count_events(&EventQuery::new()).await.ok(), Some(1));
    }

    #[tokio::test]
    async fn saving_nothing_is_a_no_op() {
        let mut uow = UnitOfWork::new(Arc::new(MemoryStore::new()));
        assert_eq!(uow.save_changes().await.ok(), Some(0));
    }

    #[tokio::test]
    async fn dropped_unit_of_work_discards_changes() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        {
            let mut uow = UnitOfWork::new(Arc::clone(&store));
            uow.events().add(event());
        }
        assert_eq!(store.count_events(&EventQuery::new()).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn failed_save_leaves_store_and_uow_empty() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let mut uow = UnitOfWork::new(Arc::clone(&store));
        let ok = event();
        let missing = event();
        uow.events().add(ok);
        uow.events().remove(&missing);

        assert!(uow.save_changes().await.is_err());
        assert_eq!(uow.pending(), 0);
        assert_eq!(store.count_events(&EventQuery::new()).await.ok(), Some(0));
    }
}
