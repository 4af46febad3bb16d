//! Single access point to every service.

use std::sync::Arc;

use super::{BookingService, EventService, UserService};
use crate::error::EventlyError;
use crate::persistence::{Store, UnitOfWork};

/// Bundles the services over one shared store.
///
/// Each service opens and commits its own [`UnitOfWork`] per call. Callers
/// that need several repository operations in one transaction open one with
/// [`begin`](Self::begin) and commit it with
/// [`save_changes`](Self::save_changes).
#[derive(Debug, Clone)]
pub struct ServicesProvider {
    store: Arc<dyn Store>,
    events: EventService,
    bookings: BookingService,
    users: UserService,
}

impl ServicesProvider {
    /// Wires every service to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        let events = EventService::new(Arc::clone(&store));
        let bookings = BookingService::new(Arc::clone(&store), events.clone());
        let users = UserService::new(Arc::clone(&store));
        Self {
            store,
            events,
            bookings,
            users,
        }
    }

    /// Event operations.
    #[must_use]
    pub fn events(&self) -> &EventService {
        &self.events
    }

    /// Booking operations.
    #[must_use]
    pub fn bookings(&self) -> &BookingService {
        &self.bookings
    }

    /// User operations.
    #[must_use]
    pub fn users(&self) -> &UserService {
        &self.users
    }

    /// Opens a unit of work over the shared store.
    #[must_use]
    pub fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store))
    }

    /// Commits a unit of work obtained from [`begin`](Self::begin).
    ///
    /// # Errors
    ///
    /// Returns the store's error if the transaction fails.
    pub async fn save_changes(&self, uow: &mut UnitOfWork) -> Result<usize, EventlyError> {
        uow.save_changes().await
    }

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns the store's error when it is not.
    pub async fn ping(&self) -> Result<(), EventlyError> {
        self.store.ping().await
    }
}
