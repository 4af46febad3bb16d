//! Booking service: the booking lifecycle and the booking listings.
//!
//! Status changes go through [`Booking::transition_to`], so the state
//! machine in [`BookingStatus::can_transition_to`] is the only authority on
//! what may follow what. A user cancellation moves the booking to
//! `Cancelled` and removes it through the booking deletion policy, which
//! keeps the row in the trash for auditing.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use super::event_service::EventService;
use super::views::{BookingView, BookingsPage, EventView, PaginatedList};
use crate::domain::{AuditFields, Booking, BookingId, BookingStatus, EventId, Locale, UserId};
use crate::error::EventlyError;
use crate::persistence::{
    BookingInclude, BookingQuery, BookingSort, EventInclude, EventQuery, PageRequest, RowScope,
    Store, UnitOfWork,
};

/// Bookings per page on the "my bookings" page.
pub const USER_PAGE_SIZE: u32 = 6;

/// Bookings per page on the admin listings.
pub const ADMIN_PAGE_SIZE: u32 = 10;

/// Number of nearest booked events shown next to "my bookings".
pub const NEAREST_COUNT: u32 = 2;

/// Admin translations are always resolved in this locale.
const ADMIN_LOCALE: Locale = Locale::En;

/// Conjunctive admin filter over all bookings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminBookingFilter {
    /// Status equality.
    pub status: Option<BookingStatus>,
    /// Case-insensitive substring of the owner's username. Blank means no
    /// filter.
    pub username: Option<String>,
    /// Booking creation day (UTC).
    pub booking_date: Option<NaiveDate>,
}

impl AdminBookingFilter {
    fn to_query(&self) -> BookingQuery {
        let mut query = BookingQuery::new().include(BookingInclude::ALL);
        if let Some(status) = self.status {
            query = query.with_status(status);
        }
        if let Some(name) = self.username.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            query = query.username_contains(name);
        }
        if let Some(day) = self.booking_date {
            query = query.created_on(day);
        }
        query
    }
}

/// Business rules for bookings.
#[derive(Debug, Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
    events: EventService,
}

impl BookingService {
    /// Creates a new `BookingService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, events: EventService) -> Self {
        Self { store, events }
    }

    fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store))
    }

    /// Books `quantity` tickets for `event_id` on behalf of `user_id`.
    ///
    /// The event must exist and take place today or later (time of day is
    /// ignored). No capacity is enforced and the same user may book the
    /// same event more than once.
    ///
    /// # Errors
    ///
    /// - [`EventlyError::InvalidQuantity`] when `quantity < 1`.
    /// - [`EventlyError::EventNotFound`] when the event does not exist.
    /// - [`EventlyError::EventInPast`] when the event day is before today.
    /// - [`EventlyError::UserNotFound`] when the user has no profile.
    pub async fn create_booking(
        &self,
        event_id: EventId,
        user_id: UserId,
        quantity: i32,
        locale: Locale,
    ) -> Result<BookingView, EventlyError> {
        if quantity < 1 {
            return Err(EventlyError::InvalidQuantity(quantity));
        }

        let event = self
            .events
            .get_first_event(
                EventQuery::new()
                    .by_id(event_id)
                    .include(EventInclude::TRANSLATIONS),
            )
            .await?
            .ok_or(EventlyError::EventNotFound(event_id))?;

        let now = Utc::now();
        if !event.is_open_on(now.date_naive()) {
            return Err(EventlyError::EventInPast(event_id));
        }

        let mut uow = self.begin();
        if uow.users().get(user_id).await?.is_none() {
            return Err(EventlyError::UserNotFound(user_id));
        }

        let booking = Booking::pending(user_id, event_id, quantity, AuditFields::created(now));
        uow.bookings().add(booking.clone());
        uow.save_changes().await?;

        tracing::info!(booking_id = %booking.id, %event_id, %user_id, quantity, "booking created");
        Ok(BookingView::new(&booking, &event, locale))
    }

    /// Cancels one of the caller's bookings.
    ///
    /// Returns `false` when the booking does not exist, belongs to someone
    /// else, is already cancelled, or its event is gone or in the past.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn cancel_booking(
        &self,
        booking_id: BookingId,
        user_id: UserId,
    ) -> Result<bool, EventlyError> {
        let mut uow = self.begin();
        let query = BookingQuery::new().by_id(booking_id).for_user(user_id);
        let Some(mut booking) = uow.bookings().get_first(query).await? else {
            return Ok(false);
        };
        if booking.status == BookingStatus::Cancelled {
            return Ok(false);
        }

        let now = Utc::now();
        let event = uow
            .events()
            .get_first(EventQuery::new().by_id(booking.event_id))
            .await?;
        if !event.is_some_and(|e| e.is_open_on(now.date_naive())) {
            return Ok(false);
        }

        booking.transition_to(BookingStatus::Cancelled, now)?;
        uow.bookings().update(booking.clone());
        uow.bookings().remove(&booking);
        uow.save_changes().await?;

        tracing::info!(%booking_id, %user_id, "booking cancelled");
        Ok(true)
    }

    /// The caller's active bookings, resolved for `locale`.
    ///
    /// `include` defaults to the event with its translations; the event is
    /// always loaded since every view needs it.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn get_user_bookings(
        &self,
        user_id: UserId,
        include: Option<BookingInclude>,
        locale: Locale,
    ) -> Result<Vec<BookingView>, EventlyError> {
        let bookings = self
            .fetch_bookings(Self::user_bookings_query(user_id, include))
            .await?;
        Ok(to_views(&bookings, locale))
    }

    /// One of the caller's active bookings, resolved for `locale`.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn get_booking_by_id(
        &self,
        booking_id: BookingId,
        user_id: UserId,
        locale: Locale,
    ) -> Result<Option<BookingView>, EventlyError> {
        let query = Self::user_bookings_query(user_id, None).by_id(booking_id);
        let booking = self.begin().bookings().get_first(query).await?;
        Ok(booking.and_then(|b| BookingView::from_booking(&b, locale)))
    }

    /// Whether `event_id` exists and takes place today or later.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn is_event_available(&self, event_id: EventId) -> Result<bool, EventlyError> {
        let today = Utc::now().date_naive();
        let event = self
            .events
            .get_first_event(EventQuery::new().by_id(event_id))
            .await?;
        Ok(event.is_some_and(|e| e.is_open_on(today)))
    }

    /// Booking confirmation view for one ticket, before any booking exists.
    ///
    /// # Errors
    ///
    /// - [`EventlyError::EventNotFound`] when the event does not exist.
    /// - [`EventlyError::EventInPast`] when it can no longer be booked.
    pub async fn booking_preview(
        &self,
        event_id: EventId,
        locale: Locale,
    ) -> Result<BookingView, EventlyError> {
        let event = self
            .events
            .get_first_event(
                EventQuery::new()
                    .by_id(event_id)
                    .include(EventInclude::TRANSLATIONS),
            )
            .await?
            .ok_or(EventlyError::EventNotFound(event_id))?;
        if !event.is_open_on(Utc::now().date_naive()) {
            return Err(EventlyError::EventInPast(event_id));
        }
        Ok(BookingView::preview(&event, 1, locale))
    }

    /// Query over the caller's active bookings, ready for further
    /// composition (sorting, paging, extra filters) before execution.
    #[must_use]
    pub fn user_bookings_query(user_id: UserId, include: Option<BookingInclude>) -> BookingQuery {
        let mut include = include.unwrap_or(BookingInclude::EVENT);
        include.event = true;
        BookingQuery::new().for_user(user_id).include(include)
    }

    /// Runs a booking query over active bookings.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn fetch_bookings(&self, query: BookingQuery) -> Result<Vec<Booking>, EventlyError> {
        self.begin().bookings().get_all(query).await
    }

    /// Counts the rows a booking query matches.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn count_bookings(&self, query: &BookingQuery) -> Result<u64, EventlyError> {
        self.begin().bookings().count(query).await
    }

    /// "My bookings": the caller's bookings newest first, one page, plus
    /// the nearest upcoming events among them.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn user_bookings_page(
        &self,
        user_id: UserId,
        page_number: u32,
        locale: Locale,
    ) -> Result<BookingsPage, EventlyError> {
        let page = PageRequest::new(page_number, USER_PAGE_SIZE);
        let base = Self::user_bookings_query(user_id, None);

        let total = self.count_bookings(&base).await?;
        let bookings = self
            .fetch_bookings(base.clone().sort(BookingSort::CreatedDesc).page(page))
            .await?;
        let nearest = self
            .fetch_bookings(
                base.event_from_date(Utc::now().date_naive())
                    .sort(BookingSort::EventDateAsc)
                    .take(NEAREST_COUNT),
            )
            .await?;

        Ok(BookingsPage {
            user_bookings: PaginatedList::new(
                to_views(&bookings, locale),
                total,
                page.number,
                page.size,
            ),
            nearest_events: nearest
                .iter()
                .filter_map(|b| b.event.as_deref())
                .map(|e| EventView::from_event(e, locale, true))
                .collect(),
        })
    }

    /// Admin listing over all users' active bookings, ten per page, with
    /// totals and owner names. Translations are resolved in English.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn get_bookings_with_filters(
        &self,
        filter: &AdminBookingFilter,
        page_number: u32,
    ) -> Result<PaginatedList<BookingView>, EventlyError> {
        let page = PageRequest::new(page_number, ADMIN_PAGE_SIZE);
        let query = filter.to_query();
        let mut uow = self.begin();

        let total = uow.bookings().count(&query).await?;
        let bookings = uow.bookings().get_all(query.page(page)).await?;
        Ok(PaginatedList::new(
            to_views(&bookings, ADMIN_LOCALE),
            total,
            page.number,
            page.size,
        ))
    }

    /// Admin audit view over cancelled (soft-deleted) bookings, newest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn get_trashed_bookings(
        &self,
        page_number: u32,
    ) -> Result<PaginatedList<BookingView>, EventlyError> {
        let page = PageRequest::new(page_number, ADMIN_PAGE_SIZE);
        let mut query = BookingQuery::new()
            .include(BookingInclude::ALL)
            .sort(BookingSort::CreatedDesc);
        query.scope = RowScope::Trash;

        let mut uow = self.begin();
        let total = uow.bookings().count(&query).await?;
        let bookings = uow.bookings().get_all_trash(query.page(page)).await?;
        Ok(PaginatedList::new(
            to_views(&bookings, ADMIN_LOCALE),
            total,
            page.number,
            page.size,
        ))
    }

    /// Admin status change. Returns `false` when there is no such active
    /// booking. Setting the current status again only refreshes
    /// `updated_at`.
    ///
    /// # Errors
    ///
    /// - [`EventlyError::InvalidTransition`] when the state machine forbids
    ///   the change (anything leaving `Cancelled`, `Confirmed` back to
    ///   `Pending`).
    /// - Persistence failures.
    pub async fn update_booking_status(
        &self,
        id: BookingId,
        status: BookingStatus,
    ) -> Result<bool, EventlyError> {
        let mut uow = self.begin();
        let Some(mut booking) = uow.bookings().get_first(BookingQuery::new().by_id(id)).await?
        else {
            return Ok(false);
        };

        let from = booking.status;
        booking.transition_to(status, Utc::now())?;
        uow.bookings().update(booking);
        uow.save_changes().await?;

        tracing::info!(booking_id = %id, %from, to = %status, "booking status updated");
        Ok(true)
    }
}

fn to_views(bookings: &[Booking], locale: Locale) -> Vec<BookingView> {
    bookings
        .iter()
        .filter_map(|b| BookingView::from_booking(b, locale))
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::domain::{ApplicationUser, Event, EventTranslation, Role, TranslationId};
    use crate::persistence::{Change, MemoryStore};
    use chrono::Duration;
    use rust_decimal::Decimal;

    struct Fixture {
        svc: BookingService,
        store: Arc<dyn Store>,
        alice: UserId,
        bob: UserId,
    }

    fn user(name: &str) -> ApplicationUser {
        ApplicationUser {
            id: UserId::new(),
            full_name: name.to_string(),
            email: format!("{name}@example.com"),
            username: name.to_string(),
            phone: "+15550100".to_string(),
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    async fn fixture() -> Fixture {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let events = EventService::new(Arc::clone(&store));
        let svc = BookingService::new(Arc::clone(&store), events);
        let alice = user("alice");
        let bob = user("bob_the_builder");
        let ids = (alice.id, bob.id);
        let committed = store
            .commit(vec![Change::InsertUser(alice), Change::InsertUser(bob)])
            .await;
        assert!(committed.is_ok());
        Fixture {
            svc,
            store,
            alice: ids.0,
            bob: ids.1,
        }
    }

    async fn add_event(store: &Arc<dyn Store>, days_from_now: i64, codes: &[&str]) -> EventId {
        let id = EventId::new();
        let event = Event {
            id,
            date: Utc::now() + Duration::days(days_from_now),
            price: Decimal::new(1250, 2),
            image_url: None,
            google_map_url: None,
            audit: AuditFields::default(),
            translations: codes
                .iter()
                .map(|code| EventTranslation {
                    id: TranslationId::new(),
                    event_id: id,
                    language_code: (*code).to_string(),
                    name: format!("event-{code}"),
                    description: String::new(),
                    category: format!("category-{code}"),
                    venue: format!("venue-{code}"),
                    tags: String::new(),
                })
                .collect(),
            bookings: Vec::new(),
        };
        assert!(store.commit(vec![Change::InsertEvent(event)]).await.is_ok());
        id
    }

    /// Inserts a booking directly, bypassing the date check.
    async fn add_booking(store: &Arc<dyn Store>, user: UserId, event: EventId) -> BookingId {
        let booking = Booking::pending(user, event, 1, AuditFields::default());
        let id = booking.id;
        assert!(store.commit(vec![Change::InsertBooking(booking)]).await.is_ok());
        id
    }

    #[tokio::test]
    async fn create_persists_one_pending_booking() {
        let f = fixture().await;
        let event = add_event(&f.store, 0, &["en", "ar"]).await;

        let Ok(view) = f.svc.create_booking(event, f.alice, 3, Locale::Ar).await else {
            panic!("booking failed");
        };
        assert_eq!(view.status, BookingStatus::Pending);
        assert_eq!(view.quantity, 3);
        assert_eq!(view.event_name, "event-ar");
        assert_eq!(view.total_price, Decimal::new(3750, 2));

        let Ok(stored) = f.svc.fetch_bookings(BookingQuery::new()).await else {
            panic!("fetch failed");
        };
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].quantity, 3);
        assert_eq!(stored[0].status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn create_rejects_bad_requests() {
        let f = fixture().await;
        let past = add_event(&f.store, -1, &["en"]).await;
        let future = add_event(&f.store, 2, &["en"]).await;

        assert!(matches!(
            f.svc.create_booking(past, f.alice, 1, Locale::En).await,
            Err(EventlyError::EventInPast(_))
        ));
        assert!(matches!(
            f.svc.create_booking(EventId::new(), f.alice, 1, Locale::En).await,
            Err(EventlyError::EventNotFound(_))
        ));
        assert!(matches!(
            f.svc.create_booking(future, f.alice, 0, Locale::En).await,
            Err(EventlyError::InvalidQuantity(0))
        ));
        assert!(matches!(
            f.svc.create_booking(future, UserId::new(), 1, Locale::En).await,
            Err(EventlyError::UserNotFound(_))
        ));
        assert_eq!(f.svc.count_bookings(&BookingQuery::new()).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn duplicate_bookings_are_allowed() {
        let f = fixture().await;
        let event = add_event(&f.store, 1, &["en"]).await;
        assert!(f.svc.create_booking(event, f.alice, 1, Locale::En).await.is_ok());
        assert!(f.svc.create_booking(event, f.alice, 1, Locale::En).await.is_ok());
        let query = BookingService::user_bookings_query(f.alice, None);
        assert_eq!(f.svc.count_bookings(&query).await.ok(), Some(2));
    }

    #[tokio::test]
    async fn cancel_hides_booking_and_keeps_it_in_trash() {
        let f = fixture().await;
        let event = add_event(&f.store, 2, &["en"]).await;
        let Ok(view) = f.svc.create_booking(event, f.alice, 2, Locale::En).await else {
            panic!("booking failed");
        };
        let Some(id) = view.id else {
            panic!("booking id missing");
        };

        assert_eq!(f.svc.cancel_booking(id, f.alice).await.ok(), Some(true));
        assert_eq!(
            f.svc.get_booking_by_id(id, f.alice, Locale::En).await.ok(),
            Some(None)
        );
        let Ok(mine) = f.svc.get_user_bookings(f.alice, None, Locale::En).await else {
            panic!("list failed");
        };
        assert!(mine.is_empty());

        let Ok(trash) = f.svc.get_trashed_bookings(1).await else {
            panic!("trash failed");
        };
        assert_eq!(trash.items.len(), 1);
        assert_eq!(trash.items[0].status, BookingStatus::Cancelled);
        assert!(trash.items[0].cancelled_at.is_some());

        assert_eq!(f.svc.cancel_booking(id, f.alice).await.ok(), Some(false));
    }

    #[tokio::test]
    async fn cancel_returns_false_when_not_allowed() {
        let f = fixture().await;
        let future = add_event(&f.store, 2, &["en"]).await;
        let past = add_event(&f.store, -1, &["en"]).await;
        let mine = add_booking(&f.store, f.alice, future).await;
        let old = add_booking(&f.store, f.alice, past).await;

        assert_eq!(f.svc.cancel_booking(mine, f.bob).await.ok(), Some(false));
        assert_eq!(f.svc.cancel_booking(BookingId::new(), f.alice).await.ok(), Some(false));
        assert_eq!(f.svc.cancel_booking(old, f.alice).await.ok(), Some(false));
        assert_eq!(f.svc.count_bookings(&BookingQuery::new()).await.ok(), Some(2));
    }

    #[tokio::test]
    async fn past_event_scenario() {
        let f = fixture().await;
        let yesterday = add_event(&f.store, -1, &["en"]).await;
        let existing = add_booking(&f.store, f.alice, yesterday).await;

        assert_eq!(f.svc.is_event_available(yesterday).await.ok(), Some(false));
        assert!(f.svc.create_booking(yesterday, f.alice, 1, Locale::En).await.is_err());
        assert_eq!(f.svc.cancel_booking(existing, f.alice).await.ok(), Some(false));
        assert!(matches!(
            f.svc.booking_preview(yesterday, Locale::En).await,
            Err(EventlyError::EventInPast(_))
        ));
    }

    #[tokio::test]
    async fn user_bookings_fall_back_to_first_translation() {
        let f = fixture().await;
        let event = add_event(&f.store, 1, &["en"]).await;
        let _ = add_booking(&f.store, f.alice, event).await;
        let _ = add_booking(&f.store, f.bob, event).await;

        let Ok(mine) = f.svc.get_user_bookings(f.alice, None, Locale::Ar).await else {
            panic!("list failed");
        };
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].event_name, "event-en");
        assert_eq!(mine[0].event_venue, "venue-en");
    }

    #[tokio::test]
    async fn user_page_orders_and_pages() {
        let f = fixture().await;
        let later = add_event(&f.store, 9, &["en"]).await;
        let sooner = add_event(&f.store, 1, &["en"]).await;
        for _ in 0..4 {
            let _ = add_booking(&f.store, f.alice, later).await;
        }
        for _ in 0..3 {
            let _ = add_booking(&f.store, f.alice, sooner).await;
        }

        let Ok(page) = f.svc.user_bookings_page(f.alice, 2, Locale::En).await else {
            panic!("page failed");
        };
        assert_eq!(page.user_bookings.total_items, 7);
        assert_eq!(page.user_bookings.total_pages, 2);
        assert_eq!(page.user_bookings.items.len(), 1);
        assert_eq!(page.nearest_events.len(), 2);
        assert_eq!(page.nearest_events[0].id, sooner);
    }

    #[tokio::test]
    async fn admin_filters_combine() {
        let f = fixture().await;
        let event = add_event(&f.store, 1, &["ar", "en"]).await;
        for _ in 0..12 {
            let _ = add_booking(&f.store, f.alice, event).await;
        }
        let bobs = add_booking(&f.store, f.bob, event).await;
        assert_eq!(
            f.svc.update_booking_status(bobs, BookingStatus::Cancelled).await.ok(),
            Some(true)
        );

        let Ok(all) = f.svc.get_bookings_with_filters(&AdminBookingFilter::default(), 1).await
        else {
            panic!("filter failed");
        };
        assert_eq!(all.items.len(), 10);
        assert_eq!(all.total_items, 13);
        assert!(all.items.iter().all(|b| b.event_name == "event-en"));
        assert!(
            all.items
                .iter()
                .all(|b| b.total_price == b.event_price * Decimal::from(b.quantity))
        );

        let cancelled = AdminBookingFilter {
            status: Some(BookingStatus::Cancelled),
            ..AdminBookingFilter::default()
        };
        let Ok(rows) = f.svc.get_bookings_with_filters(&cancelled, 1).await else {
            panic!("filter failed");
        };
        assert_eq!(rows.items.len(), 1);
        assert!(rows.items.iter().all(|b| b.status == BookingStatus::Cancelled));
        assert_eq!(rows.items[0].user_name.as_deref(), Some("bob_the_builder"));

        let by_name = AdminBookingFilter {
            username: Some("BUILDER".to_string()),
            booking_date: Some(Utc::now().date_naive()),
            ..AdminBookingFilter::default()
        };
        let Ok(rows) = f.svc.get_bookings_with_filters(&by_name, 1).await else {
            panic!("filter failed");
        };
        assert_eq!(rows.total_items, 1);
    }

    #[tokio::test]
    async fn status_updates_follow_state_machine() {
        let f = fixture().await;
        let event = add_event(&f.store, 1, &["en"]).await;
        let id = add_booking(&f.store, f.alice, event).await;

        assert_eq!(
            f.svc.update_booking_status(id, BookingStatus::Confirmed).await.ok(),
            Some(true)
        );
        let Ok(Some(view)) = f.svc.get_booking_by_id(id, f.alice, Locale::En).await else {
            panic!("booking missing");
        };
        assert_eq!(view.status, BookingStatus::Confirmed);

        assert!(matches!(
            f.svc.update_booking_status(id, BookingStatus::Pending).await,
            Err(EventlyError::InvalidTransition { .. })
        ));
        assert_eq!(
            f.svc.update_booking_status(BookingId::new(), BookingStatus::Confirmed).await.ok(),
            Some(false)
        );
    }
}
