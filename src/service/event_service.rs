//! Event service: event CRUD and the public event listings.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use validator::Validate;

use super::views::{EventForm, EventView, HomePage, PaginatedList};
use crate::domain::{AuditFields, Event, EventId, Locale, UserId};
use crate::error::EventlyError;
use crate::persistence::{
    BookingQuery, EventInclude, EventQuery, EventSort, PageRequest, Store, UnitOfWork,
};

/// Events per page on the landing page.
pub const HOME_PAGE_SIZE: u32 = 6;

/// Number of "soonest" events shown next to the landing page.
pub const SOONEST_COUNT: u32 = 2;

/// Business rules for events.
///
/// Stateless: every call opens its own [`UnitOfWork`] over the shared store
/// and commits it before returning.
#[derive(Debug, Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
}

impl EventService {
    /// Creates a new `EventService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    fn begin(&self) -> UnitOfWork {
        UnitOfWork::new(Arc::clone(&self.store))
    }

    /// Validates and stores a new event with its translations. Returns the
    /// form with the generated event id set.
    ///
    /// # Errors
    ///
    /// - [`EventlyError::Validation`] for field errors (no translation,
    ///   negative price, unsupported language, empty text).
    /// - [`EventlyError::InvalidRequest`] when a language appears twice.
    /// - Persistence failures.
    pub async fn create_event(&self, mut form: EventForm) -> Result<EventForm, EventlyError> {
        check_form(&form)?;

        let now = Utc::now();
        let id = EventId::new();
        let event = Event {
            id,
            date: form.date,
            price: form.price,
            image_url: form.image_url.clone(),
            google_map_url: form.google_map_url.clone(),
            audit: AuditFields::created(now),
            translations: form.to_translations(id),
            bookings: Vec::new(),
        };
        sync_translation_ids(&mut form, &event);

        let mut uow = self.begin();
        uow.events().add(event);
        uow.save_changes().await?;

        tracing::info!(event_id = %id, "event created");
        form.id = Some(id);
        Ok(form)
    }

    /// Overwrites an event's date, price and links, and replaces its whole
    /// translation set. Translation ids sent by the caller are ignored and
    /// new ones are minted; the returned form carries them.
    ///
    /// # Errors
    ///
    /// - [`EventlyError::InvalidRequest`] when `form.id` is missing or a
    ///   language appears twice.
    /// - [`EventlyError::Validation`] for field errors.
    /// - [`EventlyError::EventNotFound`] when the event does not exist.
    pub async fn update_event(&self, mut form: EventForm) -> Result<EventForm, EventlyError> {
        let id = form
            .id
            .ok_or_else(|| EventlyError::InvalidRequest("event id is required".to_string()))?;
        check_form(&form)?;

        let mut uow = self.begin();
        let mut event = uow
            .events()
            .get_first(EventQuery::new().by_id(id).include(EventInclude::TRANSLATIONS))
            .await?
            .ok_or(EventlyError::EventNotFound(id))?;

        event.date = form.date;
        event.price = form.price;
        event.google_map_url = form.google_map_url.clone();
        event.image_url = form.image_url.clone();
        event.audit.touch(Utc::now());
        event.translations = form.to_translations(id);
        sync_translation_ids(&mut form, &event);

        let translations = std::mem::take(&mut event.translations);
        uow.events().update(event);
        uow.events().replace_translations(id, translations);
        uow.save_changes().await?;

        tracing::info!(event_id = %id, "event updated");
        Ok(form)
    }

    /// Deletes an event with its translations and bookings. Returns `false`
    /// when there is no such event.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn delete_event(&self, id: EventId) -> Result<bool, EventlyError> {
        let mut uow = self.begin();
        let Some(event) = uow.events().get_first(EventQuery::new().by_id(id)).await? else {
            return Ok(false);
        };
        uow.events().remove(&event);
        uow.save_changes().await?;

        tracing::info!(event_id = %id, "event deleted");
        Ok(true)
    }

    /// Active events matching `query`.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn get_all_events(&self, query: EventQuery) -> Result<Vec<Event>, EventlyError> {
        self.begin().events().get_all(query).await
    }

    /// First active event matching `query`.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn get_first_event(&self, query: EventQuery) -> Result<Option<Event>, EventlyError> {
        self.begin().events().get_first(query).await
    }

    /// Number of events matching `query`.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn count_events(&self, query: &EventQuery) -> Result<u64, EventlyError> {
        self.begin().events().count(query).await
    }

    /// Projects an event (translations loaded) into its edit form.
    #[must_use]
    pub fn map_event_to_update_view_model(event: &Event) -> EventForm {
        EventForm::from_event(event)
    }

    /// Events on or after `today`, soonest first, with translations.
    #[must_use]
    pub fn upcoming_events_query(today: NaiveDate) -> EventQuery {
        EventQuery::new()
            .from_date(today)
            .include(EventInclude::TRANSLATIONS)
            .sort(EventSort::DateAsc)
    }

    /// One event resolved for `locale`, flagged when `viewer` has booked it.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn event_details(
        &self,
        id: EventId,
        viewer: Option<UserId>,
        locale: Locale,
    ) -> Result<Option<EventView>, EventlyError> {
        let mut uow = self.begin();
        let query = EventQuery::new()
            .by_id(id)
            .include(EventInclude::TRANSLATIONS);
        let Some(event) = uow.events().get_first(query).await? else {
            return Ok(None);
        };
        let is_booked = match viewer {
            Some(user_id) => {
                let query = BookingQuery::new().for_user(user_id).for_event(id);
                uow.bookings().count(&query).await? > 0
            }
            None => false,
        };
        Ok(Some(EventView::from_event(&event, locale, is_booked)))
    }

    /// Landing page: one page of upcoming events plus the soonest ones,
    /// each flagged when `viewer` has booked it.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn home_page(
        &self,
        viewer: Option<UserId>,
        page_number: u32,
        locale: Locale,
    ) -> Result<HomePage, EventlyError> {
        let mut uow = self.begin();
        let page = PageRequest::new(page_number, HOME_PAGE_SIZE);
        let upcoming = Self::upcoming_events_query(Utc::now().date_naive());

        let total = uow.events().count(&upcoming).await?;
        let events = uow.events().get_all(upcoming.clone().page(page)).await?;
        let soonest = uow.events().get_all(upcoming.take(SOONEST_COUNT)).await?;

        let booked: HashSet<EventId> = match viewer {
            Some(user_id) => uow
                .bookings()
                .get_all(BookingQuery::new().for_user(user_id))
                .await?
                .into_iter()
                .map(|b| b.event_id)
                .collect(),
            None => HashSet::new(),
        };
        let view = |e: &Event| EventView::from_event(e, locale, booked.contains(&e.id));

        Ok(HomePage {
            upcoming_events: PaginatedList::new(
                events.iter().map(view).collect(),
                total,
                page.number,
                page.size,
            ),
            soonest_events: soonest.iter().map(view).collect(),
        })
    }
}

fn check_form(form: &EventForm) -> Result<(), EventlyError> {
    form.validate()?;
    if let Some(code) = form.duplicate_language() {
        return Err(EventlyError::InvalidRequest(format!(
            "duplicate translation for language '{code}'"
        )));
    }
    Ok(())
}

fn sync_translation_ids(form: &mut EventForm, event: &Event) {
    for (entry, stored) in form.translations.iter_mut().zip(&event.translations) {
        entry.id = Some(stored.id);
        entry.language_code.clone_from(&stored.language_code);
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::persistence::{Change, MemoryStore, RowScope};
    use crate::service::views::TranslationForm;
    use chrono::{DateTime, Duration};
    use rust_decimal::Decimal;

    fn translation(code: &str, name: &str) -> TranslationForm {
        TranslationForm {
            id: None,
            language_code: code.to_string(),
            name: name.to_string(),
            description: "desc".to_string(),
            category: "Music".to_string(),
            venue: "Hall".to_string(),
            tags: "live".to_string(),
        }
    }

    fn form(date: DateTime<Utc>) -> EventForm {
        EventForm {
            id: None,
            date,
            price: Decimal::new(2000, 2),
            google_map_url: None,
            image_url: Some("/images/events/a.png".to_string()),
            translations: vec![translation("en", "Concert"), translation("ar", "حفلة")],
        }
    }

    fn service() -> (EventService, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        (EventService::new(Arc::clone(&store)), store)
    }

    #[tokio::test]
    async fn create_assigns_id_and_persists_translations() {
        let (svc, _) = service();
        let Ok(created) = svc.create_event(form(Utc::now())).await else {
            panic!("create failed");
        };
        let Some(id) = created.id else {
            panic!("id not set");
        };
        assert!(created.translations.iter().all(|t| t.id.is_some()));

        let query = EventQuery::new().by_id(id).include(EventInclude::TRANSLATIONS);
        let Ok(Some(event)) = svc.get_first_event(query).await else {
            panic!("event not stored");
        };
        assert_eq!(event.translations.len(), 2);
        assert_eq!(event.translations[1].name, "حفلة");
    }

    #[tokio::test]
    async fn create_rejects_invalid_forms() {
        let (svc, _) = service();
        let mut empty = form(Utc::now());
        empty.translations.clear();
        assert!(matches!(
            svc.create_event(empty).await,
            Err(EventlyError::Validation(_))
        ));

        let mut duplicated = form(Utc::now());
        duplicated.translations[1].language_code = "en".to_string();
        assert!(matches!(
            svc.create_event(duplicated).await,
            Err(EventlyError::InvalidRequest(_))
        ));
        assert_eq!(svc.count_events(&EventQuery::new()).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn update_replaces_translation_set() {
        let (svc, _) = service();
        let Ok(created) = svc.create_event(form(Utc::now())).await else {
            panic!("create failed");
        };
        let old_ids: Vec<_> = created.translations.iter().filter_map(|t| t.id).collect();

        let mut edit = created.clone();
        edit.price = Decimal::new(3000, 2);
        edit.translations = vec![translation("en", "Concert II")];
        let Ok(updated) = svc.update_event(edit).await else {
            panic!("update failed");
        };
        assert!(updated.translations.iter().all(|t| t.id.is_some()));

        let Some(id) = created.id else {
            panic!("id not set");
        };
        let query = EventQuery::new().by_id(id).include(EventInclude::TRANSLATIONS);
        let Ok(Some(event)) = svc.get_first_event(query).await else {
            panic!("event missing");
        };
        assert_eq!(event.price, Decimal::new(3000, 2));
        assert_eq!(event.translations.len(), 1);
        assert_eq!(event.translations[0].name, "Concert II");
        assert!(!old_ids.contains(&event.translations[0].id));
        assert!(event.audit.updated_at.is_some());
    }

    #[tokio::test]
    async fn update_unknown_event_is_not_found() {
        let (svc, _) = service();
        let mut missing = form(Utc::now());
        missing.id = Some(EventId::new());
        assert!(matches!(
            svc.update_event(missing).await,
            Err(EventlyError::EventNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_cascades() {
        let (svc, store) = service();
        let Ok(created) = svc.create_event(form(Utc::now())).await else {
            panic!("create failed");
        };
        let Some(id) = created.id else {
            panic!("id not set");
        };

        assert_eq!(svc.delete_event(id).await.ok(), Some(true));
        assert_eq!(svc.delete_event(id).await.ok(), Some(false));

        let mut everything = EventQuery::new();
        everything.scope = RowScope::Trash;
        assert_eq!(store.count_events(&everything).await.ok(), Some(0));
    }

    #[tokio::test]
    async fn home_page_lists_only_upcoming_events() {
        let (svc, _) = service();
        for days in [-2, 1, 3, 5] {
            let _ = svc.create_event(form(Utc::now() + Duration::days(days))).await;
        }

        let Ok(page) = svc.home_page(None, 1, Locale::Ar).await else {
            panic!("home page failed");
        };
        assert_eq!(page.upcoming_events.total_items, 3);
        assert_eq!(page.soonest_events.len(), 2);
        assert!(page.soonest_events[0].date <= page.soonest_events[1].date);
        assert_eq!(page.soonest_events[0].name, "حفلة");
        assert!(page.upcoming_events.items.iter().all(|e| !e.is_booked));
    }

    #[tokio::test]
    async fn details_flag_events_booked_by_viewer() {
        let (svc, store) = service();
        let Ok(created) = svc.create_event(form(Utc::now() + Duration::days(1))).await else {
            panic!("create failed");
        };
        let Some(id) = created.id else {
            panic!("id not set");
        };
        let user = crate::domain::ApplicationUser {
            id: UserId::new(),
            full_name: "Sam".to_string(),
            email: "sam@example.com".to_string(),
            username: "sam".to_string(),
            phone: "+15550100".to_string(),
            role: crate::domain::Role::User,
            created_at: Utc::now(),
        };
        let booking =
            crate::domain::Booking::pending(user.id, id, 1, AuditFields::created(Utc::now()));
        let committed = store
            .commit(vec![Change::InsertUser(user.clone()), Change::InsertBooking(booking)])
            .await;
        assert!(committed.is_ok());

        let Ok(Some(view)) = svc.event_details(id, Some(user.id), Locale::En).await else {
            panic!("details failed");
        };
        assert!(view.is_booked);
        assert_eq!(view.name, "Concert");

        let Ok(Some(anonymous)) = svc.event_details(id, None, Locale::En).await else {
            panic!("details failed");
        };
        assert!(!anonymous.is_booked);
    }
}
