//! `PostgresStore` against a live database.
//!
//! Ignored by default. Run with:
//! `DATABASE_URL=postgres://... cargo test --test postgres -- --ignored`

#![allow(clippy::panic)]

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use evently::domain::{
    ApplicationUser, AuditFields, Booking, BookingStatus, Event, EventId, EventTranslation, Role,
    TranslationId, UserId,
};
use evently::persistence::{
    BookingInclude, BookingQuery, BookingSort, BookingStore, Change, EntityRef, EventInclude,
    EventQuery, EventStore, PageRequest, PostgresStore, RowScope, Store, UserStore,
};

async fn store() -> PostgresStore {
    let Ok(url) = std::env::var("DATABASE_URL") else {
        panic!("DATABASE_URL must be set");
    };
    let Ok(pool) = PgPoolOptions::new().max_connections(2).connect(&url).await else {
        panic!("cannot connect to {url}");
    };
    let store = PostgresStore::new(pool);
    let Ok(()) = store.migrate().await else {
        panic!("migrations failed");
    };
    store
}

fn user() -> ApplicationUser {
    let suffix = Uuid::new_v4().simple().to_string();
    ApplicationUser {
        id: UserId::new(),
        full_name: "Omar Hassan".to_string(),
        email: "omar@example.com".to_string(),
        username: format!("omar_{}", &suffix[..12]),
        phone: "+201001234567".to_string(),
        role: Role::User,
        created_at: Utc::now(),
    }
}

fn event() -> Event {
    let id = EventId::new();
    let translation = |code: &str, name: &str| EventTranslation {
        id: TranslationId::new(),
        event_id: id,
        language_code: code.to_string(),
        name: name.to_string(),
        description: "Open air".to_string(),
        category: "Music".to_string(),
        venue: "Corniche".to_string(),
        tags: "live".to_string(),
    };
    Event {
        id,
        date: Utc::now() + Duration::days(10),
        price: Decimal::new(12_550, 2),
        image_url: None,
        google_map_url: None,
        audit: AuditFields::default(),
        translations: vec![translation("en", "Concert"), translation("ar", "حفلة")],
        bookings: Vec::new(),
    }
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn commit_round_trips_relations() {
    let store = store().await;
    let omar = user();
    let concert = event();
    let booking = Booking::pending(omar.id, concert.id, 2, AuditFields::default());

    let result = store
        .commit(vec![
            Change::InsertUser(omar.clone()),
            Change::InsertEvent(concert.clone()),
            Change::InsertBooking(booking.clone()),
        ])
        .await;
    assert!(result.is_ok());

    let query = EventQuery::new()
        .by_id(concert.id)
        .include(EventInclude::TRANSLATIONS);
    let Ok(Some(stored)) = store.fetch_events(&query).await.map(|mut v| v.pop()) else {
        panic!("event missing");
    };
    assert_eq!(stored.price, concert.price);
    let codes: Vec<_> = stored.translations.iter().map(|t| t.language_code.as_str()).collect();
    assert_eq!(codes, ["en", "ar"]);

    let Ok(Some(found)) = store.find_user_by_username(&omar.username).await else {
        panic!("user missing");
    };
    assert_eq!(found.id, omar.id);

    let by_id = BookingQuery::new().by_id(booking.id).include(BookingInclude::ALL);
    let Ok(rows) = store.fetch_bookings(&by_id).await else {
        panic!("fetch failed");
    };
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, BookingStatus::Pending);
    assert_eq!(rows[0].user.as_ref().map(|u| u.id), Some(omar.id));
    assert!(rows[0].event.as_ref().is_some_and(|e| e.translations.len() == 2));

    let removed = store
        .commit(vec![Change::HardDelete(EntityRef::Event(concert.id))])
        .await;
    assert!(removed.is_ok());
    let for_event = BookingQuery::new().for_event(concert.id);
    assert_eq!(store.count_bookings(&for_event).await.ok(), Some(0));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn filters_page_and_trash() {
    let store = store().await;
    let omar = user();
    let concert = event();
    let bookings: Vec<_> = (1..=3)
        .map(|q| Booking::pending(omar.id, concert.id, q, AuditFields::default()))
        .collect();

    let mut changes = vec![
        Change::InsertUser(omar.clone()),
        Change::InsertEvent(concert.clone()),
    ];
    changes.extend(bookings.iter().cloned().map(Change::InsertBooking));
    assert!(store.commit(changes).await.is_ok());

    let by_name = BookingQuery::new().username_contains(omar.username.to_uppercase());
    assert_eq!(store.count_bookings(&by_name).await.ok(), Some(3));

    let second_page = BookingQuery::new()
        .for_event(concert.id)
        .sort(BookingSort::CreatedAsc)
        .page(PageRequest::new(2, 2));
    let Ok(page) = store.fetch_bookings(&second_page).await else {
        panic!("fetch failed");
    };
    assert_eq!(page.len(), 1);

    let Some(first) = bookings.first() else {
        panic!("no bookings");
    };
    let trashed = store
        .commit(vec![Change::SoftDelete {
            target: EntityRef::Booking(first.id),
            at: Utc::now(),
        }])
        .await;
    assert!(trashed.is_ok());

    let active = BookingQuery::new().for_event(concert.id);
    assert_eq!(store.count_bookings(&active).await.ok(), Some(2));
    let mut trash = BookingQuery::new().for_event(concert.id);
    trash.scope = RowScope::Trash;
    let Ok(rows) = store.fetch_bookings(&trash).await else {
        panic!("fetch failed");
    };
    assert_eq!(rows.iter().map(|b| b.id).collect::<Vec<_>>(), [first.id]);

    let confirmed = BookingQuery::new()
        .for_event(concert.id)
        .with_status(BookingStatus::Confirmed);
    assert_eq!(store.count_bookings(&confirmed).await.ok(), Some(0));

    assert!(store
        .commit(vec![Change::HardDelete(EntityRef::Event(concert.id))])
        .await
        .is_ok());
}
