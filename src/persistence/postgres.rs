//! PostgreSQL implementation of the storage seam.
//!
//! Reads are built with [`sqlx::QueryBuilder`] from the explicit query
//! values in [`super::query`]; the same WHERE clause feeds both the row
//! fetch and the `COUNT(*)`. Relations are loaded with one extra
//! `= ANY($1)` query per relation instead of per row.
//!
//! [`Store::commit`] runs the whole change list inside one transaction.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgQueryResult};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::models::{BookingRow, EventRow, TranslationRow, UserRow};
use super::query::{
    BookingInclude, BookingQuery, BookingSort, EventInclude, EventQuery, EventSort, PageRequest,
    RowScope,
};
use super::store::{BookingStore, Change, EntityRef, EventStore, Store, UserStore};
use crate::config::AppConfig;
use crate::domain::{ApplicationUser, Booking, Event, EventId, EventTranslation, UserId};
use crate::error::EventlyError;

const EVENT_COLUMNS: &str = "e.id, e.date, e.price, e.image_url, e.google_map_url, \
     e.created_at, e.updated_at, e.deleted_at, e.is_deleted";

const BOOKING_COLUMNS: &str = "b.id, b.user_id, b.event_id, b.quantity, b.status, \
     b.created_at, b.updated_at, b.deleted_at, b.is_deleted";

const BOOKING_FROM: &str = " FROM bookings b \
     JOIN users u ON u.id = b.user_id \
     JOIN events e ON e.id = b.event_id";

const USER_COLUMNS: &str = "id, full_name, email, username, phone, role, created_at";

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Wraps an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] if the database cannot be
    /// reached within the configured timeout.
    pub async fn connect(config: &AppConfig) -> Result<Self, EventlyError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
            .connect(&config.database_url)
            .await
            .map_err(|e| EventlyError::PersistenceError(format!("failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Applies pending migrations from `./migrations`.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::PersistenceError`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), EventlyError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| EventlyError::PersistenceError(format!("migration failed: {e}")))
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_translations(
        &self,
        events: &mut [Event],
    ) -> Result<(), EventlyError> {
        let ids: Vec<Uuid> = events.iter().map(|e| *e.id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, TranslationRow>(
            "SELECT id, event_id, language_code, name, description, category, venue, tags \
             FROM event_translations WHERE event_id = ANY($1) ORDER BY event_id, position",
        )
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<EventId, Vec<EventTranslation>> = HashMap::new();
        for row in rows {
            let translation = EventTranslation::from(row);
            by_event
                .entry(translation.event_id)
                .or_default()
                .push(translation);
        }
        for event in events {
            event.translations = by_event.remove(&event.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn load_event_bookings(&self, events: &mut [Event]) -> Result<(), EventlyError> {
        let ids: Vec<Uuid> = events.iter().map(|e| *e.id.as_uuid()).collect();
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings b \
             WHERE b.event_id = ANY($1) AND NOT b.is_deleted ORDER BY b.created_at, b.id"
        ))
        .bind(ids.as_slice())
        .fetch_all(&self.pool)
        .await?;

        let mut by_event: HashMap<EventId, Vec<Booking>> = HashMap::new();
        for row in rows {
            let booking = Booking::try_from(row)?;
            by_event.entry(booking.event_id).or_default().push(booking);
        }
        for event in events {
            event.bookings = by_event.remove(&event.id).unwrap_or_default();
        }
        Ok(())
    }

    async fn load_event_relations(
        &self,
        events: &mut [Event],
        include: EventInclude,
    ) -> Result<(), EventlyError> {
        if events.is_empty() {
            return Ok(());
        }
        if include.translations {
            self.load_translations(events).await?;
        }
        if include.bookings {
            self.load_event_bookings(events).await?;
        }
        Ok(())
    }

    async fn load_booking_relations(
        &self,
        bookings: &mut [Booking],
        include: BookingInclude,
    ) -> Result<(), EventlyError> {
        if bookings.is_empty() {
            return Ok(());
        }

        if include.event || include.translations {
            let mut ids: Vec<Uuid> = bookings.iter().map(|b| *b.event_id.as_uuid()).collect();
            ids.sort_unstable();
            ids.dedup();
            let rows = sqlx::query_as::<_, EventRow>(&format!(
                "SELECT {EVENT_COLUMNS} FROM events e WHERE e.id = ANY($1)"
            ))
            .bind(ids.as_slice())
            .fetch_all(&self.pool)
            .await?;
            let mut events: Vec<Event> = rows.into_iter().map(Event::from).collect();
            let event_include = EventInclude {
                translations: include.translations,
                bookings: false,
            };
            self.load_event_relations(&mut events, event_include).await?;

            let by_id: HashMap<EventId, Event> = events.into_iter().map(|e| (e.id, e)).collect();
            for booking in bookings.iter_mut() {
                booking.event = by_id.get(&booking.event_id).cloned().map(Box::new);
            }
        }

        if include.user {
            let mut ids: Vec<Uuid> = bookings.iter().map(|b| *b.user_id.as_uuid()).collect();
            ids.sort_unstable();
            ids.dedup();
            let rows = sqlx::query_as::<_, UserRow>(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"
            ))
            .bind(ids.as_slice())
            .fetch_all(&self.pool)
            .await?;
            let mut by_id: HashMap<UserId, ApplicationUser> = HashMap::new();
            for row in rows {
                let user = ApplicationUser::try_from(row)?;
                by_id.insert(user.id, user);
            }
            for booking in bookings.iter_mut() {
                booking.user = by_id.get(&booking.user_id).cloned();
            }
        }
        Ok(())
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, scope: RowScope) {
    qb.push(format!(" WHERE {alias}.is_deleted = "));
    qb.push_bind(scope == RowScope::Trash);
}

fn push_event_filter(qb: &mut QueryBuilder<'_, Postgres>, query: &EventQuery) {
    push_scope(qb, "e", query.scope);
    let filter = &query.filter;
    if let Some(id) = filter.id {
        qb.push(" AND e.id = ").push_bind(*id.as_uuid());
    }
    if let Some(day) = filter.on_date {
        qb.push(" AND (e.date AT TIME ZONE 'UTC')::date = ")
            .push_bind(day);
    }
    if let Some(day) = filter.from_date {
        qb.push(" AND (e.date AT TIME ZONE 'UTC')::date >= ")
            .push_bind(day);
    }
}

fn push_event_order(qb: &mut QueryBuilder<'_, Postgres>, sort: EventSort) {
    qb.push(match sort {
        EventSort::CreatedAsc => " ORDER BY e.created_at, e.id",
        EventSort::DateAsc => " ORDER BY e.date, e.created_at, e.id",
    });
}

fn push_booking_filter(qb: &mut QueryBuilder<'_, Postgres>, query: &BookingQuery) {
    push_scope(qb, "b", query.scope);
    let filter = &query.filter;
    if let Some(id) = filter.id {
        qb.push(" AND b.id = ").push_bind(*id.as_uuid());
    }
    if let Some(user_id) = filter.user_id {
        qb.push(" AND b.user_id = ").push_bind(*user_id.as_uuid());
    }
    if let Some(event_id) = filter.event_id {
        qb.push(" AND b.event_id = ").push_bind(*event_id.as_uuid());
    }
    if let Some(status) = filter.status {
        qb.push(" AND b.status = ").push_bind(status.as_str());
    }
    if let Some(fragment) = &filter.username_contains {
        qb.push(" AND strpos(lower(u.username), lower(")
            .push_bind(fragment.clone())
            .push(")) > 0");
    }
    if let Some(day) = filter.created_on {
        qb.push(" AND (b.created_at AT TIME ZONE 'UTC')::date = ")
            .push_bind(day);
    }
    if let Some(day) = filter.event_from_date {
        qb.push(" AND (e.date AT TIME ZONE 'UTC')::date >= ")
            .push_bind(day);
    }
}

fn push_booking_order(qb: &mut QueryBuilder<'_, Postgres>, sort: BookingSort) {
    qb.push(match sort {
        BookingSort::CreatedAsc => " ORDER BY b.created_at, b.id",
        BookingSort::CreatedDesc => " ORDER BY b.created_at DESC, b.id DESC",
        BookingSort::EventDateAsc => " ORDER BY e.date, b.created_at, b.id",
    });
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, page: Option<PageRequest>) {
    if let Some(page) = page {
        qb.push(" LIMIT ")
            .push_bind(i64::try_from(page.limit()).unwrap_or(i64::MAX))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
    }
}

fn count_from(total: i64) -> u64 {
    u64::try_from(total).unwrap_or(0)
}

#[async_trait]
impl EventStore for PostgresStore {
    async fn fetch_events(&self, query: &EventQuery) -> Result<Vec<Event>, EventlyError> {
        let mut qb = QueryBuilder::new(format!("SELECT {EVENT_COLUMNS} FROM events e"));
        push_event_filter(&mut qb, query);
        push_event_order(&mut qb, query.sort);
        push_page(&mut qb, query.page);

        let rows: Vec<EventRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut events: Vec<Event> = rows.into_iter().map(Event::from).collect();
        self.load_event_relations(&mut events, query.include).await?;
        Ok(events)
    }

    async fn count_events(&self, query: &EventQuery) -> Result<u64, EventlyError> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM events e");
        push_event_filter(&mut qb, query);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count_from(total))
    }
}

#[async_trait]
impl BookingStore for PostgresStore {
    async fn fetch_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, EventlyError> {
        let mut qb = QueryBuilder::new(format!("SELECT {BOOKING_COLUMNS}{BOOKING_FROM}"));
        push_booking_filter(&mut qb, query);
        push_booking_order(&mut qb, query.sort);
        push_page(&mut qb, query.page);

        let rows: Vec<BookingRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        let mut bookings = rows
            .into_iter()
            .map(Booking::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.load_booking_relations(&mut bookings, query.include).await?;
        Ok(bookings)
    }

    async fn count_bookings(&self, query: &BookingQuery) -> Result<u64, EventlyError> {
        let mut qb = QueryBuilder::new(format!("SELECT COUNT(*){BOOKING_FROM}"));
        push_booking_filter(&mut qb, query);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count_from(total))
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn find_user(&self, id: UserId) -> Result<Option<ApplicationUser>, EventlyError> {
        sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await?
            .map(ApplicationUser::try_from)
            .transpose()
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<ApplicationUser>, EventlyError> {
        sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?
        .map(ApplicationUser::try_from)
        .transpose()
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn commit(&self, changes: Vec<Change>) -> Result<(), EventlyError> {
        let count = changes.len();
        let mut tx = self.pool.begin().await.map_err(|e| {
            EventlyError::PersistenceError(format!("failed to start transaction: {e}"))
        })?;
        for change in changes {
            let kind = change.kind();
            apply(&mut *tx, change).await.inspect_err(|e| {
                tracing::warn!(change = kind, error = %e, "rolling back transaction");
            })?;
        }
        tx.commit().await.map_err(|e| {
            EventlyError::PersistenceError(format!("failed to commit transaction: {e}"))
        })?;
        tracing::debug!(changes = count, "transaction committed");
        Ok(())
    }

    async fn ping(&self) -> Result<(), EventlyError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn target_row(target: EntityRef) -> (&'static str, Uuid) {
    match target {
        EntityRef::Event(id) => ("events", *id.as_uuid()),
        EntityRef::Booking(id) => ("bookings", *id.as_uuid()),
    }
}

fn ensure_affected(result: &PgQueryResult, target: EntityRef) -> Result<(), EventlyError> {
    if result.rows_affected() == 0 {
        return Err(EventlyError::PersistenceError(format!(
            "{target} does not exist"
        )));
    }
    Ok(())
}

async fn insert_translations(
    conn: &mut PgConnection,
    translations: &[EventTranslation],
) -> Result<(), EventlyError> {
    if translations.is_empty() {
        return Ok(());
    }
    let mut qb = QueryBuilder::<Postgres>::new(
        "INSERT INTO event_translations \
         (id, event_id, language_code, name, description, category, venue, tags, position) ",
    );
    qb.push_values(translations.iter().enumerate(), |mut row, (position, t)| {
        row.push_bind(*t.id.as_uuid())
            .push_bind(*t.event_id.as_uuid())
            .push_bind(t.language_code.clone())
            .push_bind(t.name.clone())
            .push_bind(t.description.clone())
            .push_bind(t.category.clone())
            .push_bind(t.venue.clone())
            .push_bind(t.tags.clone())
            .push_bind(i32::try_from(position).unwrap_or(i32::MAX));
    });
    qb.build().execute(conn).await?;
    Ok(())
}

async fn apply(conn: &mut PgConnection, change: Change) -> Result<(), EventlyError> {
    match change {
        Change::InsertEvent(event) => {
            sqlx::query(
                "INSERT INTO events \
                 (id, date, price, image_url, google_map_url, created_at, updated_at, deleted_at, is_deleted) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(*event.id.as_uuid())
            .bind(event.date)
            .bind(event.price)
            .bind(&event.image_url)
            .bind(&event.google_map_url)
            .bind(event.audit.created_at)
            .bind(event.audit.updated_at)
            .bind(event.audit.deleted_at)
            .bind(event.audit.is_deleted)
            .execute(&mut *conn)
            .await?;
            insert_translations(&mut *conn, &event.translations).await?;
        }
        Change::UpdateEvent(event) => {
            let result = sqlx::query(
                "UPDATE events SET date = $2, price = $3, image_url = $4, google_map_url = $5, \
                 updated_at = $6, deleted_at = $7, is_deleted = $8 WHERE id = $1",
            )
            .bind(*event.id.as_uuid())
            .bind(event.date)
            .bind(event.price)
            .bind(&event.image_url)
            .bind(&event.google_map_url)
            .bind(event.audit.updated_at)
            .bind(event.audit.deleted_at)
            .bind(event.audit.is_deleted)
            .execute(&mut *conn)
            .await?;
            ensure_affected(&result, EntityRef::Event(event.id))?;
        }
        Change::ReplaceTranslations {
            event_id,
            translations,
        } => {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
                    .bind(*event_id.as_uuid())
                    .fetch_one(&mut *conn)
                    .await?;
            if !exists {
                return Err(EventlyError::PersistenceError(format!(
                    "{} does not exist",
                    EntityRef::Event(event_id)
                )));
            }
            sqlx::query("DELETE FROM event_translations WHERE event_id = $1")
                .bind(*event_id.as_uuid())
                .execute(&mut *conn)
                .await?;
            insert_translations(&mut *conn, &translations).await?;
        }
        Change::InsertBooking(booking) => {
            sqlx::query(
                "INSERT INTO bookings \
                 (id, user_id, event_id, quantity, status, created_at, updated_at, deleted_at, is_deleted) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
            )
            .bind(*booking.id.as_uuid())
            .bind(*booking.user_id.as_uuid())
            .bind(*booking.event_id.as_uuid())
            .bind(booking.quantity)
            .bind(booking.status.as_str())
            .bind(booking.audit.created_at)
            .bind(booking.audit.updated_at)
            .bind(booking.audit.deleted_at)
            .bind(booking.audit.is_deleted)
            .execute(&mut *conn)
            .await?;
        }
        Change::UpdateBooking(booking) => {
            let result = sqlx::query(
                "UPDATE bookings SET quantity = $2, status = $3, updated_at = $4, \
                 deleted_at = $5, is_deleted = $6 WHERE id = $1",
            )
            .bind(*booking.id.as_uuid())
            .bind(booking.quantity)
            .bind(booking.status.as_str())
            .bind(booking.audit.updated_at)
            .bind(booking.audit.deleted_at)
            .bind(booking.audit.is_deleted)
            .execute(&mut *conn)
            .await?;
            ensure_affected(&result, EntityRef::Booking(booking.id))?;
        }
        Change::InsertUser(user) => {
            sqlx::query(
                "INSERT INTO users (id, full_name, email, username, phone, role, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(*user.id.as_uuid())
            .bind(&user.full_name)
            .bind(&user.email)
            .bind(&user.username)
            .bind(&user.phone)
            .bind(user.role.as_str())
            .bind(user.created_at)
            .execute(&mut *conn)
            .await?;
        }
        Change::SoftDelete { target, at } => {
            let (table, id) = target_row(target);
            let result = sqlx::query(&format!(
                "UPDATE {table} SET is_deleted = TRUE, deleted_at = $2 WHERE id = $1"
            ))
            .bind(id)
            .bind(at)
            .execute(&mut *conn)
            .await?;
            ensure_affected(&result, target)?;
        }
        Change::HardDelete(target) => {
            let (table, id) = target_row(target);
            let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
                .bind(id)
                .execute(&mut *conn)
                .await?;
            ensure_affected(&result, target)?;
        }
    }
    Ok(())
}
