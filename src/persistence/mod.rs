//! Persistence layer: storage seam, backends, repositories and the unit
//! of work.
//!
//! Services never talk to a backend directly. They open a
//! [`UnitOfWork`] over an `Arc<dyn Store>`, read and stage changes through
//! its repositories, and commit with [`UnitOfWork::save_changes`]. Two
//! backends implement [`Store`]: [`PostgresStore`] (sqlx) and
//! [`MemoryStore`].

pub mod memory;
pub mod models;
pub mod postgres;
pub mod query;
pub mod repository;
pub mod store;
pub mod unit_of_work;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use query::{
    BookingFilter, BookingInclude, BookingQuery, BookingSort, EventFilter, EventInclude,
    EventQuery, EventSort, PageRequest, RowScope,
};
pub use repository::{BookingRepository, EventRepository, UserRepository};
pub use store::{BookingStore, Change, EntityRef, EventStore, Store, UserStore};
pub use unit_of_work::UnitOfWork;
