//! # evently
//!
//! REST API for a bilingual (English / Arabic) event-ticketing service.
//!
//! Administrators manage events and their per-language translations, list
//! and filter every booking, and move bookings through their lifecycle.
//! Users browse upcoming events in their language, book tickets, and cancel
//! their own bookings.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers + extractors (api/)
//!     │
//!     ├── ServicesProvider (service/)
//!     │     ├── EventService
//!     │     ├── BookingService
//!     │     └── UserService
//!     │
//!     ├── UnitOfWork + repositories (persistence/)
//!     │
//!     └── Store: PostgreSQL (sqlx) | in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
