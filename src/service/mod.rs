//! Service layer: business rules over the unit of work.
//!
//! [`EventService`] and [`BookingService`] hold the event catalogue and the
//! booking lifecycle, [`UserService`] the application profiles.
//! [`ServicesProvider`] bundles them for the HTTP layer.

pub mod booking_service;
pub mod event_service;
pub mod provider;
pub mod user_service;
pub mod views;

pub use booking_service::{AdminBookingFilter, BookingService};
pub use event_service::EventService;
pub use provider::ServicesProvider;
pub use user_service::UserService;
pub use views::{
    BookingView, BookingsPage, EventForm, EventView, HomePage, PaginatedList, TranslationForm,
    UserForm,
};
