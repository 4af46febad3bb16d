//! Domain layer: entities, identifiers, locales and the booking state
//! machine.
//!
//! These types carry no storage concerns. Relations (`Event::translations`,
//! `Booking::event`, ...) are filled in by the persistence layer only when a
//! query asks for them.

pub mod audit;
pub mod booking;
pub mod event;
pub mod ids;
pub mod locale;
pub mod user;

pub use audit::{AuditFields, Deletable, DeletionPolicy};
pub use booking::{Booking, BookingStatus};
pub use event::{Event, EventTranslation};
pub use ids::{BookingId, EventId, TranslationId, UserId};
pub use locale::Locale;
pub use user::{ApplicationUser, Role};
