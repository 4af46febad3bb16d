//! Data Transfer Objects for REST request/response serialization.
//!
//! Response bodies are mostly the service views in [`crate::service`];
//! this module holds the request and query shapes that only exist at the
//! HTTP edge. Prices are serialized as JSON strings to keep decimal
//! precision.

pub mod booking_dto;
pub mod common_dto;
pub mod event_dto;

pub use booking_dto::*;
pub use common_dto::*;
pub use event_dto::*;
