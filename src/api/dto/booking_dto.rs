//! Booking DTOs for the admin booking endpoints.

use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::domain::BookingStatus;
use crate::error::EventlyError;
use crate::service::AdminBookingFilter;

/// Query for `GET /admin/bookings`. Blank values do not filter.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdminBookingParams {
    /// `Pending`, `Confirmed` or `Cancelled` (case-insensitive).
    #[serde(default)]
    pub status: Option<String>,
    /// Substring of the owner's username (case-insensitive).
    #[serde(default)]
    pub username: Option<String>,
    /// Booking creation day (`YYYY-MM-DD`, UTC).
    #[serde(default)]
    pub booking_date: Option<NaiveDate>,
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page_number: u32,
}

fn default_page() -> u32 {
    1
}

impl AdminBookingParams {
    /// Parses the raw query into a service filter.
    ///
    /// # Errors
    ///
    /// Returns [`EventlyError::InvalidStatus`] for an unknown status.
    pub fn to_filter(&self) -> Result<AdminBookingFilter, EventlyError> {
        let status = self
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<BookingStatus>)
            .transpose()?;
        Ok(AdminBookingFilter {
            status,
            username: self.username.clone(),
            booking_date: self.booking_date,
        })
    }
}

/// Request body for `POST /admin/bookings/{id}/status`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status name.
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(status: Option<&str>) -> AdminBookingParams {
        AdminBookingParams {
            status: status.map(str::to_string),
            username: None,
            booking_date: None,
            page_number: 1,
        }
    }

    #[test]
    fn status_is_parsed_or_ignored() {
        assert_eq!(
            params(Some("confirmed")).to_filter().ok().and_then(|f| f.status),
            Some(BookingStatus::Confirmed)
        );
        assert_eq!(params(Some("  ")).to_filter().ok().map(|f| f.status), Some(None));
        assert!(matches!(
            params(Some("Refunded")).to_filter(),
            Err(EventlyError::InvalidStatus(_))
        ));
    }
}
