//! Application users and roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::ValidationError;

use super::UserId;
use crate::error::EventlyError;

/// Authorization role asserted for a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum Role {
    /// End user: browses events and manages own bookings.
    #[default]
    User,
    /// Administrator: manages events and every booking.
    Admin,
}

impl Role {
    /// Wire / storage name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = EventlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            r if r.eq_ignore_ascii_case("user") => Ok(Self::User),
            r if r.eq_ignore_ascii_case("admin") => Ok(Self::Admin),
            other => Err(EventlyError::InvalidRequest(format!("unknown role: {other}"))),
        }
    }
}

/// A registered user profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ApplicationUser {
    /// User identifier, shared with the identity provider.
    pub id: UserId,
    /// Display name.
    pub full_name: String,
    /// Contact e-mail.
    pub email: String,
    /// Unique login name.
    pub username: String,
    /// Contact phone number.
    pub phone: String,
    /// Role granted to the user.
    pub role: Role,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Usernames are ASCII letters, digits and underscores.
///
/// # Errors
///
/// Returns a `username` validation error on any other character or an
/// empty value.
pub fn validate_username(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("Username can only contain letters, numbers, and underscores".into()))
    }
}

/// Phone numbers follow `^\+?[1-9]\d{1,14}$`.
///
/// # Errors
///
/// Returns a `phone` validation error when the value does not match.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    let digits = value.strip_prefix('+').unwrap_or(value);
    let valid = matches!(digits.chars().next(), Some('1'..='9'))
        && (2..=15).contains(&digits.len())
        && digits.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("phone").with_message("Invalid phone number format".into()))
    }
}
