//! Caller identity extractors.
//!
//! Authentication happens upstream: the fronting auth proxy asserts the
//! caller through two headers.
//!
//! | Header | Value |
//! |---|---|
//! | `x-user-id` | user UUID |
//! | `x-user-role` | `User` or `Admin` (defaults to `User`) |
//!
//! ```rust,ignore
//! async fn my_bookings(user: CurrentUser) -> Result<Json<BookingsPage>, EventlyError> {
//!     // user.id is an authenticated end user
//! }
//!
//! async fn all_bookings(_admin: RequireAdmin) -> Result<Json<...>, EventlyError> {
//!     // rejected with 403 unless the caller is an admin
//! }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::domain::{Role, UserId};
use crate::error::EventlyError;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// An authenticated caller of any role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Caller's user id.
    pub id: UserId,
    /// Caller's role.
    pub role: Role,
}

impl Identity {
    /// Reads the identity headers. `Ok(None)` when no user id is present.
    fn from_parts(parts: &Parts) -> Result<Option<Self>, EventlyError> {
        let Some(raw_id) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(None);
        };
        let id = raw_id
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<UserId>().ok())
            .ok_or(EventlyError::Unauthorized)?;
        let role = match parts.headers.get(USER_ROLE_HEADER) {
            None => Role::User,
            Some(raw) => raw
                .to_str()
                .ok()
                .and_then(|v| v.parse::<Role>().ok())
                .ok_or(EventlyError::Unauthorized)?,
        };
        Ok(Some(Self { id, role }))
    }

    /// Whether the caller is an administrator.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = EventlyError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_parts(parts)?.ok_or(EventlyError::Unauthorized)
    }
}

/// An authenticated end user (`User` role). Used by the booking area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    /// Caller's user id.
    pub id: UserId,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = EventlyError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if identity.role != Role::User {
            return Err(EventlyError::Forbidden("user role required".to_string()));
        }
        Ok(Self { id: identity.id })
    }
}

/// An authenticated administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequireAdmin {
    /// Admin's user id.
    pub id: UserId,
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = EventlyError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let identity = Identity::from_request_parts(parts, state).await?;
        if !identity.is_admin() {
            return Err(EventlyError::Forbidden("admin role required".to_string()));
        }
        Ok(Self { id: identity.id })
    }
}

/// The caller's identity when one is asserted; anonymous otherwise.
///
/// Malformed identity headers are still rejected with 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaybeUser(pub Option<Identity>);

impl MaybeUser {
    /// The caller's id when present.
    #[must_use]
    pub fn id(&self) -> Option<UserId> {
        self.0.map(|i| i.id)
    }
}

impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = EventlyError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_parts(parts).map(Self)
    }
}
