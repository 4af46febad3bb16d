//! Per-request locale resolution.
//!
//! Order of precedence: `culture` query parameter, `evently_culture`
//! cookie, `Accept-Language` header, configured default. Unsupported values
//! at any step are skipped.

use axum::extract::FromRequestParts;
use axum::http::header::{ACCEPT_LANGUAGE, COOKIE};
use axum::http::request::Parts;

use crate::app_state::AppState;
use crate::domain::Locale;
use crate::error::EventlyError;

/// Cookie persisting the caller's language choice.
pub const CULTURE_COOKIE: &str = "evently_culture";

/// Query parameter overriding the language for one request.
pub const CULTURE_PARAM: &str = "culture";

/// Lifetime of the culture cookie: one year.
pub const CULTURE_COOKIE_MAX_AGE_SECS: u64 = 365 * 24 * 60 * 60;

/// The locale a handler should resolve translations in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLocale(pub Locale);

/// Resolves the locale of a request, falling back to `default`.
#[must_use]
pub fn resolve(parts: &Parts, default: Locale) -> Locale {
    from_query(parts)
        .or_else(|| from_cookie(parts))
        .or_else(|| {
            parts
                .headers
                .get(ACCEPT_LANGUAGE)
                .and_then(|v| v.to_str().ok())
                .and_then(Locale::from_accept_language)
        })
        .unwrap_or(default)
}

fn from_query(parts: &Parts) -> Option<Locale> {
    parts
        .uri
        .query()?
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == CULTURE_PARAM)
        .and_then(|(_, value)| value.parse().ok())
}

fn from_cookie(parts: &Parts) -> Option<Locale> {
    parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == CULTURE_COOKIE)
        .and_then(|(_, value)| value.parse().ok())
}

/// `Set-Cookie` value persisting `locale` for one year.
#[must_use]
pub fn culture_cookie(locale: Locale) -> String {
    format!(
        "{CULTURE_COOKIE}={}; Path=/; Max-Age={CULTURE_COOKIE_MAX_AGE_SECS}; SameSite=Lax",
        locale.code()
    )
}

impl FromRequestParts<AppState> for RequestLocale {
    type Rejection = EventlyError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state.default_locale)))
    }
}
