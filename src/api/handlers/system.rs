//! System endpoints: health check and language switch.

use axum::extract::{Query, State};
use axum::http::header::{LOCATION, REFERER, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::api::locale::culture_cookie;
use crate::app_state::AppState;
use crate::domain::Locale;
use crate::error::{ErrorResponse, EventlyError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    store: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, store reachability, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (status, code, store) = match state.services.ping().await {
        Ok(()) => ("healthy", StatusCode::OK, "up"),
        Err(err) => {
            tracing::warn!(error = %err, "health check: store unreachable");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            store: store.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Query for `GET /set-language`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SetLanguageParams {
    /// `en` or `ar`.
    pub culture: String,
}

/// `GET /set-language`: Persist the caller's language choice.
///
/// # Errors
///
/// Returns [`EventlyError::InvalidLocale`] for an unsupported culture.
#[utoipa::path(
    get,
    path = "/set-language",
    tag = "System",
    summary = "Switch language",
    description = "Stores the culture in the `evently_culture` cookie for one year and redirects back to the referring page.",
    params(SetLanguageParams),
    responses(
        (status = 303, description = "Cookie set, redirecting"),
        (status = 400, description = "Unsupported culture", body = ErrorResponse),
    )
)]
pub async fn set_language(
    headers: HeaderMap,
    Query(params): Query<SetLanguageParams>,
) -> Result<impl IntoResponse, EventlyError> {
    let locale: Locale = params.culture.parse()?;
    let target = headers
        .get(REFERER)
        .and_then(|v| v.to_str().ok())
        .and_then(local_target)
        .unwrap_or_else(|| "/".to_string());

    tracing::debug!(%locale, %target, "language switched");
    Ok((
        StatusCode::SEE_OTHER,
        [(SET_COOKIE, culture_cookie(locale)), (LOCATION, target)],
    ))
}

/// Path and query of a referer, so redirects never leave the site.
fn local_target(referer: &str) -> Option<String> {
    let uri: Uri = referer.parse().ok()?;
    let target = uri.path_and_query()?.as_str();
    let on_site =
        target.starts_with('/') && !target.starts_with("//") && !target.starts_with("/\\");
    on_site.then(|| target.to_string())
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/set-language", get(set_language))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_stay_local() {
        assert_eq!(
            local_target("https://evil.example/events?page_number=2").as_deref(),
            Some("/events?page_number=2")
        );
        assert_eq!(local_target("/bookings").as_deref(), Some("/bookings"));
        assert_eq!(local_target("not a uri"), None);
        assert_eq!(local_target("https://evil.example//evil.example/phish"), None);
        assert_eq!(local_target("//evil.example/phish"), None);
    }
}
