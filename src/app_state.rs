//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::domain::Locale;
use crate::service::ServicesProvider;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Every service, over one shared store.
    pub services: Arc<ServicesProvider>,
    /// Locale used when a request expresses no preference.
    pub default_locale: Locale,
}

impl AppState {
    /// Wraps `services` with the given fallback locale.
    #[must_use]
    pub fn new(services: ServicesProvider, default_locale: Locale) -> Self {
        Self {
            services: Arc::new(services),
            default_locale,
        }
    }
}
