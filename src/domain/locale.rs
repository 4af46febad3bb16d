//! Supported UI locales.
//!
//! Translation selection never reads ambient state: callers resolve a
//! [`Locale`] per request and pass it to every service method that picks a
//! translation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::EventlyError;

/// A supported two-letter UI language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// Arabic.
    Ar,
}

impl Locale {
    /// All locales the service can render.
    pub const SUPPORTED: [Self; 2] = [Self::En, Self::Ar];

    /// Two-letter ISO 639-1 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    /// Picks the first supported language from an `Accept-Language` header
    /// value, ignoring quality weights and region subtags.
    #[must_use]
    pub fn from_accept_language(header: &str) -> Option<Self> {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .filter_map(|tag| tag.trim().split('-').next())
            .find_map(|lang| lang.parse().ok())
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = EventlyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" => Ok(Self::En),
            "ar" => Ok(Self::Ar),
            other => Err(EventlyError::InvalidLocale(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("AR".parse::<Locale>().ok(), Some(Locale::Ar));
        assert_eq!(" en ".parse::<Locale>().ok(), Some(Locale::En));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn accept_language_picks_first_supported() {
        assert_eq!(
            Locale::from_accept_language("fr-FR,ar-EG;q=0.8,en;q=0.5"),
            Some(Locale::Ar)
        );
        assert_eq!(Locale::from_accept_language("de,fr"), None);
    }

    #[test]
    fn default_is_english() {
        assert_eq!(Locale::default().code(), "en");
    }
}
