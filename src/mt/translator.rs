//! Translation provider trait and utilities
//!
//! This module defines the `TranslationProvider` trait every back-end
//! implements. The chain builder and dispatcher only ever see this trait.
//!
//! # Example
//!
//! ```ignore
//! use reply_translate::mt::{LingvaProvider, TranslationProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let provider = LingvaProvider::new(reqwest::Client::new(), Some("https://lingva.ml"));
//!     if let Some(raw) = provider.translate("bonjour tout le monde", "EN-US").await {
//!         println!("{} -> {}", raw.detected_language, raw.text);
//!     }
//! }
//! ```

use crate::mt::error::{ProviderError, ProviderResult};
use crate::settings::ProviderKind;
use async_trait::async_trait;
use icu_locale::Locale;
use tracing::warn;

/// What a back-end answered: the language it detected and the translated text
///
/// `detected_language` is upper-cased, or empty if the back-end did not say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTranslation {
    pub detected_language: String,
    pub text: String,
}

impl RawTranslation {
    pub fn new(detected_language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            detected_language: detected_language.into().trim().to_uppercase(),
            text: text.into(),
        }
    }
}

/// Common interface for translation back-ends
///
/// Implementors provide `try_translate`; callers use `translate`, which never
/// fails: every fault is logged and turned into `None` so a chain can fall
/// through to the next provider.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Which variant this is
    fn kind(&self) -> ProviderKind;

    /// Name used in logs and in the reply header
    fn provider_name(&self) -> &str {
        self.kind().as_str()
    }

    /// True when the minimal key or URL this provider needs is present
    fn is_configured(&self) -> bool;

    /// Translate `text` into `target_language` (e.g. `EN-US`)
    async fn try_translate(
        &self,
        text: &str,
        target_language: &str,
    ) -> ProviderResult<RawTranslation>;

    /// Infallible wrapper around `try_translate`
    async fn translate(&self, text: &str, target_language: &str) -> Option<RawTranslation> {
        if !self.is_configured() {
            warn!(provider = self.provider_name(), "provider is not configured");
            return None;
        }
        match self.try_translate(text, target_language).await {
            Ok(raw) => Some(raw),
            Err(e) if e.is_timeout() => {
                warn!(provider = self.provider_name(), "translate timed out: {}", e);
                None
            }
            Err(e) => {
                warn!(provider = self.provider_name(), "translate failed: {}", e);
                None
            }
        }
    }
}

/// Reduce a language code to its lower-case primary subtag
///
/// Several back-ends only accept short codes:
/// - `EN-US` → `en`
/// - `zh-Hans` → `zh`
/// - `pt_BR` → `pt`
pub fn normalize_locale(locale: &str) -> String {
    let candidate = locale.trim().replace('_', "-");
    match candidate.parse::<Locale>() {
        Ok(parsed) => parsed.id.language.as_str().to_string(),
        Err(_) => candidate
            .split('-')
            .next()
            .unwrap_or(&candidate)
            .to_lowercase(),
    }
}

/// Return `Err(NotConfigured)` unless `value` is non-blank
pub(crate) fn require<'a>(value: &'a str, what: &'static str) -> ProviderResult<&'a str> {
    if value.trim().is_empty() {
        Err(ProviderError::NotConfigured(what))
    } else {
        Ok(value)
    }
}

/// Trim a configured value; `None` and blank become empty
pub(crate) fn clean(value: Option<&str>) -> String {
    value.map(str::trim).unwrap_or_default().to_string()
}

/// Trim a configured base URL and drop trailing slashes
pub(crate) fn clean_base_url(value: Option<&str>) -> String {
    clean(value).trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale_with_region() {
        assert_eq!(normalize_locale("EN-US"), "en");
        assert_eq!(normalize_locale("en-GB"), "en");
        assert_eq!(normalize_locale("fr-FR"), "fr");
    }

    #[test]
    fn test_normalize_locale_with_script() {
        assert_eq!(normalize_locale("zh-Hans"), "zh");
        assert_eq!(normalize_locale("sr-Latn"), "sr");
    }

    #[test]
    fn test_normalize_locale_already_simple() {
        assert_eq!(normalize_locale("en"), "en");
        assert_eq!(normalize_locale("DE"), "de");
    }

    #[test]
    fn test_normalize_locale_underscore_and_garbage() {
        assert_eq!(normalize_locale("pt_BR"), "pt");
        // Not a valid BCP 47 tag, still reduced to the first part
        assert_eq!(normalize_locale("123-ABC"), "123");
    }

    #[test]
    fn test_raw_translation_uppercases_language() {
        let raw = RawTranslation::new(" fr ", "hello");
        assert_eq!(raw.detected_language, "FR");
        assert_eq!(raw.text, "hello");
    }

    #[test]
    fn test_clean_base_url() {
        assert_eq!(clean_base_url(Some(" https://libre.example/// ")), "https://libre.example");
        assert_eq!(clean_base_url(None), "");
        assert!(require("  ", "url").is_err());
        assert_eq!(require("k", "key").unwrap(), "k");
    }
}
